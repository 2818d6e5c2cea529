//! Static catalogue of the commands the export script understands.
//!
//! Ids are stable across releases; the script dispatches on them and echoes
//! them back. Every parameter is numeric on the current script version.

use strum::Display;

use crate::command::ParamKind;

/// Command returning one tracked object by id.
pub const OBJECT_BY_ID: u32 = 10;
/// Command returning the player's own aircraft record.
pub const SELF_DATA: u32 = 17;
/// Command returning the simulation clock.
pub const MODEL_TIME: u32 = 18;
/// Command returning every tracked world object.
pub const WORLD_OBJECTS: u32 = 52;

/// How the `result` text of a response should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ResultFormat {
    /// Indentation-tree text holding one or more objects.
    Tree,
    /// A single scalar literal.
    Scalar,
    /// The command produces nothing worth reading.
    Empty,
}

/// Declared parameter of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterDefinition {
    /// Position, starting at zero.
    pub id: u32,
    /// Name as it appears in the call syntax.
    pub name: &'static str,
    /// Slot type.
    pub kind: ParamKind,
}

/// One catalogue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandDefinition {
    /// Stable command id.
    pub id: u32,
    /// Call syntax sent as `api_syntax`.
    pub syntax: &'static str,
    /// Whether the script sends a result back.
    pub returns_data: bool,
    /// Declared parameters in wire order.
    pub parameters: &'static [ParameterDefinition],
    /// Shape of the result text.
    pub result_format: ResultFormat,
    /// Parameter whose value tells concurrent queries of this command apart.
    pub correlation: Option<&'static str>,
}

const fn number(id: u32, name: &'static str) -> ParameterDefinition {
    ParameterDefinition {
        id,
        name,
        kind: ParamKind::Number,
    }
}

const fn action(
    id: u32,
    syntax: &'static str,
    parameters: &'static [ParameterDefinition],
) -> CommandDefinition {
    CommandDefinition {
        id,
        syntax,
        returns_data: false,
        parameters,
        result_format: ResultFormat::Empty,
        correlation: None,
    }
}

const fn scalar(
    id: u32,
    syntax: &'static str,
    parameters: &'static [ParameterDefinition],
) -> CommandDefinition {
    CommandDefinition {
        id,
        syntax,
        returns_data: true,
        parameters,
        result_format: ResultFormat::Scalar,
        correlation: None,
    }
}

const fn tree(id: u32, syntax: &'static str) -> CommandDefinition {
    CommandDefinition {
        id,
        syntax,
        returns_data: true,
        parameters: &[],
        result_format: ResultFormat::Tree,
        correlation: None,
    }
}

const DEVICE: &[ParameterDefinition] = &[number(0, "device_id")];
const DEVICE_ARGUMENT: &[ParameterDefinition] = &[
    number(0, "device_id"),
    number(1, "argument_id"),
    number(2, "new_value"),
];
const DEVICE_VALUE: &[ParameterDefinition] = &[number(0, "device_id"), number(1, "new_value")];
const DRAW_ARGUMENT: &[ParameterDefinition] = &[number(0, "draw_argument_id")];
const OBJECT: &[ParameterDefinition] = &[number(0, "object_id")];
const INDICATOR: &[ParameterDefinition] = &[number(0, "indicator_id")];
const SIM_COMMAND: &[ParameterDefinition] = &[number(0, "iCommand")];
const SIM_COMMAND_VALUE: &[ParameterDefinition] = &[number(0, "iCommand"), number(1, "new_value")];
const GEO_POINT: &[ParameterDefinition] = &[
    number(0, "longitude_degrees"),
    number(1, "latitude_degrees"),
];
const WORLD_POINT: &[ParameterDefinition] = &[number(0, "x"), number(1, "z")];

/// Every known command, ordered by id.
pub static CATALOG: &[CommandDefinition] = &[
    action(
        2,
        "GetDevice(device_id):set_argument_value(argument_id, new_value)",
        DEVICE_ARGUMENT,
    ),
    scalar(6, "GetDevice(device_id):get_frequency()", DEVICE),
    action(
        7,
        "GetDevice(device_id):set_frequency(new_value)",
        DEVICE_VALUE,
    ),
    scalar(8, "GetDevice(device_id):update_arguments()", DEVICE),
    scalar(
        9,
        "LoGetAircraftDrawArgumentValue(draw_argument_id)",
        DRAW_ARGUMENT,
    ),
    CommandDefinition {
        id: OBJECT_BY_ID,
        syntax: "LoGetObjectById(object_id)",
        returns_data: true,
        parameters: OBJECT,
        result_format: ResultFormat::Tree,
        correlation: Some("object_id"),
    },
    scalar(11, "list_indication(indicator_id)", INDICATOR),
    action(12, "LoSetCommand(iCommand)", SIM_COMMAND),
    action(
        13,
        "LoSetCommand(iCommand, new_value)",
        SIM_COMMAND_VALUE,
    ),
    action(
        14,
        "LoGeoCoordinatesToLoCoordinates(longitude_degrees, latitude_degrees)",
        GEO_POINT,
    ),
    action(15, "LoCoordinatesToGeoCoordinates(x, z)", WORLD_POINT),
    scalar(16, "list_cockpit_params()", &[]),
    tree(SELF_DATA, "LoGetSelfData()"),
    scalar(MODEL_TIME, "LoGetModelTime()", &[]),
    scalar(19, "LoGetMissionStartTime()", &[]),
    scalar(20, "LoGetPilotName()", &[]),
    scalar(21, "LoGetIndicatedAirSpeed()", &[]),
    tree(22, "LoGetAccelerationUnits()"),
    tree(23, "LoGetADIPitchBankYaw()"),
    tree(24, "LoGetSnares()"),
    scalar(25, "LoGetAltitudeAboveSeaLevel()", &[]),
    scalar(26, "LoGetAltitudeAboveGroundLevel()", &[]),
    scalar(27, "LoGetVerticalVelocity()", &[]),
    scalar(28, "LoGetTrueAirSpeed()", &[]),
    scalar(29, "LoGetMachNumber()", &[]),
    scalar(30, "LoGetAngleOfAttack()", &[]),
    tree(31, "LoGetGlideDeviation()"),
    tree(32, "LoGetSideDeviation()"),
    tree(33, "LoGetSlipBallPosition()"),
    tree(34, "LoGetEngineInfo()"),
    tree(35, "LoGetMechInfo()"),
    tree(36, "LoGetControlPanel_HSI()"),
    tree(37, "LoGetPayloadInfo()"),
    tree(38, "LoGetNavigationInfo()"),
    scalar(39, "LoGetMagneticYaw()", &[]),
    scalar(40, "LoGetBasicAtmospherePressure()", &[]),
    tree(41, "LoGetMCPState()"),
    tree(42, "LoGetTWSInfo()"),
    scalar(43, "LoGetAngleOfSideSlip()", &[]),
    scalar(44, "LoGetRadarAltimeter()", &[]),
    tree(45, "LoGetRoute()"),
    tree(46, "LoGetWingInfo()"),
    tree(47, "LoGetRadioBeaconsStatus()"),
    tree(48, "LoGetVectorVelocity()"),
    tree(49, "LoGetVectorWindVelocity()"),
    tree(50, "LoGetAngularVelocity()"),
    tree(51, "LoGetFMData()"),
    tree(WORLD_OBJECTS, "LoGetWorldObjects()"),
    tree(53, "LoGetTargetInformation()"),
    tree(54, "LoGetLockedTargetInformation()"),
    tree(55, "LoGetF15_TWS_Contacts()"),
    tree(56, "LoGetSightingSystemInfo()"),
    tree(57, "LoGetWingTargets()"),
    scalar(58, "LoGetAltitude()", &[]),
    scalar(59, "LoIsOwnshipExportAllowed()", &[]),
    scalar(60, "LoIsObjectExportAllowed()", &[]),
    scalar(61, "LoIsSensorExportAllowed()", &[]),
];

/// Looks up a command by id.
#[must_use]
pub fn find(id: u32) -> Option<&'static CommandDefinition> {
    CATALOG.iter().find(|definition| definition.id == id)
}

/// Looks up a command by its exact call syntax.
#[must_use]
pub fn find_by_syntax(syntax: &str) -> Option<&'static CommandDefinition> {
    CATALOG.iter().find(|definition| definition.syntax == syntax)
}

/// Commands whose syntax contains `pattern`, ignoring case. An empty pattern
/// matches everything.
pub fn matching(pattern: &str) -> impl Iterator<Item = &'static CommandDefinition> {
    let needle = pattern.to_lowercase();
    CATALOG
        .iter()
        .filter(move |definition| definition.syntax.to_lowercase().contains(&needle))
}

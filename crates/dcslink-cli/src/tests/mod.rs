//! Runtime tests driving the CLI against a fake simulator.

use std::ffi::OsString;
use std::net::TcpListener;
use std::process::ExitCode;

use dcslink::test_support::{FakeSimulator, reply_with_result};
use dcslink_config::Config;
use rstest::rstest;

use crate::commands::parse_overrides;
use crate::config::ConfigLoader;
use crate::{AppError, run_with_loader};

const OWN_AIRCRAFT: &str = "1:\n\tName: Hornet\n\tCountry: 2\n";

struct StaticConfigLoader {
    config: Config,
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, AppError> {
        Ok(self.config.clone())
    }
}

struct Outcome {
    exit: ExitCode,
    stdout: String,
    stderr: String,
}

fn run(command: &str, config: Config) -> Outcome {
    let mut args = vec![OsString::from("dcslink")];
    args.extend(command.split_whitespace().map(OsString::from));
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let exit = run_with_loader(args, &mut stdout, &mut stderr, &StaticConfigLoader { config });
    Outcome {
        exit,
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
    }
}

fn simulator(responder: impl Fn(&serde_json::Value) -> Option<String> + Send + 'static) -> FakeSimulator {
    FakeSimulator::spawn(responder).unwrap_or_else(|error| panic!("fake simulator: {error:#}"))
}

fn own_aircraft_simulator() -> FakeSimulator {
    simulator(|request| {
        let result = if request["id"] == 17 { OWN_AIRCRAFT } else { "" };
        Some(reply_with_result(request, result))
    })
}

#[test]
fn catalog_filters_by_pattern_without_connecting() {
    let outcome = run("catalog getdevice", Config::default());
    assert_eq!(outcome.exit, ExitCode::SUCCESS, "stderr: {}", outcome.stderr);
    let entries: serde_json::Value = serde_json::from_str(&outcome.stdout)
        .unwrap_or_else(|error| panic!("catalog json: {error}"));
    let ids: Vec<_> = entries
        .as_array()
        .map(|entries| entries.iter().map(|entry| entry["id"].clone()).collect())
        .unwrap_or_default();
    assert_eq!(ids, vec![2, 6, 7, 8]);
}

#[test]
fn help_goes_to_stdout() {
    let outcome = run("--help", Config::default());
    assert_eq!(outcome.exit, ExitCode::SUCCESS);
    assert!(outcome.stdout.contains("catalog"), "stdout: {}", outcome.stdout);
}

#[rstest]
#[case("")]
#[case("teleport")]
#[case("object north")]
#[case("watch --rounds 0")]
#[case("watch --rounds -1")]
fn usage_errors_fail(#[case] command: &str) {
    let outcome = run(command, Config::default());
    assert_eq!(outcome.exit, ExitCode::FAILURE);
    assert!(!outcome.stderr.is_empty());
}

#[test]
fn send_prints_the_payload_as_json() {
    let simulator = own_aircraft_simulator();
    let outcome = run("send 17", simulator.config());
    assert_eq!(outcome.exit, ExitCode::SUCCESS, "stderr: {}", outcome.stderr);
    let payload: serde_json::Value = serde_json::from_str(&outcome.stdout)
        .unwrap_or_else(|error| panic!("payload json: {error}"));
    assert_eq!(payload[0]["id"], 1);
    assert_eq!(payload[0]["Name"], "Hornet");
}

#[test]
fn send_prints_tree_text_on_request() {
    let simulator = own_aircraft_simulator();
    let outcome = run("--format tree send 17", simulator.config());
    assert_eq!(outcome.exit, ExitCode::SUCCESS, "stderr: {}", outcome.stderr);
    assert_eq!(outcome.stdout, "1:\n\tCountry: 2\n\tName: Hornet\n");
}

#[test]
fn send_passes_overrides_to_the_simulator() {
    let simulator = simulator(|request| Some(reply_with_result(request, "")));
    let outcome = run("send 10 object_id=42 --wait-ms 1000", simulator.config());
    assert_eq!(outcome.exit, ExitCode::SUCCESS, "stderr: {}", outcome.stderr);
    let received = simulator.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0]["parameter_defs"][0]["value"], "42");
    assert_eq!(outcome.stdout, "null\n");
}

#[test]
fn missing_objects_fail() {
    let simulator = simulator(|request| Some(reply_with_result(request, "")));
    let outcome = run("object 42 --timeout-ms 1000", simulator.config());
    assert_eq!(outcome.exit, ExitCode::FAILURE);
    assert!(
        outcome.stderr.contains("object 42 was not found"),
        "stderr: {}",
        outcome.stderr
    );
}

#[test]
fn refused_connections_fail() {
    let port = TcpListener::bind(("127.0.0.1", 0))
        .and_then(|listener| listener.local_addr())
        .map(|address| address.port())
        .unwrap_or_else(|error| panic!("probe port: {error}"));
    let config = Config {
        host: "127.0.0.1".to_owned(),
        port,
        connect_timeout_ms: 500,
        ..Config::default()
    };
    let outcome = run("send 17", config);
    assert_eq!(outcome.exit, ExitCode::FAILURE);
    assert!(!outcome.stderr.is_empty());
}

#[test]
fn watch_prints_one_line_per_response() {
    let simulator = own_aircraft_simulator();
    let outcome = run("watch --interval-ms 50 --rounds 1", simulator.config());
    assert_eq!(outcome.exit, ExitCode::SUCCESS, "stderr: {}", outcome.stderr);
    let ids: Vec<String> = outcome
        .stdout
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line)
                .unwrap_or_else(|error| panic!("response line {line:?}: {error}"));
            value["id"].to_string()
        })
        .collect();
    assert_eq!(ids, vec!["52".to_owned(), "17".to_owned()]);
}

#[rstest]
#[case(&["object_id=42"], Some(("object_id", "42")))]
#[case(&["name = Hornet"], Some(("name", " Hornet")))]
#[case(&["=42"], None)]
#[case(&["object_id"], None)]
fn overrides_need_a_name_and_equals(
    #[case] parameters: &[&str],
    #[case] expected: Option<(&str, &str)>,
) {
    let parameters: Vec<String> = parameters.iter().map(|item| (*item).to_owned()).collect();
    let parsed = parse_overrides(&parameters);
    match expected {
        Some((name, value)) => {
            let parsed = parsed.unwrap_or_else(|error| panic!("override rejected: {error}"));
            assert_eq!(parsed.len(), 1);
            assert_eq!(parsed[0].0, name);
            assert_eq!(parsed[0].1.to_string(), value);
        }
        None => assert!(matches!(parsed, Err(AppError::MalformedOverride(_)))),
    }
}

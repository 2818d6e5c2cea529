//! Subcommands that talk to the simulator.

use std::io::Write;
use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;

use dcslink::monitor::DEFAULT_POLL_COMMANDS;
use dcslink::{Client, ConnectionState, Monitor, ParamValue, Response};
use dcslink_config::Config;
use tracing::info;

use crate::AppError;
use crate::cli::OutputFormat;
use crate::output;

const COMMANDS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::commands");

enum WatchEvent {
    Response(Response),
    Closed,
}

/// Splits `NAME=VALUE` overrides. Values stay text; the command coerces
/// them to each parameter's declared kind.
pub(crate) fn parse_overrides(parameters: &[String]) -> Result<Vec<(String, ParamValue)>, AppError> {
    parameters
        .iter()
        .map(|parameter| match parameter.split_once('=') {
            Some((name, value)) if !name.trim().is_empty() => {
                Ok((name.trim().to_owned(), ParamValue::from(value)))
            }
            _ => Err(AppError::MalformedOverride(parameter.clone())),
        })
        .collect()
}

fn connect(config: Config) -> Result<Client, AppError> {
    let client = Client::new(config);
    client.connect()?;
    Ok(client)
}

pub(crate) fn send(
    config: Config,
    id: u32,
    parameters: &[String],
    wait_ms: u64,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<(), AppError> {
    let overrides = parse_overrides(parameters)?;
    let overrides: Vec<(&str, ParamValue)> = overrides
        .iter()
        .map(|(name, value)| (name.as_str(), value.clone()))
        .collect();

    let client = connect(config)?;
    let payload = client.query(id, &overrides, Duration::from_millis(wait_ms));
    client.disconnect();
    output::write_payload(out, &payload?, format)
}

pub(crate) fn object(
    config: Config,
    id: u64,
    timeout_ms: u64,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<(), AppError> {
    let client = connect(config)?;
    let fetched = client.fetch_object(id, Duration::from_millis(timeout_ms));
    client.disconnect();
    let object = fetched?.ok_or(AppError::ObjectNotFound(id))?;
    output::write_payload(out, &dcslink::Payload::Objects(vec![object]), format)
}

/// Prints every response to the polled commands until `rounds` rounds were
/// answered or the connection closes.
pub(crate) fn watch(
    config: Config,
    interval_ms: u64,
    rounds: Option<u64>,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<(), AppError> {
    let client = Arc::new(Client::new(config));
    let (sender, events) = mpsc::channel();
    let responses = sender.clone();
    client.on_response(move |response| {
        let _ = responses.send(WatchEvent::Response(response.clone()));
    });
    client.on_connection_changed(move |state| {
        if *state == ConnectionState::Disconnected {
            let _ = sender.send(WatchEvent::Closed);
        }
    });
    client.connect()?;

    let monitor = Monitor::start(
        Arc::clone(&client),
        DEFAULT_POLL_COMMANDS.to_vec(),
        Duration::from_millis(interval_ms),
    )?;
    let per_round = u64::try_from(DEFAULT_POLL_COMMANDS.len()).unwrap_or(u64::MAX);
    let expected = rounds.map(|rounds| rounds.saturating_mul(per_round));
    info!(target: COMMANDS_TARGET, interval_ms, ?rounds, "watching simulator");

    let mut seen = 0_u64;
    let outcome = loop {
        match events.recv() {
            Ok(WatchEvent::Response(response)) => {
                if let Err(error) = output::write_response(out, &response, format) {
                    break Err(error);
                }
                seen += 1;
                if expected.is_some_and(|expected| seen >= expected) {
                    break Ok(());
                }
            }
            Ok(WatchEvent::Closed) | Err(_) => break Err(AppError::ConnectionClosed),
        }
    };

    client.clear_observers();
    let joined = monitor.join();
    client.disconnect();
    outcome?;
    joined.map_err(AppError::from)
}

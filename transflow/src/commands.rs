use std::io::BufRead;
use std::thread;

use thiserror::Error;
use tracing::{info, warn};

use crate::decoration::DecorationKey;
use crate::state::SessionHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Text,
    Move,
    Scroll,
    Space,
    Hover(DecorationKey),
    Click(DecorationKey),
    Apply(DecorationKey),
    Language(String),
    Report,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command: {0}")]
    Unknown(String),
    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),
    #[error("invalid decoration key: {0} (expected <offset>-<length>)")]
    InvalidKey(String),
}

pub fn parse_command(line: &str) -> Result<Option<ConsoleCommand>, CommandError> {
    let mut parts = line.split_whitespace();
    let Some(name) = parts.next() else {
        return Ok(None);
    };
    let argument = parts.next();

    let command = match name.to_ascii_lowercase().as_str() {
        "text" => ConsoleCommand::Text,
        "move" => ConsoleCommand::Move,
        "scroll" => ConsoleCommand::Scroll,
        "space" => ConsoleCommand::Space,
        "hover" => ConsoleCommand::Hover(parse_key("hover", argument)?),
        "click" => ConsoleCommand::Click(parse_key("click", argument)?),
        "apply" => ConsoleCommand::Apply(parse_key("apply", argument)?),
        "lang" => ConsoleCommand::Language(
            argument
                .ok_or(CommandError::MissingArgument("lang"))?
                .to_string(),
        ),
        "report" => ConsoleCommand::Report,
        "quit" | "exit" => ConsoleCommand::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

fn parse_key(command: &'static str, argument: Option<&str>) -> Result<DecorationKey, CommandError> {
    let raw = argument.ok_or(CommandError::MissingArgument(command))?;
    DecorationKey::parse(raw).ok_or_else(|| CommandError::InvalidKey(raw.to_string()))
}

fn dispatch(command: ConsoleCommand, handle: &SessionHandle) {
    match command {
        ConsoleCommand::Text => handle.text_changed(),
        ConsoleCommand::Move => handle.window_moved(),
        ConsoleCommand::Scroll => handle.scrolled(),
        ConsoleCommand::Space => handle.space_changed(),
        ConsoleCommand::Hover(key) => handle.hovered(key),
        ConsoleCommand::Click(key) => handle.clicked(key),
        ConsoleCommand::Apply(key) => handle.apply_translation(key),
        ConsoleCommand::Language(code) => handle.set_source_language(code),
        ConsoleCommand::Report => print_report(handle),
        ConsoleCommand::Quit => handle.shutdown(),
    }
}

fn print_report(handle: &SessionHandle) {
    let Some(Ok(report)) = handle.request_report().map(|reply| reply.blocking_recv()) else {
        warn!("session stopped before answering the report request");
        return;
    };
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(err) => warn!("failed to serialize performance report: {err}"),
    }
}

pub fn spawn_console(handle: SessionHandle) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    warn!("failed to read console input: {err}");
                    break;
                }
            };
            match parse_command(&line) {
                Ok(Some(ConsoleCommand::Quit)) => break,
                Ok(Some(command)) => dispatch(command, &handle),
                Ok(None) => {}
                Err(err) => warn!("{err}"),
            }
            if handle.is_closed() {
                return;
            }
        }
        info!("console input closed");
        handle.shutdown();
    })
}

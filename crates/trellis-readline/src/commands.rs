//! Slash command parsing for the shell.
//!
//! Anything that does not start with `/` is a chat message for the
//! current session.

use std::path::PathBuf;
use std::str::FromStr;
use trellis_core::settings::{
    Depth, ExampleFrequency, Formality, Pace, TeachingPreset, TeachingStyleUpdate,
};

/// Commands offered by completion and hints.
pub const COMMANDS: &[&str] = &[
    "/help",
    "/home",
    "/refresh",
    "/open",
    "/topics",
    "/topic",
    "/summary",
    "/try",
    "/create-topic",
    "/delete-topic",
    "/new",
    "/sessions",
    "/resume",
    "/delete-session",
    "/end",
    "/history",
    "/context",
    "/demo",
    "/style",
    "/cli-path",
    "/status",
    "/stats",
    "/export",
    "/import",
    "/clear-all",
    "/quit",
];

/// A topic picked either by its number in the last listing or by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Index(usize),
    Name(String),
}

impl Selector {
    fn parse(arg: &str) -> Self {
        match arg.parse::<usize>() {
            Ok(n) => Selector::Index(n),
            Err(_) => Selector::Name(arg.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Dashboard { refresh: bool },
    OpenCard(usize),
    Topics,
    Topic(Selector),
    RefreshSummary,
    TrySuggestion(usize),
    CreateTopic { name: String, category: Option<String> },
    DeleteTopic(Selector),
    New(Option<Selector>),
    Sessions,
    Resume(usize),
    DeleteSession(usize),
    End,
    History,
    Context,
    Demo,
    Style(Option<TeachingStyleUpdate>),
    CliPath(Option<String>),
    Status,
    Stats,
    Export(Option<PathBuf>),
    Import(PathBuf),
    ClearAll,
    Quit,
    Say(String),
    /// A known command with bad arguments; carries the usage line.
    Usage(&'static str),
    Unknown(String),
}

pub fn parse(line: &str) -> Command {
    let line = line.trim();
    if line == "quit" || line == "exit" {
        return Command::Quit;
    }
    if !line.starts_with('/') {
        return Command::Say(line.to_string());
    }

    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };
    let arg = (!rest.is_empty()).then_some(rest);

    match (name, arg) {
        ("/help" | "/?", _) => Command::Help,
        ("/home" | "/dashboard", _) => Command::Dashboard { refresh: false },
        ("/refresh", _) => Command::Dashboard { refresh: true },
        ("/open", arg) => index(arg, Command::OpenCard, "/open <card number>"),
        ("/topics", _) => Command::Topics,
        ("/topic", Some(arg)) => Command::Topic(Selector::parse(arg)),
        ("/topic", None) => Command::Usage("/topic <number|name>"),
        ("/summary", _) => Command::RefreshSummary,
        ("/try", arg) => index(arg, Command::TrySuggestion, "/try <suggestion number>"),
        ("/create-topic", Some(arg)) => {
            let (name, category) = match arg.split_once('|') {
                Some((name, category)) => {
                    let category = category.trim();
                    (name.trim(), (!category.is_empty()).then(|| category.to_string()))
                }
                None => (arg, None),
            };
            Command::CreateTopic {
                name: name.to_string(),
                category,
            }
        }
        ("/create-topic", None) => Command::Usage("/create-topic <name> [| category]"),
        ("/delete-topic", Some(arg)) => Command::DeleteTopic(Selector::parse(arg)),
        ("/delete-topic", None) => Command::Usage("/delete-topic <number|name>"),
        ("/new", arg) => Command::New(arg.map(Selector::parse)),
        ("/sessions", _) => Command::Sessions,
        ("/resume", arg) => index(arg, Command::Resume, "/resume <session number>"),
        ("/delete-session", arg) => {
            index(arg, Command::DeleteSession, "/delete-session <session number>")
        }
        ("/end", _) => Command::End,
        ("/history", _) => Command::History,
        ("/context", _) => Command::Context,
        ("/demo", _) => Command::Demo,
        ("/style", None) => Command::Style(None),
        ("/style", Some(arg)) => match parse_style(arg) {
            Some(update) => Command::Style(Some(update)),
            None => Command::Usage(
                "/style [preset|depth|pace|examples|analogies|formality|instructions] <value>",
            ),
        },
        ("/cli-path", None) => Command::Usage("/cli-path <path|clear>"),
        ("/cli-path", Some("clear")) => Command::CliPath(None),
        ("/cli-path", Some(path)) => Command::CliPath(Some(path.to_string())),
        ("/status", _) => Command::Status,
        ("/stats", _) => Command::Stats,
        ("/export", arg) => Command::Export(arg.map(PathBuf::from)),
        ("/import", Some(path)) => Command::Import(PathBuf::from(path)),
        ("/import", None) => Command::Usage("/import <file>"),
        ("/clear-all", _) => Command::ClearAll,
        ("/quit" | "/exit", _) => Command::Quit,
        (other, _) => Command::Unknown(other.to_string()),
    }
}

fn index(arg: Option<&str>, make: fn(usize) -> Command, usage: &'static str) -> Command {
    match arg.and_then(|a| a.parse::<usize>().ok()) {
        Some(n) if n > 0 => make(n),
        _ => Command::Usage(usage),
    }
}

fn parse_style(arg: &str) -> Option<TeachingStyleUpdate> {
    let (key, value) = arg.split_once(char::is_whitespace)?;
    let value = value.trim();
    let mut update = TeachingStyleUpdate::default();
    let params = &mut update.parameters;

    match key {
        "preset" => update.preset = Some(TeachingPreset::from_str(value).ok()?),
        "depth" => params.depth = Some(Depth::from_str(value).ok()?),
        "pace" => params.pace = Some(Pace::from_str(value).ok()?),
        "examples" => params.example_frequency = Some(ExampleFrequency::from_str(value).ok()?),
        "formality" => params.formality = Some(Formality::from_str(value).ok()?),
        "analogies" => {
            params.use_analogies = Some(match value {
                "on" | "yes" | "true" => true,
                "off" | "no" | "false" => false,
                _ => return None,
            })
        }
        "instructions" => update.custom_instructions = Some(value.to_string()),
        _ => return None,
    }
    Some(update)
}

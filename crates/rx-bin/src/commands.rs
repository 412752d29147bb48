//! Line commands accepted by the interactive session.

use core_pattern::MatchMode;
use std::path::PathBuf;
use thiserror::Error;

/// Test cases are addressed by their 1-based position in the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Pattern(String),
    Undo,
    Redo,
    Add { mode: MatchMode, text: String },
    Text { index: usize, text: String },
    Mode { index: usize, mode: MatchMode },
    Title { index: usize, title: String },
    Dup(usize),
    Rm(usize),
    List,
    Save(Option<PathBuf>),
    Help,
    Quit,
}

impl Command {
    /// Stable name for logs; arguments may hold user text and are left out.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Pattern(_) => "pattern",
            Command::Undo => "undo",
            Command::Redo => "redo",
            Command::Add { .. } => "add",
            Command::Text { .. } => "text",
            Command::Mode { .. } => "mode",
            Command::Title { .. } => "title",
            Command::Dup(_) => "dup",
            Command::Rm(_) => "rm",
            Command::List => "list",
            Command::Save(_) => "save",
            Command::Help => "help",
            Command::Quit => "quit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command `{0}` (try `help`)")]
    Unknown(String),
    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),
    #[error("`{0}` is not a test case number")]
    BadIndex(String),
    #[error("{0}")]
    BadMode(String),
}

pub const HELP: &str = "\
pattern <text>          replace the pattern
undo | redo             step through pattern history
add <any|all|none> <t>  add a test case
text <n> <text>         change the text of case n
mode <n> <mode>         change the match mode of case n
title <n> <title>       rename case n
dup <n>                 duplicate case n
rm <n>                  remove case n
list                    show verdicts
save [path]             write the document
quit";

/// Parse one input line. Blank lines parse to `None`.
pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Ok(None);
    }
    let line = line.trim_start();
    let (word, rest) = split_word(line);
    let command = match word {
        // The pattern keeps interior and trailing whitespace verbatim.
        "pattern" | "p" => Command::Pattern(rest.to_string()),
        "undo" | "u" => Command::Undo,
        "redo" | "r" => Command::Redo,
        "add" | "a" => {
            let (mode, text) = split_word(rest);
            if mode.is_empty() {
                return Err(CommandError::MissingArgument("add"));
            }
            Command::Add {
                mode: parse_mode(mode)?,
                text: text.to_string(),
            }
        }
        "text" | "t" => {
            let (index, text) = split_index(rest, "text")?;
            Command::Text {
                index,
                text: text.to_string(),
            }
        }
        "mode" | "m" => {
            let (index, mode) = split_index(rest, "mode")?;
            if mode.trim().is_empty() {
                return Err(CommandError::MissingArgument("mode"));
            }
            Command::Mode {
                index,
                mode: parse_mode(mode.trim())?,
            }
        }
        "title" => {
            let (index, title) = split_index(rest, "title")?;
            Command::Title {
                index,
                title: title.to_string(),
            }
        }
        "dup" | "d" => Command::Dup(split_index(rest, "dup")?.0),
        "rm" => Command::Rm(split_index(rest, "rm")?.0),
        "list" | "l" => Command::List,
        "save" => {
            let path = rest.trim();
            Command::Save((!path.is_empty()).then(|| PathBuf::from(path)))
        }
        "help" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

/// First word and the remainder after exactly one separating space.
fn split_word(input: &str) -> (&str, &str) {
    match input.split_once(' ') {
        Some((word, rest)) => (word, rest),
        None => (input, ""),
    }
}

fn split_index<'a>(input: &'a str, command: &'static str) -> Result<(usize, &'a str), CommandError> {
    let (raw, rest) = split_word(input.trim_start());
    if raw.is_empty() {
        return Err(CommandError::MissingArgument(command));
    }
    match raw.parse::<usize>() {
        Ok(index) if index > 0 => Ok((index, rest)),
        _ => Err(CommandError::BadIndex(raw.to_string())),
    }
}

fn parse_mode(raw: &str) -> Result<MatchMode, CommandError> {
    raw.parse().map_err(CommandError::BadMode)
}

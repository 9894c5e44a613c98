//! Typed command line → user intent.
//!
//! Lines starting with `:` are commands; anything else is free text
//! submitted to the workflow (a request, or an edit instruction while
//! editing).

use classdeck_core::{ContentCategory, Settings, UnknownCategory};
use classdeck_workflow::Intent;

pub const HELP: &str = "\
Commands:
  <text>                         send a request (or an edit instruction)
  :next / :back                  move through the preview
  :remove                        drop the current slide
  :edit / :done                  enter / leave edit mode
  :insert                        insert the remaining slides
  :cancel                        cancel the request or the preview
  :new                           start a new conversation
  :type <category|none>          vocabulary, grammar, quiz, homework
  :settings <language> <level> [native] [age]
  :help
  :quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Intent(Intent),
    Help,
    Quit,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command :{0} (try :help)")]
    Unknown(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
    #[error(transparent)]
    Category(#[from] UnknownCategory),
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let Some(rest) = line.strip_prefix(':') else {
        return Ok(Some(Command::Intent(Intent::Submit(line.to_string()))));
    };

    let mut words = rest.split_whitespace();
    let name = words.next().unwrap_or_default().to_ascii_lowercase();
    let args: Vec<&str> = words.collect();

    let intent = match name.as_str() {
        "quit" | "q" => return Ok(Some(Command::Quit)),
        "help" | "h" => return Ok(Some(Command::Help)),
        "next" | "n" => Intent::Next,
        "back" | "b" => Intent::Back,
        "remove" | "skip" => Intent::Remove,
        "edit" => Intent::Edit,
        "done" => Intent::ExitEdit,
        "cancel" => Intent::Cancel,
        "insert" => Intent::Insert,
        "new" => Intent::NewConversation,
        "type" => match args.as_slice() {
            ["none"] => Intent::SelectCategory(None),
            [category] => Intent::SelectCategory(Some(category.parse::<ContentCategory>()?)),
            _ => return Err(CommandError::Usage(":type <vocabulary|grammar|quiz|homework|none>")),
        },
        "settings" => Intent::SaveSettings(parse_settings(&args)?),
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(Command::Intent(intent)))
}

fn parse_settings(args: &[&str]) -> Result<Settings, CommandError> {
    let (language, level, rest) = match args {
        [language, level, rest @ ..] if rest.len() <= 2 => (language, level, rest),
        _ => return Err(CommandError::Usage(":settings <language> <level> [native] [age]")),
    };
    let defaults = Settings::default();
    Ok(Settings {
        language: language.to_string(),
        level: level.to_string(),
        native_language: rest.first().map_or(defaults.native_language, |s| s.to_string()),
        age_group: rest.get(1).map_or(defaults.age_group, |s| s.to_string()),
    })
}

// Operator commands read from stdin
use crate::domain::simulator::{ConfigField, UnknownField};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Flip between live and paused display
    Toggle,
    Start,
    Stop,
    Set { field: ConfigField, raw: String },
    History,
    Status,
    Show,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command '{0}' (type 'help' for a list)")]
    Unknown(String),

    #[error("usage: set <field> <value>")]
    SetUsage,

    #[error(transparent)]
    Field(#[from] UnknownField),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(Command::Show);
        };

        let command = match verb.to_lowercase().as_str() {
            "p" | "toggle" => Command::Toggle,
            "start" => Command::Start,
            "stop" => Command::Stop,
            "h" | "history" => Command::History,
            "s" | "status" => Command::Status,
            "show" => Command::Show,
            "?" | "help" => Command::Help,
            "q" | "quit" | "exit" => Command::Quit,
            "set" => {
                let (Some(field), Some(raw), None) = (words.next(), words.next(), words.next())
                else {
                    return Err(CommandError::SetUsage);
                };
                Command::Set {
                    field: field.parse()?,
                    raw: raw.to_string(),
                }
            }
            _ => return Err(CommandError::Unknown(verb.to_string())),
        };

        Ok(command)
    }
}

// FILE: crates/cli/src/commands.rs

use bookdeck_core::{BookId, ChapterId};
use std::str::FromStr;
use thiserror::Error;

/// Commands accepted by an interactive session
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Play,
    Pause,
    Toggle,
    Next,
    Previous,
    Seek(f64),
    Rate,
    Mute,
    Volume(f32),
    Immersive,
    Book(BookId),
    Chapter(ChapterId),
    ChapterNumber(u32),
    Collapse,
    Chapters,
    Status,
    Help,
    Quit,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command '{0}', type 'help' for a list")]
    Unknown(String),

    #[error("'{command}' needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("'{command}' expects a number, got '{value}'")]
    InvalidNumber { command: &'static str, value: String },

    #[error("'{0}' takes no arguments")]
    UnexpectedArgument(String),
}

pub const HELP: &str = "\
Commands:
  play | pause | toggle     start, stop or flip playback
  next | prev               step to the adjacent chapter
  seek <seconds>            move the playhead
  rate                      cycle the playback rate
  mute                      toggle mute
  volume <0..1>             set the volume level
  xr                        toggle immersive mode
  book <id>                 select a book in the catalog
  chapter <id|number>       select a chapter of the highlighted book
  chapters                  list the highlighted book's chapters
  collapse                  collapse or expand the chapter list
  status                    show what is playing
  help                      show this help
  quit                      leave the player";

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let name = words.next().ok_or(CommandError::Empty)?.to_ascii_lowercase();
        let argument = words.next();
        if let Some(extra) = words.next() {
            return Err(CommandError::UnexpectedArgument(extra.to_string()));
        }

        let bare = |command: Command| match argument {
            Some(value) => Err(CommandError::UnexpectedArgument(value.to_string())),
            None => Ok(command),
        };

        match name.as_str() {
            "play" => bare(Command::Play),
            "pause" => bare(Command::Pause),
            "toggle" | "p" => bare(Command::Toggle),
            "next" | "n" => bare(Command::Next),
            "prev" | "previous" => bare(Command::Previous),
            "rate" => bare(Command::Rate),
            "mute" | "m" => bare(Command::Mute),
            "xr" | "immersive" => bare(Command::Immersive),
            "collapse" => bare(Command::Collapse),
            "chapters" | "ls" => bare(Command::Chapters),
            "status" | "s" => bare(Command::Status),
            "help" | "?" => bare(Command::Help),
            "quit" | "q" | "exit" => bare(Command::Quit),
            "seek" => number("seek", "a position in seconds", argument).map(Command::Seek),
            "volume" | "vol" => {
                number("volume", "a level between 0 and 1", argument).map(Command::Volume)
            }
            "book" => argument
                .map(|id| Command::Book(BookId::new(id)))
                .ok_or(CommandError::MissingArgument {
                    command: "book",
                    argument: "a book id",
                }),
            "chapter" => {
                let value = argument.ok_or(CommandError::MissingArgument {
                    command: "chapter",
                    argument: "a chapter id or number",
                })?;
                Ok(match value.parse::<u32>() {
                    Ok(number) => Command::ChapterNumber(number),
                    Err(_) => Command::Chapter(ChapterId::new(value)),
                })
            }
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

fn number<T: FromStr>(
    command: &'static str,
    argument: &'static str,
    value: Option<&str>,
) -> Result<T, CommandError> {
    let value = value.ok_or(CommandError::MissingArgument { command, argument })?;
    value.parse().map_err(|_| CommandError::InvalidNumber {
        command,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_commands() {
        assert_eq!("play".parse(), Ok(Command::Play));
        assert_eq!("  NEXT ".parse(), Ok(Command::Next));
        assert_eq!("prev".parse(), Ok(Command::Previous));
        assert_eq!("xr".parse(), Ok(Command::Immersive));
        assert_eq!("q".parse(), Ok(Command::Quit));
    }

    #[test]
    fn test_parse_numbers() {
        assert_eq!("seek 12.5".parse(), Ok(Command::Seek(12.5)));
        assert_eq!("volume 0.3".parse(), Ok(Command::Volume(0.3)));
        assert_eq!(
            "seek soon".parse::<Command>(),
            Err(CommandError::InvalidNumber {
                command: "seek",
                value: "soon".to_string()
            })
        );
        assert!(matches!(
            "volume".parse::<Command>(),
            Err(CommandError::MissingArgument { command: "volume", .. })
        ));
    }

    #[test]
    fn test_parse_selection() {
        assert_eq!("book 2".parse(), Ok(Command::Book(BookId::from("2"))));
        assert_eq!(
            "chapter 2-chapter-8".parse(),
            Ok(Command::Chapter(ChapterId::new("2-chapter-8")))
        );
        assert_eq!("chapter 8".parse(), Ok(Command::ChapterNumber(8)));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<Command>(), Err(CommandError::Empty));
        assert_eq!(
            "dance".parse::<Command>(),
            Err(CommandError::Unknown("dance".to_string()))
        );
        assert_eq!(
            "play now".parse::<Command>(),
            Err(CommandError::UnexpectedArgument("now".to_string()))
        );
        assert!("seek 1 2".parse::<Command>().is_err());
    }
}

use std::path::PathBuf;

use thiserror::Error;

use crate::scanner::bytes_to_path;

/// Request verbs understood by the completion server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ping,
    Insert(Vec<u8>),
    Complete(Vec<u8>),
    Scan(PathBuf),
    Count,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty request")]
    Empty,
    #[error("unknown verb: {0}")]
    UnknownVerb(String),
    #[error("{0} requires an argument")]
    MissingArg(&'static str),
}

impl Command {
    pub fn from_args(args: &[Vec<u8>]) -> Result<Command, CommandError> {
        let mut args = args.iter();
        let verb = args.next().ok_or(CommandError::Empty)?;

        let cmd = match verb.to_ascii_uppercase().as_slice() {
            b"PING" => Command::Ping,
            b"INSERT" => {
                let path = args.next().ok_or(CommandError::MissingArg("INSERT"))?;
                Command::Insert(path.clone())
            }
            b"COMPLETE" => {
                let partial = args.next().ok_or(CommandError::MissingArg("COMPLETE"))?;
                Command::Complete(partial.clone())
            }
            b"SCAN" => {
                let dir = args.next().ok_or(CommandError::MissingArg("SCAN"))?;
                Command::Scan(bytes_to_path(dir))
            }
            b"COUNT" => Command::Count,
            _ => {
                return Err(CommandError::UnknownVerb(
                    String::from_utf8_lossy(verb).into_owned(),
                ))
            }
        };
        Ok(cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ping_is_case_insensitive() {
        assert_eq!(Command::from_args(&[b"ping".to_vec()]), Ok(Command::Ping));
        assert_eq!(Command::from_args(&[b"PING".to_vec()]), Ok(Command::Ping));
    }

    #[test]
    fn test_parse_complete() {
        let args = vec![b"complete".to_vec(), b"/usr/bin/ls".to_vec()];
        assert_eq!(
            Command::from_args(&args),
            Ok(Command::Complete(b"/usr/bin/ls".to_vec()))
        );
    }

    #[test]
    fn test_parse_scan_builds_a_path() {
        let args = vec![b"SCAN".to_vec(), b"/usr/bin".to_vec()];
        assert_eq!(
            Command::from_args(&args),
            Ok(Command::Scan(PathBuf::from("/usr/bin")))
        );
    }

    #[test]
    fn test_unknown_verb_is_an_error() {
        assert_eq!(
            Command::from_args(&[b"EXPLODE".to_vec()]),
            Err(CommandError::UnknownVerb(String::from("EXPLODE")))
        );
    }

    #[test]
    fn test_missing_argument_is_an_error() {
        assert_eq!(
            Command::from_args(&[b"INSERT".to_vec()]),
            Err(CommandError::MissingArg("INSERT"))
        );
    }

    #[test]
    fn test_empty_request_is_an_error() {
        assert_eq!(Command::from_args(&[]), Err(CommandError::Empty));
    }
}

use std::str::FromStr;

use uavlink_core::endpoint::Endpoint;

use crate::prelude::*;

pub const HELP: &str = "\
commands:
  connect          ask the vehicle to bring its link up
  disconnect       ask the vehicle to drop its link
  url <URL>        switch to another backend endpoint
  reconnect        open a new session to the current endpoint
  status           print the current state
  help             show this list
  quit             close the session and exit";

/// One line typed by the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorCommand {
    Connect,
    Disconnect,
    Url(Endpoint),
    Reconnect,
    Status,
    Help,
    Quit,
}

impl FromStr for OperatorCommand {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let command = match word.to_ascii_lowercase().as_str() {
            "connect" => Self::Connect,
            "disconnect" => Self::Disconnect,
            "url" | "endpoint" => {
                if rest.is_empty() {
                    return Err(Error::MissingArgument {
                        command: "url",
                        expected: "a URL",
                    });
                }
                Self::Url(Endpoint::parse(rest)?)
            }
            "reconnect" => Self::Reconnect,
            "status" | "s" => Self::Status,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            _ => return Err(Error::UnknownCommand(word.to_string())),
        };
        Ok(command)
    }
}

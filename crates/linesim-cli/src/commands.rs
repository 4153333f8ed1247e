//! Console command parsing.

use linesim_core::ScenarioId;
use thiserror::Error;

/// One console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the current parameters.
    Params,
    /// Set a parameter. The value is the rest of the line and may be empty
    /// or contain spaces.
    Set {
        /// Parameter name.
        name: String,
        /// New value.
        value: String,
    },
    /// Print the catalog grouped by category.
    List,
    /// Play a scenario.
    Play(ScenarioId),
    /// Stop the in-flight playback.
    Stop,
    /// Clear the transcript.
    Clear,
    /// Reload the catalog.
    Refresh,
    /// Print the whole transcript.
    Show,
    /// Print playback, transcript and catalog status.
    Status,
    /// Report placeholders a scenario would leave unresolved.
    Check(ScenarioId),
    /// Print command help.
    Help,
    /// Leave the console.
    Quit,
    /// Blank line.
    Empty,
}

/// A line that is not a valid command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Unrecognised command word.
    #[error("unknown command '{0}'; type 'help' for a list")]
    Unknown(String),
    /// A required argument is missing.
    #[error("'{command}' needs {argument}")]
    MissingArgument {
        /// Command word.
        command: &'static str,
        /// Description of the missing argument.
        argument: &'static str,
    },
}

/// Help text listing every command.
pub const HELP: &str = "\
Commands:
  params                 show template parameters
  set <name> <value>     change a parameter (applies to messages not yet sent)
  list                   show scenarios by category
  play <id>              play a scenario
  stop                   stop the current playback
  clear                  clear the chat transcript
  refresh                reload scenarios from the catalog
  show                   print the whole transcript
  status                 show playback and catalog status
  check <id>             list placeholders a scenario leaves unresolved
  help                   show this help
  quit                   exit";

impl Command {
    /// Parse one input line. A leading `/` is accepted.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        let line = line.strip_prefix('/').unwrap_or(line);
        if line.is_empty() {
            return Ok(Self::Empty);
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word.to_ascii_lowercase().as_str() {
            "params" | "parameters" => Ok(Self::Params),
            "set" => {
                let (name, value) = match rest.split_once(char::is_whitespace) {
                    Some((name, value)) => (name, value.trim()),
                    None => (rest, ""),
                };
                if name.is_empty() {
                    return Err(CommandError::MissingArgument {
                        command: "set",
                        argument: "a parameter name",
                    });
                }
                Ok(Self::Set {
                    name: name.to_string(),
                    value: value.to_string(),
                })
            },
            "list" | "ls" => Ok(Self::List),
            "play" | "p" => scenario_arg("play", rest).map(Self::Play),
            "stop" => Ok(Self::Stop),
            "clear" => Ok(Self::Clear),
            "refresh" | "reload" => Ok(Self::Refresh),
            "show" | "transcript" => Ok(Self::Show),
            "status" => Ok(Self::Status),
            "check" => scenario_arg("check", rest).map(Self::Check),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            _ => Err(CommandError::Unknown(word.to_string())),
        }
    }
}

fn scenario_arg(command: &'static str, rest: &str) -> Result<ScenarioId, CommandError> {
    if rest.is_empty() {
        Err(CommandError::MissingArgument {
            command,
            argument: "a scenario id",
        })
    } else {
        Ok(ScenarioId::new(rest))
    }
}

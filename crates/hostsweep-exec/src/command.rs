//! External command description

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single external command: program, arguments and whether it needs elevation
///
/// Arguments are passed to the program as-is, no shell is involved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Program name, resolved on `$PATH`
    pub program: String,
    /// Argument list
    pub args: Vec<String>,
    /// Whether the command must run with elevated privileges
    #[serde(default)]
    pub privileged: bool,
}

impl CommandSpec {
    /// Create an unprivileged command
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            privileged: false,
        }
    }

    /// Create a command that runs with elevated privileges
    pub fn privileged<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(program, args).elevated()
    }

    /// Mark the command as privileged
    #[must_use]
    pub fn elevated(mut self) -> Self {
        self.privileged = true;
        self
    }

    /// Append extra arguments
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{arg}'")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

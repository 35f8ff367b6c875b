//! Error types for building and dispatching command trees.
//!
//! Three layers of failure exist, each with its own type:
//!
//! - [`SetupError`]: mistakes made while building the tree (duplicate names,
//!   malformed flag names). Returned from builder calls.
//! - [`FlagError`]: a token sequence that does not fit a [`FlagSet`](crate::FlagSet).
//! - [`DispatchError`]: everything that can end a dispatch early, including
//!   the error returned by the handler itself.
//!
//! The engine never terminates the process. [`DispatchError::exit`] is the
//! opt-in for binaries that want conventional exit-on-error behavior.

use std::io::Write;

use thiserror::Error;

/// Errors raised while building a command tree.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SetupError {
    /// A node already has a child with this name. Holds the full path.
    #[error("duplicate command: {0}")]
    DuplicateCommand(String),

    /// A flag with this name is already declared on the same node.
    #[error("duplicate flag '--{flag}' on command '{command}'")]
    DuplicateFlag { command: String, flag: String },

    /// Flag names must be non-empty, must not start with '-' and must not contain '='.
    #[error("invalid flag name '{0}'")]
    InvalidFlagName(String),
}

/// Errors raised while parsing flag tokens.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlagError {
    /// A flag-looking token that no declaration matches.
    #[error("flag provided but not defined: {0}")]
    Unknown(String),

    /// The value given to a flag could not be converted to its kind.
    #[error("invalid value {value:?} for flag {flag}")]
    InvalidValue { flag: String, value: String },

    /// A non-boolean flag appeared without a value.
    #[error("flag needs an argument: {0}")]
    MissingValue(String),

    /// `-h` or `--help` was given and no `help` flag is declared.
    #[error("help requested")]
    Help,

    /// Any other parser complaint.
    #[error("{0}")]
    Invalid(String),
}

/// Errors that end a dispatch.
///
/// Every variant except [`DispatchError::Handler`] carries the usage text of
/// the node where dispatch stopped, so callers can show it without going back
/// to the tree.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Flag parsing failed at some node along the path.
    #[error("{source}")]
    Flag {
        #[source]
        source: FlagError,
        usage: String,
    },

    /// A router node received a token that names none of its children.
    #[error("command provided but not defined: {name}")]
    UnknownCommand { name: String, usage: String },

    /// A router node was reached with nothing left to dispatch on.
    #[error("no command provided")]
    MissingCommand { usage: String },

    /// The composed handler returned an error.
    #[error(transparent)]
    Handler(#[from] anyhow::Error),
}

impl DispatchError {
    /// The process exit status conventionally associated with this error.
    ///
    /// Parse and routing errors use 2, help and bare router invocations are
    /// not failures (0), handler errors use 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            DispatchError::Flag {
                source: FlagError::Help,
                ..
            } => 0,
            DispatchError::Flag { .. } => 2,
            DispatchError::UnknownCommand { .. } => 2,
            DispatchError::MissingCommand { .. } => 0,
            DispatchError::Handler(_) => 1,
        }
    }

    /// Returns the usage text attached to this error, if any.
    pub fn usage(&self) -> Option<&str> {
        match self {
            DispatchError::Flag { usage, .. }
            | DispatchError::UnknownCommand { usage, .. }
            | DispatchError::MissingCommand { usage } => Some(usage),
            DispatchError::Handler(_) => None,
        }
    }

    /// Returns true if this error came out of the handler chain.
    pub fn is_handler(&self) -> bool {
        matches!(self, DispatchError::Handler(_))
    }

    /// Text meant for the diagnostic stream.
    ///
    /// Help and bare router invocations produce only the usage text; the other
    /// routing errors produce the message followed by the usage.
    pub fn report(&self) -> String {
        match self {
            DispatchError::Flag {
                source: FlagError::Help,
                usage,
            }
            | DispatchError::MissingCommand { usage } => usage.clone(),
            DispatchError::Flag { usage, .. } | DispatchError::UnknownCommand { usage, .. } => {
                format!("{self}\n{usage}")
            }
            DispatchError::Handler(err) => format!("error: {err:#}\n"),
        }
    }

    /// Writes [`report`](Self::report) to stderr and exits with
    /// [`exit_code`](Self::exit_code).
    pub fn exit(&self) -> ! {
        let mut stderr = std::io::stderr().lock();
        // Nothing sensible to do if stderr is gone; exit status still reports the failure.
        let _ = stderr.write_all(self.report().as_bytes());
        let _ = stderr.flush();
        std::process::exit(self.exit_code())
    }
}

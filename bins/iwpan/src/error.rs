//! Command errors and the exit status each one maps to.

use wpan_nlink::util::{IfError, ParseError};

/// Why a command invocation failed.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Wrong number of arguments or a malformed token.
    #[error("invalid arguments")]
    Usage,

    #[error("{what} out of range: {value}")]
    OutOfRange { what: String, value: String },

    /// Well-formed but meaningless input, such as an unknown interface type.
    #[error("{0}")]
    InvalidArgument(String),

    #[error("unknown device: {0}")]
    UnknownDevice(String),

    #[error("{}", netlink_message(.0))]
    Netlink(#[from] wpan_nlink::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn netlink_message(e: &wpan_nlink::Error) -> String {
    match e {
        wpan_nlink::Error::Kernel { errno, message }
        | wpan_nlink::Error::KernelWithContext { errno, message, .. } => {
            // strerror text without std's " (os error N)" suffix
            let text = message.split(" (os error").next().unwrap_or(message);
            format!("command failed: {} ({})", text, -errno)
        }
        other => other.to_string(),
    }
}

impl CommandError {
    /// Process exit status: 1 for usage problems, 2 for everything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage | Self::OutOfRange { .. } => 1,
            _ => 2,
        }
    }

    /// True if the command's usage line should be shown.
    pub fn is_usage(&self) -> bool {
        self.exit_code() == 1
    }

    pub fn out_of_range(what: &str, value: &str) -> Self {
        Self::OutOfRange {
            what: what.to_string(),
            value: value.to_string(),
        }
    }
}

impl From<ParseError> for CommandError {
    fn from(e: ParseError) -> Self {
        match e {
            ParseError::InvalidNumber(_) => Self::Usage,
            ParseError::OutOfRange(value) => Self::out_of_range("value", &value),
            ParseError::InvalidFormat(value) => {
                Self::InvalidArgument(format!("invalid argument {}", value))
            }
        }
    }
}

impl From<IfError> for CommandError {
    fn from(e: IfError) -> Self {
        match e {
            IfError::NotFound(name) | IfError::InvalidName(name) => Self::UnknownDevice(name),
            IfError::Io(e) => Self::Io(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, CommandError>;

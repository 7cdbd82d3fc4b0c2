//! Error types for netlink operations.

use std::io;

/// Result type for netlink operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during netlink operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error from socket operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Kernel returned an error code.
    #[error("kernel error: {message} (errno {errno})")]
    Kernel {
        /// The errno value from the kernel.
        errno: i32,
        /// Human-readable error message.
        message: String,
    },

    /// Kernel error with operation context.
    #[error("{operation}: {message} (errno {errno})")]
    KernelWithContext {
        /// The operation that failed.
        operation: String,
        /// The errno value from the kernel.
        errno: i32,
        /// Human-readable error message.
        message: String,
    },

    /// Message was truncated.
    #[error("message truncated: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Expected message length.
        expected: usize,
        /// Actual bytes received.
        actual: usize,
    },

    /// Invalid message format.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Invalid attribute format.
    #[error("invalid attribute: {0}")]
    InvalidAttribute(String),

    /// An attribute violated its declared type or length policy.
    #[error("failed to parse nested attributes: {attr}: {reason}")]
    Policy {
        /// Attribute name as declared in the policy.
        attr: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// A mandatory attribute was absent from a reply.
    #[error("missing attribute: {name}")]
    MissingAttribute {
        /// Attribute name.
        name: &'static str,
    },

    /// The request does not fit into a netlink attribute or message.
    #[error("message overflow: {len} bytes exceeds limit of {max}")]
    MessageOverflow {
        /// Length that was requested.
        len: usize,
        /// Largest length the encoding allows.
        max: usize,
    },

    /// Generic netlink family not registered in the kernel.
    #[error("generic netlink family not found: {name}")]
    FamilyNotFound {
        /// Family name.
        name: String,
    },

    /// Multicast group not exported by a family.
    #[error("multicast group {group} not found in family {family}")]
    McastGroupNotFound {
        /// Family name.
        family: String,
        /// Group name.
        group: String,
    },

    /// Operation not supported.
    #[error("operation not supported: {0}")]
    NotSupported(String),

    /// Interface not found.
    #[error("interface not found: {name}")]
    InterfaceNotFound {
        /// The interface name that was not found.
        name: String,
    },

    /// WPAN PHY not found.
    #[error("wpan phy not found: {name}")]
    PhyNotFound {
        /// The PHY name that was not found.
        name: String,
    },

    /// JSON serialization error.
    #[cfg(feature = "output")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a kernel error from a (negative) errno value.
    pub fn from_errno(errno: i32) -> Self {
        let message = io::Error::from_raw_os_error(-errno).to_string();
        Self::Kernel {
            errno: -errno,
            message,
        }
    }

    /// Create a kernel error with operation context.
    pub fn from_errno_with_context(errno: i32, operation: impl Into<String>) -> Self {
        let message = io::Error::from_raw_os_error(-errno).to_string();
        Self::KernelWithContext {
            operation: operation.into(),
            errno: -errno,
            message,
        }
    }

    /// Add context to this error.
    ///
    /// Wraps kernel errors with operation context. Other errors are returned unchanged.
    pub fn with_context(self, operation: impl Into<String>) -> Self {
        match self {
            Self::Kernel { errno, message } => Self::KernelWithContext {
                operation: operation.into(),
                errno,
                message,
            },
            other => other,
        }
    }

    /// Shorthand for a policy violation.
    pub fn policy(attr: &'static str, reason: impl Into<String>) -> Self {
        Self::Policy {
            attr,
            reason: reason.into(),
        }
    }

    /// Check if this is a "not found" error (ENOENT, ENODEV, etc.).
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Kernel { errno, .. } | Self::KernelWithContext { errno, .. } => {
                matches!(*errno, libc::ENOENT | libc::ENODEV)
            }
            Self::InterfaceNotFound { .. }
            | Self::PhyNotFound { .. }
            | Self::FamilyNotFound { .. }
            | Self::McastGroupNotFound { .. } => true,
            _ => false,
        }
    }

    /// Check if this is a permission error (EPERM, EACCES).
    pub fn is_permission_denied(&self) -> bool {
        matches!(self.errno(), Some(libc::EPERM | libc::EACCES))
    }

    /// Check if the kernel rejected the command as unsupported.
    pub fn is_not_supported(&self) -> bool {
        match self {
            Self::NotSupported(_) => true,
            _ => matches!(self.errno(), Some(libc::EOPNOTSUPP | libc::EINVAL)),
        }
    }

    /// Check if this is a "device busy" error (EBUSY).
    pub fn is_busy(&self) -> bool {
        self.errno() == Some(libc::EBUSY)
    }

    /// Get the errno value if this is a kernel error.
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::Kernel { errno, .. } | Self::KernelWithContext { errno, .. } => Some(*errno),
            Self::Io(e) => e.raw_os_error(),
            _ => None,
        }
    }
}

//! Errors and exit statuses.

/// Why a wpan-hwsim invocation failed.
#[derive(Debug, thiserror::Error)]
pub enum HwsimError {
    /// The `mac802154_hwsim` module is not loaded.
    #[error("MAC802154_HWSIM not found")]
    NotLoaded,

    #[error("failed to {action}: {}", strerror(.source))]
    Request {
        action: &'static str,
        source: wpan_nlink::Error,
    },

    #[error("{0}")]
    Netlink(#[from] wpan_nlink::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn strerror(e: &wpan_nlink::Error) -> String {
    match e {
        wpan_nlink::Error::Kernel { message, .. }
        | wpan_nlink::Error::KernelWithContext { message, .. } => message
            .split(" (os error")
            .next()
            .unwrap_or(message)
            .to_string(),
        other => other.to_string(),
    }
}

impl HwsimError {
    /// Attach what was being attempted to a failed request.
    pub fn request(action: &'static str) -> impl FnOnce(wpan_nlink::Error) -> Self {
        move |source| Self::Request { action, source }
    }

    /// Map a failed family lookup to [`HwsimError::NotLoaded`].
    pub fn connect(e: wpan_nlink::Error) -> Self {
        match e {
            wpan_nlink::Error::FamilyNotFound { .. } => Self::NotLoaded,
            other => Self::Netlink(other),
        }
    }

    /// Command line problems are reported by clap with status 1; anything
    /// that reaches the kernel fails with 2.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

pub type Result<T> = std::result::Result<T, HwsimError>;

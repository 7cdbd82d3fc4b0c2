//! Monitor helper utilities for event-based output.
//!
//! # Example
//!
//! ```ignore
//! use wpan_nlink::netlink::genl::nl802154::{MCAST_GROUP_CONFIG, Nl802154Connection};
//! use wpan_nlink::output::{MonitorConfig, TimestampMode, print_event};
//! use tokio_stream::StreamExt;
//!
//! let mut config = MonitorConfig::new().with_timestamp(TimestampMode::Relative);
//!
//! let mut conn = Nl802154Connection::new().await?;
//! conn.subscribe(MCAST_GROUP_CONFIG).await?;
//! let mut events = conn.events();
//!
//! while let Some(event) = events.try_next().await? {
//!     print_event(&mut std::io::stdout(), &event, &mut config)?;
//! }
//! ```

use std::io::{self, Write};
use std::time::{Duration, SystemTime};

use super::{OutputFormat, OutputOptions, write_json};

/// Timestamp prefix put in front of each event line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimestampMode {
    #[default]
    None,
    /// Wall clock time.
    Absolute,
    /// Zero for the first event, then the delay since the previous one.
    Relative,
}

/// Configuration for monitor output.
#[derive(Debug, Clone, Default)]
pub struct MonitorConfig {
    pub timestamp: TimestampMode,
    /// Output format (text or JSON).
    pub format: OutputFormat,
    /// Output options.
    pub opts: OutputOptions,
    previous: Option<Duration>,
}

impl MonitorConfig {
    /// Create a new monitor config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timestamp(mut self, mode: TimestampMode) -> Self {
        self.timestamp = mode;
        self
    }

    /// Set the output format.
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the output options.
    pub fn with_opts(mut self, opts: OutputOptions) -> Self {
        self.opts = opts;
        self
    }

    /// Timestamp for an event seen at `now` (time since the epoch).
    pub fn stamp(&mut self, now: Duration) -> Option<Duration> {
        match self.timestamp {
            TimestampMode::None => None,
            TimestampMode::Absolute => Some(now),
            TimestampMode::Relative => {
                let delta = match self.previous {
                    Some(prev) => now.saturating_sub(prev),
                    None => Duration::ZERO,
                };
                self.previous = Some(now);
                Some(delta)
            }
        }
    }
}

/// Write a timestamp prefix to the output if enabled.
///
/// Format: `<seconds>.<microseconds>: `
pub fn write_timestamp<W: Write>(w: &mut W, config: &mut MonitorConfig) -> io::Result<()> {
    let now = SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    if let Some(ts) = config.stamp(now) {
        write!(w, "{}", format_timestamp(ts))?;
    }
    Ok(())
}

pub fn format_timestamp(ts: Duration) -> String {
    format!("{}.{:06}: ", ts.as_secs(), ts.subsec_micros())
}

/// Helper trait for event types that can be printed in monitor mode.
pub trait MonitorEvent {
    /// Print the event in text format.
    fn print_text<W: Write>(&self, w: &mut W, opts: &OutputOptions) -> io::Result<()>;

    /// Convert the event to a JSON value.
    fn to_json(&self) -> serde_json::Value;
}

/// Print a monitor event using the configured format.
pub fn print_event<W, E>(w: &mut W, event: &E, config: &mut MonitorConfig) -> io::Result<()>
where
    W: Write,
    E: MonitorEvent,
{
    match config.format {
        OutputFormat::Text => {
            write_timestamp(w, config)?;
            event.print_text(w, &config.opts)?;
        }
        OutputFormat::Json => {
            let mut json = event.to_json();
            let now = SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default();
            if let Some(ts) = config.stamp(now) {
                json["timestamp"] = serde_json::json!(ts.as_secs_f64());
            }
            write_json(w, &json, &config.opts)?;
        }
    }

    w.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_stamps() {
        let mut config = MonitorConfig::new().with_timestamp(TimestampMode::Relative);
        assert_eq!(config.stamp(Duration::from_secs(100)), Some(Duration::ZERO));
        assert_eq!(
            config.stamp(Duration::from_micros(100_250_000)),
            Some(Duration::from_millis(250))
        );
        assert_eq!(
            config.stamp(Duration::from_micros(101_250_000)),
            Some(Duration::from_secs(1))
        );
    }

    #[test]
    fn test_absolute_and_none() {
        let mut config = MonitorConfig::new().with_timestamp(TimestampMode::Absolute);
        let now = Duration::from_micros(1_700_000_000_000_042);
        assert_eq!(config.stamp(now), Some(now));

        let mut config = MonitorConfig::new();
        assert_eq!(config.stamp(now), None);
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(Duration::from_micros(3_000_042)), "3.000042: ");
        assert_eq!(format_timestamp(Duration::ZERO), "0.000000: ");
    }
}

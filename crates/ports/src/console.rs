//! Host console boundary contract.

use insights_diag_shared::Result;
use std::fmt;

/// Output channel on the host's diagnostic console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsoleChannel {
    /// Preferred channel for diagnostics.
    Warn,
    /// Fallback channel.
    Log,
}

impl ConsoleChannel {
    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Warn => "warn",
            Self::Log => "log",
        }
    }
}

impl fmt::Display for ConsoleChannel {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Boundary contract for the host's diagnostic output.
///
/// Hosts may expose only some channels. Callers pick the first available one
/// via [`select_channel`] and skip the write entirely when none is available.
pub trait ConsoleSinkPort: Send + Sync {
    /// Returns true when the host exposes `channel`.
    fn has_channel(&self, channel: ConsoleChannel) -> bool;

    /// Write a single line on `channel`.
    fn write(&self, channel: ConsoleChannel, line: &str) -> Result<()>;
}

/// Pick `Warn` when present, else `Log`, else nothing.
#[must_use]
pub fn select_channel(console: &dyn ConsoleSinkPort) -> Option<ConsoleChannel> {
    [ConsoleChannel::Warn, ConsoleChannel::Log]
        .into_iter()
        .find(|channel| console.has_channel(*channel))
}

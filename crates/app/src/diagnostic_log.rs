//! Severity-filtered, self-throttling internal diagnostic log.
//!
//! Every recorded message is prefixed and echoed to the host console, then
//! queued only when its severity passes the verbosity filter and the per page
//! view throttle has room. The log never fails the caller; the single escape
//! hatch is [`RecordOutcome::Raise`] while debug exceptions are enabled.

use insights_diag_domain::{Actionability, DiagnosticMessage, Severity, ThrottleLimit};
use insights_diag_ports::{ConsoleSinkPort, select_channel};
use insights_diag_shared::{ErrorCode, ErrorEnvelope, Result};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Runtime mode switches for the diagnostic log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiagnosticMode {
    /// Hand messages back to the caller instead of recording them.
    pub debug_exceptions: bool,
    /// Queue warnings as well as critical messages.
    pub verbose_logging: bool,
}

impl DiagnosticMode {
    /// Default production mode (no raise, critical only).
    #[must_use]
    pub const fn production() -> Self {
        Self {
            debug_exceptions: false,
            verbose_logging: false,
        }
    }
}

/// What happened to a message that was recorded rather than raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Appended to the queue.
    Queued,
    /// Appended, and the throttle limit was reached so the sentinel followed it.
    QueuedWithSentinel,
    /// Echoed to the console but not queued (warning while not verbose).
    FilteredByVerbosity,
    /// Echoed to the console but not queued (throttle limit already reached).
    DroppedByThrottle,
}

impl Disposition {
    /// Returns true when the message itself landed in the queue.
    #[must_use]
    pub const fn is_queued(self) -> bool {
        matches!(self, Self::Queued | Self::QueuedWithSentinel)
    }
}

/// Result of [`DiagnosticLog::record`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a raised diagnostic must be handled or explicitly ignored"]
pub enum RecordOutcome {
    /// Debug exceptions are enabled: the untouched message is handed back.
    Raise(DiagnosticMessage),
    /// The message was prefixed, echoed, and run through the throttle.
    Recorded(Disposition),
}

impl RecordOutcome {
    /// Returns true for [`RecordOutcome::Raise`].
    #[must_use]
    pub const fn is_raise(&self) -> bool {
        matches!(self, Self::Raise(_))
    }

    /// The disposition, when the message was recorded.
    #[must_use]
    pub const fn disposition(&self) -> Option<Disposition> {
        match self {
            Self::Raise(_) => None,
            Self::Recorded(disposition) => Some(*disposition),
        }
    }

    /// Convert a raise into an error at a host boundary.
    ///
    /// The envelope carries the message text and its properties as metadata.
    pub fn into_result(self) -> Result<Disposition> {
        match self {
            Self::Recorded(disposition) => Ok(disposition),
            Self::Raise(message) => {
                let DiagnosticMessage { text, properties } = message;
                let envelope = ErrorEnvelope::expected(ErrorCode::diagnostic_raised(), text);
                Err(properties
                    .into_iter()
                    .fold(envelope, |envelope, (key, value)| {
                        envelope.with_metadata(key, value)
                    }))
            },
        }
    }
}

#[derive(Debug)]
struct LogState {
    queue: Vec<DiagnosticMessage>,
    throttle_count: u32,
    throttle_limit: ThrottleLimit,
    mode: DiagnosticMode,
}

impl LogState {
    fn enqueue(&mut self, severity: Severity, message: DiagnosticMessage) -> Disposition {
        let limit = self.throttle_limit.get();
        if self.throttle_count >= limit {
            return Disposition::DroppedByThrottle;
        }
        if !severity.is_recordable(self.mode.verbose_logging) {
            return Disposition::FilteredByVerbosity;
        }

        self.queue.push(message);
        self.throttle_count = self.throttle_count.saturating_add(1);
        if self.throttle_count == limit {
            self.queue.push(DiagnosticMessage::throttle_sentinel());
            return Disposition::QueuedWithSentinel;
        }
        Disposition::Queued
    }
}

/// The internal diagnostic log.
///
/// One instance per SDK instance, shared behind `Arc`. The internal lock is
/// never held while calling the console, so a console that logs back into
/// this instance cannot deadlock it.
pub struct DiagnosticLog {
    state: Mutex<LogState>,
    console: Option<Arc<dyn ConsoleSinkPort>>,
}

impl fmt::Debug for DiagnosticLog {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("DiagnosticLog")
            .field("state", &*self.lock())
            .field("console", &self.console.is_some())
            .finish()
    }
}

impl DiagnosticLog {
    /// Build a log with the given mode, throttle limit, and optional console.
    #[must_use]
    pub fn new(
        mode: DiagnosticMode,
        throttle_limit: ThrottleLimit,
        console: Option<Arc<dyn ConsoleSinkPort>>,
    ) -> Self {
        Self {
            state: Mutex::new(LogState {
                queue: Vec::new(),
                throttle_count: 0,
                throttle_limit,
                mode,
            }),
            console,
        }
    }

    /// Production mode, default throttle limit, no console.
    #[must_use]
    pub fn headless() -> Self {
        Self::new(DiagnosticMode::production(), ThrottleLimit::default(), None)
    }

    fn lock(&self) -> MutexGuard<'_, LogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a diagnostic message.
    ///
    /// Outside debug mode the message is prefixed exactly once, echoed to the
    /// console, and then queued subject to verbosity and the throttle.
    pub fn record(
        &self,
        actionability: Actionability,
        severity: Severity,
        message: DiagnosticMessage,
    ) -> RecordOutcome {
        if self.mode().debug_exceptions {
            return RecordOutcome::Raise(message);
        }

        let message = message.prefixed(actionability);
        self.write_console(&message.console_line());

        let disposition = self.lock().enqueue(severity, message);
        if disposition == Disposition::QueuedWithSentinel {
            self.write_console(DiagnosticMessage::throttle_sentinel().text.as_str());
        }
        RecordOutcome::Recorded(disposition)
    }

    /// Record a message meant for the SDK's end user.
    pub fn report_user_actionable(
        &self,
        severity: Severity,
        message: impl Into<DiagnosticMessage>,
    ) -> RecordOutcome {
        self.record(Actionability::UserActionable, severity, message.into())
    }

    /// Record a message meant for internal debugging only.
    pub fn report_non_user_actionable(
        &self,
        severity: Severity,
        message: impl Into<DiagnosticMessage>,
    ) -> RecordOutcome {
        self.record(Actionability::NonUserActionable, severity, message.into())
    }

    /// Write text to the console only. Never queued, never counted.
    pub fn warn_to_console(&self, text: &str) {
        self.write_console(text);
    }

    fn write_console(&self, line: &str) {
        let Some(console) = self.console.as_deref() else {
            return;
        };
        let Some(channel) = select_channel(console) else {
            return;
        };
        if let Err(error) = console.write(channel, line) {
            tracing::trace!(%channel, error = %error, "console write failed; dropped");
        }
    }

    /// Reset the per page view throttle counter.
    pub fn reset_throttle_count(&self) {
        self.lock().throttle_count = 0;
    }

    /// Replace the throttle limit. Zero is rejected with `core:invalid_argument`.
    pub fn set_throttle_limit(&self, limit: u32) -> Result<()> {
        let limit = ThrottleLimit::new(limit).map_err(ErrorEnvelope::from)?;
        self.lock().throttle_limit = limit;
        Ok(())
    }

    /// Current throttle limit.
    #[must_use]
    pub fn throttle_limit(&self) -> ThrottleLimit {
        self.lock().throttle_limit
    }

    /// Messages queued since the last reset.
    #[must_use]
    pub fn throttle_count(&self) -> u32 {
        self.lock().throttle_count
    }

    /// Current mode.
    #[must_use]
    pub fn mode(&self) -> DiagnosticMode {
        self.lock().mode
    }

    /// Replace the mode.
    pub fn set_mode(&self, mode: DiagnosticMode) {
        self.lock().mode = mode;
    }

    /// Toggle verbose logging.
    pub fn set_verbose_logging(&self, enabled: bool) {
        self.lock().mode.verbose_logging = enabled;
    }

    /// Toggle debug exceptions.
    pub fn set_debug_exceptions(&self, enabled: bool) {
        self.lock().mode.debug_exceptions = enabled;
    }

    /// Number of queued messages.
    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.lock().queue.len()
    }

    /// Copy of the queue, oldest first.
    #[must_use]
    pub fn queue_snapshot(&self) -> Vec<DiagnosticMessage> {
        self.lock().queue.clone()
    }

    /// Take every queued message, leaving the queue empty.
    ///
    /// Messages recorded after this returns belong to the next drain.
    #[must_use]
    pub fn take_queue(&self) -> Vec<DiagnosticMessage> {
        std::mem::take(&mut self.lock().queue)
    }

    /// Drop every queued message without emitting it.
    pub fn clear_queue(&self) {
        self.lock().queue.clear();
    }
}

impl Default for DiagnosticLog {
    fn default() -> Self {
        Self::headless()
    }
}

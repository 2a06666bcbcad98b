//! Event sink: the monthly-log line formatter and the scope-guard phase
//! timer, together the sole channel through which archival activity is
//! reported to operators and to whatever UI chooses to subscribe.

use std::time::Instant;

use chrono::Local;
use log::{debug, error, info};

/// Destination for archival events, decoupled from the concrete logging
/// backend so a GUI (or any other subscriber) can be layered on without
/// this crate depending on it.
pub trait EventSink {
    fn processed(&self, name: &str, location: &str, process: &str, reference: &str);
    fn error(&self, name: &str, reason: &str, reference: &str);

    /// A phase boundary. Only called when the configuration's `log_phases`
    /// option is enabled. `elapsed_ms` is `None` on phase start.
    fn phase(&self, _label: &str, _elapsed_ms: Option<u64>) {}
}

/// An [`EventSink`] that only forwards to the `log` facade, taking no
/// other action. The default sink when no UI is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn processed(&self, name: &str, location: &str, process: &str, reference: &str) {
        info!("{}", processed_line(name, location, process, reference));
    }

    fn error(&self, name: &str, reason: &str, reference: &str) {
        error!("{}", error_line(name, reason, reference));
    }

    fn phase(&self, label: &str, elapsed_ms: Option<u64>) {
        match elapsed_ms {
            None => debug!("phase '{label}' started"),
            Some(ms) => debug!("phase '{label}' finished in {ms} ms"),
        }
    }
}

fn timestamp() -> String {
    Local::now().format("%d.%b.%Y # %H:%M:%S").to_string()
}

/// Formats a successful-processing monthly-log line:
/// `DD.Mon.YYYY # HH:MM:SS # name  # location  # process  # ref`.
pub fn processed_line(name: &str, location: &str, process: &str, reference: &str) -> String {
    format!(
        "{} # {} \t# {} \t# {} \t# {}",
        timestamp(),
        name,
        location,
        process,
        reference
    )
}

/// Formats an error monthly-log line:
/// `DD.Mon.YYYY # HH:MM:SS # name  # ERRORE  # reason  # ref`.
pub fn error_line(name: &str, reason: &str, reference: &str) -> String {
    format!(
        "{} # {} \t# ERRORE \t# {} \t# {}",
        timestamp(),
        name,
        reason,
        reference
    )
}

/// Scope guard that records a phase's start on acquisition and emits its
/// elapsed time to the [`EventSink`] on release, guaranteed on every exit
/// path including early returns and `?`-propagated errors. A no-op guard
/// (`sink = None`) is used when the configuration's `log_phases` option is
/// off, so the timing is never computed for nothing.
pub struct PhaseGuard<'a> {
    name: &'static str,
    started: Instant,
    sink: Option<&'a dyn EventSink>,
}

impl<'a> PhaseGuard<'a> {
    /// Starts a phase that always reports to the sink, regardless of
    /// `log_phases`. Used by callers that do not have a `log_phases` flag
    /// in scope (e.g. tests).
    pub fn start(name: &'static str) -> Self {
        Self::start_if(name, true, &LogSink)
    }

    /// Starts a phase, emitting `phase` events to `sink` only if `enabled`
    /// is true (the configuration's `log_phases` option).
    pub fn start_if(name: &'static str, enabled: bool, sink: &'a dyn EventSink) -> Self {
        let sink = enabled.then_some(sink);
        if let Some(sink) = sink {
            sink.phase(name, None);
        }
        PhaseGuard {
            name,
            started: Instant::now(),
            sink,
        }
    }
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        if let Some(sink) = self.sink {
            let elapsed_ms = self.started.elapsed().as_millis() as u64;
            sink.phase(self.name, Some(elapsed_ms));
        }
    }
}

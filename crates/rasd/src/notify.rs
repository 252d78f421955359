//! Terminal notifier: toasts go to stderr, confirmations to a prompt.

use std::time::Duration;

use rasd_core::{Notifier, Severity};

use crate::commands::util;
use crate::output;

pub struct TerminalNotifier {
    quiet: bool,
    yes: bool,
    color: bool,
}

impl TerminalNotifier {
    pub fn new(quiet: bool, yes: bool, color: bool) -> Self {
        Self { quiet, yes, color }
    }
}

impl Notifier for TerminalNotifier {
    fn toast(&self, message: &str, severity: Severity, _duration: Duration) {
        // Errors always show; the rest respect --quiet.
        if self.quiet && severity != Severity::Error {
            return;
        }
        eprintln!("{}", output::toast_line(message, severity, self.color));
    }

    fn confirm(&self, message: &str) -> bool {
        util::confirm(message, self.yes).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "confirmation prompt failed, treating as declined");
            false
        })
    }
}

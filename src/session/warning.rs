//! Time-warning policy: pure threshold math, no clock access.

use serde::{Deserialize, Serialize};

/// The two warning kinds, each fired at most once per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    First,
    Final,
}

/// Absolute second offsets at which warnings become due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarningSchedule {
    pub first_at_secs: u64,
    pub final_at_secs: u64,
}

/// Which warnings have already been delivered.
#[derive(Debug, Default, Clone, Copy)]
pub struct SentWarnings {
    pub first: bool,
    pub last: bool,
}

impl SentWarnings {
    pub fn mark(&mut self, kind: WarningKind) {
        match kind {
            WarningKind::First => self.first = true,
            WarningKind::Final => self.last = true,
        }
    }
}

/// Compute warning offsets via floor division. Percent validation
/// (`0 < first < final < 100`) happens at config construction, so a bad
/// pair never reaches a live session.
pub fn schedule(
    scheduled_duration_secs: u64,
    first_warning_percent: u8,
    final_warning_percent: u8,
) -> WarningSchedule {
    // Widened multiply: duration bounds come from config and are not
    // capped, so u64 arithmetic could overflow here.
    let at = |percent: u8| (scheduled_duration_secs as u128 * percent as u128 / 100) as u64;
    WarningSchedule {
        first_at_secs: at(first_warning_percent),
        final_at_secs: at(final_warning_percent),
    }
}

/// Warnings newly due at `elapsed_secs`, in threshold order. If one tick
/// observes both thresholds crossed (stalled tick task, clock jump),
/// both are returned in the same call, first then final.
pub fn due(sched: &WarningSchedule, sent: &SentWarnings, elapsed_secs: u64) -> Vec<WarningKind> {
    let mut out = Vec::new();
    if !sent.first && elapsed_secs >= sched.first_at_secs {
        out.push(WarningKind::First);
    }
    if !sent.last && elapsed_secs >= sched.final_at_secs {
        out.push(WarningKind::Final);
    }
    out
}

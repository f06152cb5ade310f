//! Client-side exam session: the countdown/violation state machine, the
//! crash-recovery draft store, and the HTTP client it submits through.

pub(crate) mod api;
pub(crate) mod cli;
pub(crate) mod controller;
pub(crate) mod draft;

pub(crate) const VIOLATION_DEBOUNCE_MS: i64 = 800;
pub(crate) const AUTOSAVE_INTERVAL_SECS: i64 = 5;
pub(crate) const MAX_VIOLATIONS: u32 = 3;
pub(crate) const MIN_REMAINING_AFTER_PENALTY_SECS: u64 = 15;

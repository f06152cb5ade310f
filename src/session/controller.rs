use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;
use time::{Duration, OffsetDateTime};

use crate::db::types::TestStatus;
use crate::schemas::submission::{AnswerIn, SubmissionCreate};
use crate::session::draft::{DraftStore, SessionDraft};
use crate::session::{
    AUTOSAVE_INTERVAL_SECS, MAX_VIOLATIONS, MIN_REMAINING_AFTER_PENALTY_SECS,
    VIOLATION_DEBOUNCE_MS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionPhase {
    NotStarted,
    Running,
    Submitting,
    Submitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ViolationChannel {
    VisibilityLoss,
    FullscreenExit,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ViolationOutcome {
    /// Debounced duplicate, or the session is not running.
    Ignored,
    Warned,
    TimeHalved { remaining_seconds: u64 },
    ForcedSubmit(SubmissionCreate),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum StartBlocked {
    #[error("this test is not currently accepting attempts")]
    TestInactive,
    #[error("the test window has not opened yet")]
    NotYetOpen,
    #[error("the test window has closed")]
    WindowClosed,
    #[error("the test has no time allotted")]
    InvalidDuration,
}

#[derive(Debug, Clone)]
pub(crate) struct SessionConfig {
    pub(crate) assignment_id: String,
    pub(crate) test_title: String,
    pub(crate) status: TestStatus,
    pub(crate) duration_minutes: i32,
    pub(crate) start_time: Option<OffsetDateTime>,
    pub(crate) end_time: Option<OffsetDateTime>,
}

#[derive(Debug, Clone)]
pub(crate) struct ExamQuestion {
    pub(crate) id: String,
    pub(crate) question_text: String,
    pub(crate) options: Vec<String>,
    pub(crate) marks: f64,
}

/// Drives one attempt from NotStarted to Submitted. All timing-sensitive
/// operations take `now` explicitly so the caller owns the clock.
pub(crate) struct ExamSessionController<S: DraftStore> {
    config: SessionConfig,
    questions: Vec<ExamQuestion>,
    answers: BTreeMap<String, Vec<String>>,
    current_idx: usize,
    remaining_seconds: u64,
    violation_count: u32,
    last_violation_at: Option<OffsetDateTime>,
    last_autosave_at: Option<OffsetDateTime>,
    phase: SessionPhase,
    auto_submitted: bool,
    store: S,
}

impl<S: DraftStore> ExamSessionController<S> {
    /// Builds a fresh session. Option order is shuffled once here and held
    /// stable for the rest of the session; question order is server-locked
    /// and kept as delivered. A well-formed draft for the same assignment
    /// resumes the previous answers, position, timer, and violation count.
    pub(crate) fn new(
        config: SessionConfig,
        mut questions: Vec<ExamQuestion>,
        store: S,
        rng: &mut impl Rng,
    ) -> Self {
        for question in &mut questions {
            question.options.shuffle(rng);
        }

        let mut controller = Self {
            remaining_seconds: config.duration_minutes.max(0) as u64 * 60,
            config,
            questions,
            answers: BTreeMap::new(),
            current_idx: 0,
            violation_count: 0,
            last_violation_at: None,
            last_autosave_at: None,
            phase: SessionPhase::NotStarted,
            auto_submitted: false,
            store,
        };
        controller.restore_draft();
        controller
    }

    fn restore_draft(&mut self) {
        let Some(draft) = self.store.load(&self.config.assignment_id) else {
            return;
        };
        if draft.assignment_id != self.config.assignment_id {
            return;
        }

        self.answers = draft.answers;
        self.current_idx = draft.current_idx.min(self.questions.len().saturating_sub(1));
        self.violation_count = draft.violation_count;
        if draft.remaining_seconds > 0 {
            self.remaining_seconds = draft.remaining_seconds;
        }
    }

    pub(crate) fn start(&mut self, now: OffsetDateTime) -> Result<(), StartBlocked> {
        if self.phase != SessionPhase::NotStarted {
            return Ok(());
        }

        if self.config.status != TestStatus::Active {
            return Err(StartBlocked::TestInactive);
        }
        if self.config.start_time.is_some_and(|start| now < start) {
            return Err(StartBlocked::NotYetOpen);
        }
        if self.config.end_time.is_some_and(|end| now > end) {
            return Err(StartBlocked::WindowClosed);
        }
        if self.config.duration_minutes <= 0 {
            return Err(StartBlocked::InvalidDuration);
        }

        self.phase = SessionPhase::Running;
        self.persist_draft();
        Ok(())
    }

    /// One-second countdown tick. Returns the submission payload when the
    /// timer reaches zero.
    pub(crate) fn tick(&mut self, now: OffsetDateTime) -> Option<SubmissionCreate> {
        if self.phase != SessionPhase::Running {
            return None;
        }

        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            return self.begin_submit(true);
        }

        self.maybe_autosave(now);
        None
    }

    /// Applies the shared three-strike policy. Both channels feed the same
    /// counter; events within the debounce window collapse into one.
    pub(crate) fn record_violation(
        &mut self,
        channel: ViolationChannel,
        now: OffsetDateTime,
    ) -> ViolationOutcome {
        if self.phase != SessionPhase::Running {
            return ViolationOutcome::Ignored;
        }
        if self
            .last_violation_at
            .is_some_and(|last| now - last < Duration::milliseconds(VIOLATION_DEBOUNCE_MS))
        {
            return ViolationOutcome::Ignored;
        }

        self.last_violation_at = Some(now);
        self.violation_count += 1;
        tracing::warn!(?channel, count = self.violation_count, "integrity violation");

        let outcome = match self.violation_count {
            n if n >= MAX_VIOLATIONS => match self.begin_submit(true) {
                Some(payload) => ViolationOutcome::ForcedSubmit(payload),
                None => ViolationOutcome::Ignored,
            },
            2 => {
                self.remaining_seconds =
                    (self.remaining_seconds / 2).max(MIN_REMAINING_AFTER_PENALTY_SECS);
                ViolationOutcome::TimeHalved { remaining_seconds: self.remaining_seconds }
            }
            _ => ViolationOutcome::Warned,
        };

        if self.phase == SessionPhase::Running {
            self.persist_draft();
        }
        outcome
    }

    /// Records a single-select answer, overwriting any prior choice for the
    /// question. Returns false once the session no longer accepts input.
    pub(crate) fn select_option(&mut self, question_id: &str, option: &str) -> bool {
        if self.phase != SessionPhase::Running {
            return false;
        }
        if !self.questions.iter().any(|q| q.id == question_id) {
            return false;
        }

        self.answers.insert(question_id.to_string(), vec![option.to_string()]);
        self.persist_draft();
        true
    }

    pub(crate) fn goto_question(&mut self, idx: usize) -> bool {
        if self.phase != SessionPhase::Running || idx >= self.questions.len() {
            return false;
        }
        self.current_idx = idx;
        self.persist_draft();
        true
    }

    /// Manual submit. Returns None when a submission is already in flight
    /// or the session is not running.
    pub(crate) fn request_submit(&mut self) -> Option<SubmissionCreate> {
        self.begin_submit(false)
    }

    fn begin_submit(&mut self, auto: bool) -> Option<SubmissionCreate> {
        if self.phase != SessionPhase::Running {
            return None;
        }

        self.phase = SessionPhase::Submitting;
        self.auto_submitted = auto;

        let answers = self
            .questions
            .iter()
            .filter_map(|question| {
                self.answers.get(&question.id).map(|selected| AnswerIn {
                    question: question.id.clone(),
                    selected_options: selected.clone(),
                })
            })
            .collect();

        Some(SubmissionCreate {
            assignment_id: self.config.assignment_id.clone(),
            answers,
            auto_submitted: auto,
        })
    }

    /// Server confirmed the submission: the draft is finally discarded.
    pub(crate) fn submission_accepted(&mut self) {
        self.phase = SessionPhase::Submitted;
        self.store.remove(&self.config.assignment_id);
    }

    /// Server rejected the submission. A duplicate rejection is terminal;
    /// anything else releases the single-flight guard for a retry.
    pub(crate) fn submission_failed(&mut self, terminal: bool) {
        if self.phase != SessionPhase::Submitting {
            return;
        }
        self.phase = if terminal { SessionPhase::Submitted } else { SessionPhase::Running };
    }

    fn maybe_autosave(&mut self, now: OffsetDateTime) {
        let due = match self.last_autosave_at {
            None => true,
            Some(last) => now - last >= Duration::seconds(AUTOSAVE_INTERVAL_SECS),
        };
        if due {
            self.last_autosave_at = Some(now);
            self.persist_draft();
        }
    }

    fn persist_draft(&self) {
        let draft = SessionDraft {
            assignment_id: self.config.assignment_id.clone(),
            answers: self.answers.clone(),
            current_idx: self.current_idx,
            question_order: self.questions.iter().map(|q| q.id.clone()).collect(),
            remaining_seconds: self.remaining_seconds,
            violation_count: self.violation_count,
            saved_at: OffsetDateTime::now_utc().unix_timestamp(),
        };
        self.store.save(&draft);
    }

    pub(crate) fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub(crate) fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    pub(crate) fn violation_count(&self) -> u32 {
        self.violation_count
    }

    pub(crate) fn current_idx(&self) -> usize {
        self.current_idx
    }

    pub(crate) fn questions(&self) -> &[ExamQuestion] {
        &self.questions
    }

    pub(crate) fn selected_option(&self, question_id: &str) -> Option<&str> {
        self.answers.get(question_id).and_then(|s| s.first()).map(String::as_str)
    }

    pub(crate) fn test_title(&self) -> &str {
        &self.config.test_title
    }

    /// Context-menu, clipboard, and selection suppression stays on while
    /// the attempt is live.
    pub(crate) fn input_hardening_active(&self) -> bool {
        matches!(self.phase, SessionPhase::Running | SessionPhase::Submitting)
    }

    /// The leave-page confirmation is armed only while answers could be lost.
    pub(crate) fn unload_guard_active(&self) -> bool {
        self.phase == SessionPhase::Running
    }
}

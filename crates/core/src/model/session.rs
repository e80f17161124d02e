use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::classify::ExchangeClassification;
use crate::model::{SessionId, UserId};

/// Subject label given to sessions opened from the chat tutor.
pub const DEFAULT_SUBJECT: &str = "math";

/// Points added to a session (and the user's total) for each solved problem.
pub const POINTS_PER_SOLVE: u32 = 10;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LearningSessionError {
    #[error("end_time is before start_time")]
    InvalidTimeRange,

    #[error("problems solved ({solved}) exceeds problems attempted ({attempted})")]
    SolvedExceedsAttempted { attempted: u32, solved: u32 },

    #[error("subject is required")]
    EmptySubject,
}

//
// ─── COUNTER DELTA ────────────────────────────────────────────────────────────
//

/// Additive change to session counters produced by one classified exchange.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CounterDelta {
    pub attempted: u32,
    pub solved: u32,
    pub hints: u32,
    pub score: u32,
}

impl CounterDelta {
    /// Only exchanges the tutor recognised as correct count as attempts.
    #[must_use]
    pub fn from_classification(classification: ExchangeClassification) -> Self {
        let solved = u32::from(classification.answer_correct);
        Self {
            attempted: solved,
            solved,
            hints: u32::from(classification.hint_requested),
            score: solved * POINTS_PER_SOLVE,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

//
// ─── LEARNING SESSION ─────────────────────────────────────────────────────────
//

/// A run of tutoring exchanges attributed to one user.
///
/// A session is "open" while `end_time` is unset. Counters only ever grow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LearningSession {
    id: SessionId,
    user_id: UserId,
    subject: String,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    problems_attempted: u32,
    problems_solved: u32,
    hints_used: u32,
    score: u32,
    created_at: DateTime<Utc>,
}

impl LearningSession {
    /// Rehydrate a session from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `LearningSessionError` if the time range or counters are inconsistent.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: SessionId,
        user_id: UserId,
        subject: String,
        start_time: DateTime<Utc>,
        end_time: Option<DateTime<Utc>>,
        problems_attempted: u32,
        problems_solved: u32,
        hints_used: u32,
        score: u32,
        created_at: DateTime<Utc>,
    ) -> Result<Self, LearningSessionError> {
        if subject.trim().is_empty() {
            return Err(LearningSessionError::EmptySubject);
        }
        if end_time.is_some_and(|end| end < start_time) {
            return Err(LearningSessionError::InvalidTimeRange);
        }
        if problems_solved > problems_attempted {
            return Err(LearningSessionError::SolvedExceedsAttempted {
                attempted: problems_attempted,
                solved: problems_solved,
            });
        }

        Ok(Self {
            id,
            user_id,
            subject,
            start_time,
            end_time,
            problems_attempted,
            problems_solved,
            hints_used,
            score,
            created_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[must_use]
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    #[must_use]
    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    #[must_use]
    pub fn problems_attempted(&self) -> u32 {
        self.problems_attempted
    }

    #[must_use]
    pub fn problems_solved(&self) -> u32 {
        self.problems_solved
    }

    #[must_use]
    pub fn hints_used(&self) -> u32 {
        self.hints_used
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Add a delta to the counters, saturating at `u32::MAX`.
    pub fn apply_delta(&mut self, delta: CounterDelta) {
        self.problems_attempted = self.problems_attempted.saturating_add(delta.attempted);
        self.problems_solved = self.problems_solved.saturating_add(delta.solved);
        self.hints_used = self.hints_used.saturating_add(delta.hints);
        self.score = self.score.saturating_add(delta.score);
    }

    /// Close the session.
    ///
    /// # Errors
    ///
    /// Returns `LearningSessionError::InvalidTimeRange` if `at` precedes the start.
    pub fn end(&mut self, at: DateTime<Utc>) -> Result<(), LearningSessionError> {
        if at < self.start_time {
            return Err(LearningSessionError::InvalidTimeRange);
        }
        self.end_time = Some(at);
        Ok(())
    }

    /// Performance rating for the session.
    ///
    /// Rewards solved problems, scaled by the solve ratio and by a hint
    /// penalty that reaches zero at two hints per attempted problem.
    #[must_use]
    pub fn performance_score(&self) -> u32 {
        if self.problems_attempted == 0 {
            return 0;
        }
        let attempted = f64::from(self.problems_attempted);
        let solved = f64::from(self.problems_solved);
        let success_ratio = solved / attempted;
        let hint_penalty = (1.0 - f64::from(self.hints_used) / (attempted * 2.0)).max(0.0);
        let base = solved * 100.0;

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let score = (base * success_ratio * hint_penalty) as u32;
        score
    }
}

//
// ─── STATS ────────────────────────────────────────────────────────────────────
//

/// Totals across every session of a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SessionStats {
    pub total_problems_attempted: u32,
    pub total_problems_solved: u32,
    /// Percentage of attempted problems that were solved.
    pub accuracy: f64,
    pub average_hints_used: f64,
}

impl SessionStats {
    #[must_use]
    pub fn from_sessions(sessions: &[LearningSession]) -> Self {
        let mut attempted = 0_u32;
        let mut solved = 0_u32;
        let mut hints = 0_u32;
        for session in sessions {
            attempted = attempted.saturating_add(session.problems_attempted);
            solved = solved.saturating_add(session.problems_solved);
            hints = hints.saturating_add(session.hints_used);
        }

        if attempted == 0 {
            return Self::default();
        }

        Self {
            total_problems_attempted: attempted,
            total_problems_solved: solved,
            accuracy: f64::from(solved) / f64::from(attempted) * 100.0,
            average_hints_used: f64::from(hints) / f64::from(attempted),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn session(attempted: u32, solved: u32, hints: u32, score: u32) -> LearningSession {
        LearningSession::from_persisted(
            SessionId::new(1),
            UserId::new(1),
            DEFAULT_SUBJECT.into(),
            fixed_now(),
            None,
            attempted,
            solved,
            hints,
            score,
            fixed_now(),
        )
        .unwrap()
    }

    #[test]
    fn delta_counts_attempts_only_for_correct_answers() {
        let correct = CounterDelta::from_classification(ExchangeClassification {
            hint_requested: false,
            answer_correct: true,
        });
        assert_eq!(
            correct,
            CounterDelta {
                attempted: 1,
                solved: 1,
                hints: 0,
                score: POINTS_PER_SOLVE,
            }
        );

        let hint_only = CounterDelta::from_classification(ExchangeClassification {
            hint_requested: true,
            answer_correct: false,
        });
        assert_eq!(hint_only.attempted, 0);
        assert_eq!(hint_only.hints, 1);
        assert_eq!(hint_only.score, 0);
    }

    #[test]
    fn apply_delta_adds_to_counters() {
        let mut s = session(2, 1, 0, 10);
        s.apply_delta(CounterDelta {
            attempted: 1,
            solved: 1,
            hints: 0,
            score: 10,
        });
        assert_eq!(
            (s.problems_attempted(), s.problems_solved(), s.hints_used(), s.score()),
            (3, 2, 0, 20)
        );
    }

    #[test]
    fn rejects_solved_above_attempted() {
        let err = LearningSession::from_persisted(
            SessionId::new(1),
            UserId::new(1),
            DEFAULT_SUBJECT.into(),
            fixed_now(),
            None,
            1,
            2,
            0,
            0,
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            LearningSessionError::SolvedExceedsAttempted {
                attempted: 1,
                solved: 2
            }
        );
    }

    #[test]
    fn end_sets_end_time_and_rejects_earlier_instant() {
        let mut s = session(0, 0, 0, 0);
        assert!(s.end(fixed_now() - chrono::Duration::seconds(1)).is_err());
        assert!(s.is_open());
        s.end(fixed_now()).unwrap();
        assert!(!s.is_open());
    }

    #[test]
    fn performance_score_penalises_hints() {
        assert_eq!(session(0, 0, 0, 0).performance_score(), 0);
        assert_eq!(session(4, 4, 0, 0).performance_score(), 400);
        // ratio 0.5, penalty 1 - 2/8 = 0.75 → 200 * 0.5 * 0.75
        assert_eq!(session(4, 2, 2, 0).performance_score(), 75);
        assert_eq!(session(1, 1, 5, 0).performance_score(), 0);
    }

    #[test]
    fn stats_aggregate_over_sessions() {
        let stats = SessionStats::from_sessions(&[session(3, 2, 1, 20), session(1, 1, 3, 10)]);
        assert_eq!(stats.total_problems_attempted, 4);
        assert_eq!(stats.total_problems_solved, 3);
        assert!((stats.accuracy - 75.0).abs() < f64::EPSILON);
        assert!((stats.average_hints_used - 1.0).abs() < f64::EPSILON);
        assert_eq!(SessionStats::from_sessions(&[]), SessionStats::default());
    }
}

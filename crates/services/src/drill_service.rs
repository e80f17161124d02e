use std::sync::Arc;

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::Serialize;
use tutor_core::classify::feedback_is_correct;
use tutor_core::drill::{Drill, Subject, SubjectInfo};
use tutor_core::model::Language;
use tutor_core::prompt::{
    answer_evaluation_prompt, answer_evaluation_system_prompt, subject_chat_system_prompt,
};

use crate::completion::{CompletionClient, CompletionRequest};
use crate::error::DrillError;

/// Graded feedback on a drill answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerFeedback {
    pub correct: bool,
    pub feedback: String,
}

/// Subject catalog, random drills and LLM-graded answers.
#[derive(Clone)]
pub struct DrillService {
    completion: Arc<dyn CompletionClient>,
}

impl DrillService {
    #[must_use]
    pub fn new(completion: Arc<dyn CompletionClient>) -> Self {
        Self { completion }
    }

    /// Subject catalog with names and descriptions in `language`.
    #[must_use]
    pub fn subjects(&self, language: Language) -> Vec<SubjectInfo> {
        Subject::ALL
            .into_iter()
            .map(|subject| subject.info(language))
            .collect()
    }

    /// Pick a random drill for `subject`.
    ///
    /// # Errors
    ///
    /// Returns `DrillError::UnknownSubject` if `subject` is not in the catalog.
    pub fn next_drill(&self, subject: &str) -> Result<(Subject, Drill), DrillError> {
        self.next_drill_with(subject, &mut rand::rng())
    }

    /// Same as [`DrillService::next_drill`] with a caller-supplied RNG.
    ///
    /// # Errors
    ///
    /// Returns `DrillError::UnknownSubject` if `subject` is not in the catalog.
    pub fn next_drill_with<R: Rng + ?Sized>(
        &self,
        subject: &str,
        rng: &mut R,
    ) -> Result<(Subject, Drill), DrillError> {
        let subject: Subject = subject.parse()?;
        let drill = subject
            .drills()
            .choose(rng)
            .copied()
            .ok_or(DrillError::EmptyDrillBank(subject))?;
        Ok((subject, drill))
    }

    /// Ask the tutor model to grade `answer` for `drill`.
    ///
    /// # Errors
    ///
    /// Returns `DrillError::MissingField` for a blank subject, drill or answer,
    /// `DrillError::UnknownSubject` for an unknown subject and
    /// `DrillError::Completion` if grading fails.
    pub async fn validate_answer(
        &self,
        subject: &str,
        drill: &str,
        answer: &str,
        language: Language,
    ) -> Result<AnswerFeedback, DrillError> {
        let drill = require("drill", drill)?;
        let answer = require("answer", answer)?;
        let subject: Subject = require("subject", subject)?.parse()?;

        let feedback = self
            .completion
            .complete(CompletionRequest::single(
                answer_evaluation_system_prompt(subject, language),
                answer_evaluation_prompt(drill, answer),
            ))
            .await?;
        let correct = feedback_is_correct(&feedback);
        tracing::debug!(%subject, correct, "graded drill answer");

        Ok(AnswerFeedback { correct, feedback })
    }

    /// One-shot tutoring reply about `subject` and the drill on screen.
    ///
    /// # Errors
    ///
    /// Returns `DrillError::MissingField` for a blank subject or message,
    /// `DrillError::UnknownSubject` for an unknown subject and
    /// `DrillError::Completion` if the provider fails.
    pub async fn subject_chat(
        &self,
        subject: &str,
        drill: &str,
        message: &str,
        language: Language,
    ) -> Result<String, DrillError> {
        let message = require("message", message)?;
        let subject: Subject = require("subject", subject)?.parse()?;

        Ok(self
            .completion
            .complete(CompletionRequest::single(
                subject_chat_system_prompt(subject, drill.trim(), language),
                message,
            ))
            .await?)
    }
}

fn require<'a>(field: &'static str, value: &'a str) -> Result<&'a str, DrillError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DrillError::MissingField(field));
    }
    Ok(value)
}

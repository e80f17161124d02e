use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::UserId;

/// Display name used when a user has no usable username.
pub const FALLBACK_DISPLAY_NAME: &str = "Student";

const MAX_USERNAME_LEN: usize = 80;
const MAX_EMAIL_LEN: usize = 120;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UserError {
    #[error("username is required")]
    EmptyUsername,

    #[error("username is longer than {max} characters")]
    UsernameTooLong { max: usize },

    #[error("invalid email address")]
    InvalidEmail,

    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),
}

//
// ─── LANGUAGE ─────────────────────────────────────────────────────────────────
//

/// Language the tutor answers in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Fr,
    He,
}

impl Language {
    /// Two-letter code as stored and sent over the wire.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Fr => "fr",
            Language::He => "he",
        }
    }

    /// Instruction appended to tutor prompts so replies come back in this language.
    #[must_use]
    pub fn response_directive(self) -> &'static str {
        match self {
            Language::En => "Respond in English.",
            Language::Fr => "Répondez en français.",
            Language::He => "השב בעברית.",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = UserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "fr" => Ok(Language::Fr),
            "he" => Ok(Language::He),
            other => Err(UserError::UnsupportedLanguage(other.to_string())),
        }
    }
}

//
// ─── USER ─────────────────────────────────────────────────────────────────────
//

/// Unvalidated registration input.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub preferred_language: Language,
}

impl NewUser {
    /// Trim and validate the registration fields.
    ///
    /// # Errors
    ///
    /// Returns `UserError` if the username is blank or too long, or the email
    /// is not a plausible address.
    pub fn validate(self) -> Result<Self, UserError> {
        let username = self.username.trim().to_string();
        if username.is_empty() {
            return Err(UserError::EmptyUsername);
        }
        if username.chars().count() > MAX_USERNAME_LEN {
            return Err(UserError::UsernameTooLong {
                max: MAX_USERNAME_LEN,
            });
        }

        let email = self.email.trim().to_string();
        let plausible = email.len() <= MAX_EMAIL_LEN
            && email
                .split_once('@')
                .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
        if !plausible {
            return Err(UserError::InvalidEmail);
        }

        Ok(Self {
            username,
            email,
            preferred_language: self.preferred_language,
        })
    }
}

/// A registered student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    id: UserId,
    username: String,
    email: String,
    preferred_language: Language,
    total_score: u32,
    created_at: DateTime<Utc>,
}

impl User {
    /// Rehydrate a user from persisted storage.
    #[must_use]
    pub fn from_persisted(
        id: UserId,
        username: String,
        email: String,
        preferred_language: Language,
        total_score: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            username,
            email,
            preferred_language,
            total_score,
            created_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn preferred_language(&self) -> Language {
        self.preferred_language
    }

    #[must_use]
    pub fn total_score(&self) -> u32 {
        self.total_score
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn set_preferred_language(&mut self, language: Language) {
        self.preferred_language = language;
    }

    /// Add earned points to the cumulative score (saturating).
    pub fn add_score(&mut self, points: u32) {
        self.total_score = self.total_score.saturating_add(points);
    }

    /// Name the tutor addresses the student by.
    #[must_use]
    pub fn display_name(&self) -> &str {
        let trimmed = self.username.trim();
        if trimmed.is_empty() {
            FALLBACK_DISPLAY_NAME
        } else {
            trimmed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn draft(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.into(),
            email: email.into(),
            preferred_language: Language::En,
        }
    }

    #[test]
    fn validate_trims_fields() {
        let user = draft("  ada ", " ada@example.com ").validate().unwrap();
        assert_eq!(user.username, "ada");
        assert_eq!(user.email, "ada@example.com");
    }

    #[test]
    fn validate_rejects_blank_username_and_bad_email() {
        assert_eq!(
            draft("   ", "a@b.c").validate().unwrap_err(),
            UserError::EmptyUsername
        );
        assert_eq!(
            draft("ada", "not-an-email").validate().unwrap_err(),
            UserError::InvalidEmail
        );
        assert_eq!(
            draft("ada", "@example.com").validate().unwrap_err(),
            UserError::InvalidEmail
        );
    }

    #[test]
    fn language_parses_case_insensitively() {
        assert_eq!("HE".parse::<Language>().unwrap(), Language::He);
        assert!(matches!(
            "de".parse::<Language>(),
            Err(UserError::UnsupportedLanguage(_))
        ));
    }

    #[test]
    fn score_saturates_and_language_can_change() {
        let mut user = User::from_persisted(
            UserId::new(1),
            "ada".into(),
            "ada@example.com".into(),
            Language::En,
            u32::MAX - 5,
            fixed_now(),
        );
        user.add_score(10);
        assert_eq!(user.total_score(), u32::MAX);
        user.set_preferred_language(Language::Fr);
        assert_eq!(user.preferred_language(), Language::Fr);
    }

    #[test]
    fn display_name_falls_back_for_blank_username() {
        let user = User::from_persisted(
            UserId::new(1),
            "  ".into(),
            "x@y.z".into(),
            Language::En,
            0,
            fixed_now(),
        );
        assert_eq!(user.display_name(), FALLBACK_DISPLAY_NAME);
    }
}

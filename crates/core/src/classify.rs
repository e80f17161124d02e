//! Keyword heuristics that turn one tutoring exchange into progress signals.
//!
//! Matching is a plain case-insensitive substring test. There is no
//! tokenization or negation handling, so "not correct" still counts as
//! correct; correctness is read off the tutor's own wording.

use serde::Serialize;

/// Student phrases that count as asking for assistance.
pub const HINT_KEYWORDS: &[&str] = &["help", "hint"];

/// Tutor phrases that count as confirming a correct answer.
pub const CORRECT_KEYWORDS: &[&str] = &["correct", "well done", "great job"];

/// Phrases (in every supported language) that mark drill feedback as a pass.
pub const FEEDBACK_CORRECT_KEYWORDS: &[&str] =
    &["correct", "right", "exactement", "bravo", "נכון", "מצוין"];

/// Outcome of classifying a single student message and tutor reply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExchangeClassification {
    pub hint_requested: bool,
    pub answer_correct: bool,
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    let lowered = text.to_lowercase();
    keywords.iter().any(|k| lowered.contains(k))
}

#[must_use]
pub fn is_hint_request(message: &str) -> bool {
    contains_any(message, HINT_KEYWORDS)
}

#[must_use]
pub fn is_correct_reply(reply: &str) -> bool {
    contains_any(reply, CORRECT_KEYWORDS)
}

#[must_use]
pub fn feedback_is_correct(feedback: &str) -> bool {
    contains_any(feedback, FEEDBACK_CORRECT_KEYWORDS)
}

/// Classify the student's latest message against the tutor's reply.
#[must_use]
pub fn classify_exchange(message: &str, reply: &str) -> ExchangeClassification {
    ExchangeClassification {
        hint_requested: is_hint_request(message),
        answer_correct: is_correct_reply(reply),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn hint_request_is_case_insensitive() {
        assert!(is_hint_request("I need a HINT"));
        assert!(is_hint_request("Can you Help me?"));
        assert!(is_hint_request("helpful")); // substring match
        assert!(!is_hint_request("x = 4"));
    }

    #[test]
    fn correct_reply_keywords() {
        assert!(is_correct_reply("Correct! Why does that work?"));
        assert!(is_correct_reply("Well done, Ada."));
        assert!(is_correct_reply("GREAT JOB on that one"));
        assert!(!is_correct_reply("Let's look at the first step again."));
    }

    #[test]
    fn negated_praise_is_still_classified_correct() {
        // Known false positive of the substring heuristic.
        assert!(is_correct_reply("That's not correct"));
        assert!(is_correct_reply("Incorrect, try again"));
    }

    #[test]
    fn feedback_keywords_cover_all_languages() {
        assert!(feedback_is_correct("C'est exactement ça"));
        assert!(feedback_is_correct("Bravo !"));
        assert!(feedback_is_correct("נכון מאוד"));
        assert!(feedback_is_correct("That's right"));
        assert!(!feedback_is_correct("Try the division again"));
    }

    #[test]
    fn classify_combines_both_signals() {
        let c = classify_exchange("I need a hint", "Good question, what do you know?");
        assert_eq!(
            c,
            ExchangeClassification {
                hint_requested: true,
                answer_correct: false,
            }
        );
    }

    fn keyword_free(s: &str, keywords: &[&str]) -> bool {
        let lowered = s.to_lowercase();
        !keywords.iter().any(|k| lowered.contains(k))
    }

    proptest! {
        #[test]
        fn hint_keyword_anywhere_is_detected(
            prefix in "[a-zA-Z ,.?]{0,20}",
            suffix in "[a-zA-Z ,.?]{0,20}",
            idx in 0..HINT_KEYWORDS.len(),
            upper in any::<bool>(),
        ) {
            let kw = if upper { HINT_KEYWORDS[idx].to_uppercase() } else { HINT_KEYWORDS[idx].to_string() };
            let message = format!("{prefix}{kw}{suffix}");
            prop_assert!(is_hint_request(&message));
        }

        #[test]
        fn messages_without_hint_keywords_are_not_hint_requests(message in "[a-zA-Z0-9 ,.?=+]{0,40}") {
            prop_assume!(keyword_free(&message, HINT_KEYWORDS));
            prop_assert!(!is_hint_request(&message));
        }

        #[test]
        fn correct_keyword_anywhere_is_detected(
            prefix in "[a-zA-Z ,.!]{0,20}",
            suffix in "[a-zA-Z ,.!]{0,20}",
            idx in 0..CORRECT_KEYWORDS.len(),
            upper in any::<bool>(),
        ) {
            let kw = if upper { CORRECT_KEYWORDS[idx].to_uppercase() } else { CORRECT_KEYWORDS[idx].to_string() };
            let reply = format!("{prefix}{kw}{suffix}");
            prop_assert!(is_correct_reply(&reply));
        }

        #[test]
        fn replies_without_praise_are_not_correct(reply in "[a-zA-Z0-9 ,.!?]{0,40}") {
            prop_assume!(keyword_free(&reply, CORRECT_KEYWORDS));
            prop_assert!(!is_correct_reply(&reply));
        }
    }
}

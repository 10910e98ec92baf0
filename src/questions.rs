//! Static question bank for the quiz.
//!
//! Five fixed questions with four lettered options each, plus the
//! consolation message table indexed by final score. The bank is
//! read-only data; sessions reference questions by index only.

/// A single quiz question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    /// Position in the bank, 0-based.
    pub index: usize,
    /// Question text as shown to the player.
    pub text: &'static str,
    /// The four options, already carrying their `A)`..`D)` prefixes.
    pub options: [&'static str; 4],
    /// Correct option letter, one of A-D.
    pub correct: char,
}

/// Number of questions in a full game.
pub const QUESTION_COUNT: usize = 5;

static BANK: [Question; QUESTION_COUNT] = [
    Question {
        index: 0,
        text: "1. When was Python created?",
        options: ["A) 1991", "B) 2000", "C) 1989", "D) 2010"],
        correct: 'A',
    },
    Question {
        index: 1,
        text: "2. When was C++ released?",
        options: ["A) 1985", "B) 1990", "C) 2000", "D) 2010"],
        correct: 'A',
    },
    Question {
        index: 2,
        text: "3. What is HTML?",
        options: [
            "A) Programming Language",
            "B) Web Markup Language",
            "C) Web Browser",
            "D) Database",
        ],
        correct: 'B',
    },
    Question {
        index: 3,
        text: "4. What is TCP?",
        options: [
            "A) Connection-Based",
            "B) Connectionless",
            "C) Fast",
            "D) Packaged",
        ],
        correct: 'A',
    },
    Question {
        index: 4,
        text: "5. What is Client-Server?",
        options: [
            "A) Data sharing on same computer",
            "B) Server-client relationship",
            "C) Network protocol",
            "D) Internet service provider",
        ],
        correct: 'B',
    },
];

/// Consolation/reward messages indexed by final score; entry 5 is the
/// flourish appended to the victory message.
static REWARD_MESSAGES: [&str; QUESTION_COUNT + 1] = [
    "Loading the Lynch...",
    "The important thing is to join",
    "Two is greater than one",
    "It wasn't easy getting here",
    "You know your stuff!",
    "You're amazing!",
];

/// Look up a question by index.
pub fn get(index: usize) -> Option<&'static Question> {
    BANK.get(index)
}

/// The whole bank, in order.
pub fn all() -> &'static [Question] {
    &BANK
}

/// Message for a session that ended with the given score.
///
/// Scores above the bank size clamp to the top entry.
pub fn reward_message(score: usize) -> &'static str {
    REWARD_MESSAGES[score.min(QUESTION_COUNT)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank_shape() {
        assert_eq!(all().len(), QUESTION_COUNT);
        for (i, question) in all().iter().enumerate() {
            assert_eq!(question.index, i);
            assert!(matches!(question.correct, 'A'..='D'));
            assert_eq!(question.options.len(), 4);
        }
    }

    #[test]
    fn test_lookup() {
        assert_eq!(get(0).unwrap().correct, 'A');
        assert_eq!(get(2).unwrap().correct, 'B');
        assert!(get(QUESTION_COUNT).is_none());
    }

    #[test]
    fn test_reward_message_clamps() {
        assert_eq!(reward_message(0), "Loading the Lynch...");
        assert_eq!(reward_message(5), "You're amazing!");
        assert_eq!(reward_message(99), "You're amazing!");
    }
}

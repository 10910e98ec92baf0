//! Lifeline engine: pure hint computations.
//!
//! Implements the two hint kinds served by the lifeline tier:
//! - Audience poll: a curated percentage distribution per question
//! - 50:50: the correct option plus one random wrong option
//!
//! No IO here; both the lifeline service and the game host's local
//! fallback path call into this module.

use rand::Rng;

/// The option letters, in wire order.
pub const OPTION_LETTERS: [char; 4] = ['A', 'B', 'C', 'D'];

/// The fixed lifeline list advertised to clients.
pub const AVAILABLE_JOKERS: &str = "Ask the Audience (S), 50:50 (Y)";

/// Audience poll percentages for options A-D of the given question.
///
/// Indices 0-4 map to curated distributions; anything else gets a
/// uniform split. Every row sums to 100.
pub fn audience_distribution(question_index: usize) -> [u32; 4] {
    match question_index {
        0 => [40, 25, 30, 5],
        1 => [45, 35, 15, 5],
        2 => [10, 60, 25, 5],
        3 => [55, 20, 15, 10],
        4 => [15, 65, 10, 10],
        _ => [25, 25, 25, 25],
    }
}

/// Render a distribution in wire form: `A:40%,B:25%,C:30%,D:5%`.
pub fn format_distribution(dist: &[u32; 4]) -> String {
    let parts: Vec<String> = OPTION_LETTERS
        .iter()
        .zip(dist.iter())
        .map(|(letter, pct)| format!("{}:{}%", letter, pct))
        .collect();
    parts.join(",")
}

/// Pick the two options left standing after a 50:50.
///
/// Always the correct letter plus one wrong letter drawn uniformly from
/// the remaining three, by reject-and-resample.
pub fn fifty_fifty(correct: char, rng: &mut impl Rng) -> [char; 2] {
    let second = loop {
        let candidate = OPTION_LETTERS[rng.random_range(0..OPTION_LETTERS.len())];
        if candidate != correct {
            break candidate;
        }
    };
    [correct, second]
}

//! Repeat-avoiding choice among cached responses

use rand::seq::SliceRandom;
use rand::Rng;

/// Picks a response uniformly at random, skipping the one served last
///
/// Falls back to the whole slice when every candidate equals `last`.
/// Returns `None` only for an empty slice.
pub fn select_response<'a, R>(
    responses: &'a [String],
    last: Option<&str>,
    rng: &mut R,
) -> Option<&'a String>
where
    R: Rng + ?Sized,
{
    let candidates: Vec<&String> = responses
        .iter()
        .filter(|r| Some(r.as_str()) != last)
        .collect();

    if candidates.is_empty() {
        return responses.choose(rng);
    }

    candidates.choose(rng).copied()
}

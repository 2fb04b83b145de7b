//! Post-processing applied to generated text.
//!
//! Tokens are approximated as characters everywhere in this crate, so
//! `max_tokens` clips characters, not words.

use std::collections::HashMap;

use rand::Rng;

use crate::chat::request::AssemblyParams;

/// Run every transform in its fixed order: clip, stop sequences, frequency
/// penalty, presence penalty.
pub fn apply_all<R: Rng>(content: &str, params: &AssemblyParams<'_>, rng: &mut R) -> String {
    let clipped = clip_to_max_tokens(content, params.max_tokens);
    let stopped = apply_stop_sequences(&clipped, params.stop);
    let penalized = apply_frequency_penalty(&stopped, params.frequency_penalty, rng);
    apply_presence_penalty(&penalized, params.presence_penalty)
}

pub fn clip_to_max_tokens(content: &str, max_tokens: Option<u32>) -> String {
    match max_tokens {
        Some(max) => content.chars().take(max as usize).collect(),
        None => content.to_string(),
    }
}

/// Cut at the earliest stop sequence found in `content`.
pub fn apply_stop_sequences(content: &str, stop: &[String]) -> String {
    stop.iter()
        .filter(|s| !s.is_empty())
        .filter_map(|s| content.find(s.as_str()))
        .min()
        .map(|end| content[..end].to_string())
        .unwrap_or_else(|| content.to_string())
}

fn penalty_applies(content: &str, penalty: f64) -> bool {
    !content.is_empty() && penalty.is_finite() && (-2.0..=2.0).contains(&penalty) && penalty > 0.0
}

/// Randomly drop repeated words. The n-th repeat of a word (case-insensitive)
/// is dropped with probability `penalty * n`, clamped to [0, 1].
pub fn apply_frequency_penalty<R: Rng>(content: &str, penalty: f64, rng: &mut R) -> String {
    if !penalty_applies(content, penalty) {
        return content.to_string();
    }

    let mut seen: HashMap<String, u32> = HashMap::new();
    content
        .split_whitespace()
        .filter(|word| {
            let count = seen.entry(word.to_lowercase()).or_insert(0);
            *count += 1;
            if *count == 1 {
                return true;
            }
            let drop = (penalty * f64::from(*count - 1)).clamp(0.0, 1.0);
            !rng.gen_bool(drop)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Drop every occurrence of any word that appears more than once.
pub fn apply_presence_penalty(content: &str, penalty: f64) -> String {
    if !penalty_applies(content, penalty) {
        return content.to_string();
    }

    let mut counts: HashMap<String, u32> = HashMap::new();
    for word in content.split_whitespace() {
        *counts.entry(word.to_lowercase()).or_insert(0) += 1;
    }
    content
        .split_whitespace()
        .filter(|word| counts.get(&word.to_lowercase()).copied().unwrap_or(0) == 1)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn stops(s: &[&str]) -> Vec<String> {
        s.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_earliest_stop_sequence_wins() {
        assert_eq!(
            apply_stop_sequences("hello world", &stops(&["world", "o w"])),
            "hell"
        );
    }

    #[test]
    fn test_stop_sequences_no_match_or_empty() {
        assert_eq!(apply_stop_sequences("hello world", &[]), "hello world");
        assert_eq!(apply_stop_sequences("hello world", &stops(&["xyz"])), "hello world");
        assert_eq!(apply_stop_sequences("hello world", &stops(&[""])), "hello world");
    }

    #[test]
    fn test_clip_counts_characters() {
        assert_eq!(clip_to_max_tokens("héllo wörld", Some(4)), "héll");
        assert_eq!(clip_to_max_tokens("short", Some(100)), "short");
        assert_eq!(clip_to_max_tokens("short", None), "short");
    }

    #[test]
    fn test_frequency_penalty_noop_cases() {
        let mut rng = StdRng::seed_from_u64(7);
        let text = "a  a a";
        assert_eq!(apply_frequency_penalty(text, 0.0, &mut rng), text);
        assert_eq!(apply_frequency_penalty(text, -1.5, &mut rng), text);
        assert_eq!(apply_frequency_penalty(text, 3.0, &mut rng), text);
        assert_eq!(apply_frequency_penalty(text, f64::NAN, &mut rng), text);
        assert_eq!(apply_frequency_penalty("", 1.0, &mut rng), "");
    }

    #[test]
    fn test_frequency_penalty_drops_certain_repeats() {
        // 1.0 * one prior occurrence is a certain drop
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            apply_frequency_penalty("the cat and The dog the end", 1.0, &mut rng),
            "the cat and dog end"
        );
    }

    #[test]
    fn test_frequency_penalty_keeps_first_occurrences() {
        let mut rng = StdRng::seed_from_u64(42);
        let out = apply_frequency_penalty("x y x y x y z", 0.3, &mut rng);
        let words: Vec<&str> = out.split(' ').collect();
        assert_eq!(&words[..2], &["x", "y"]);
        assert_eq!(words.last(), Some(&"z"));
    }

    #[test]
    fn test_frequency_penalty_seeded_is_reproducible() {
        let text = "one two one two one two one two";
        let a = apply_frequency_penalty(text, 0.4, &mut StdRng::seed_from_u64(9));
        let b = apply_frequency_penalty(text, 0.4, &mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
    }

    #[test]
    fn test_presence_penalty_drops_all_occurrences() {
        assert_eq!(
            apply_presence_penalty("the cat saw The dog", 0.5),
            "cat saw dog"
        );
        assert_eq!(apply_presence_penalty("the cat saw the dog", 0.0), "the cat saw the dog");
        assert_eq!(apply_presence_penalty("unique  words   only", 1.0), "unique words only");
    }

    #[test]
    fn test_apply_all_order() {
        // clip happens before the stop sequence search
        let params = AssemblyParams {
            stop: &stops(&["world"]),
            max_tokens: Some(8),
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        };
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(apply_all("hello world", &params, &mut rng), "hello wo");
    }
}

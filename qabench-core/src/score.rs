//! Answer scoring: exact match and token-overlap F1.
//!
//! Both metrics compare normalized answer strings. Normalization lowercases,
//! strips punctuation, drops English articles, and collapses whitespace, so
//! "The Eiffel Tower." and "eiffel tower" compare equal.

use std::collections::HashMap;

/// Normalize an answer string for comparison.
pub fn normalize_answer(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_punctuation() { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .filter(|word| !matches!(*word, "a" | "an" | "the"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether the prediction exactly matches the gold answer after normalization.
pub fn exact_match_score(prediction: &str, gold: &str) -> bool {
    normalize_answer(prediction) == normalize_answer(gold)
}

/// Token-overlap F1 between prediction and gold answer.
///
/// Tokens are whitespace-split normalized words, counted as multisets.
/// If either side normalizes to nothing, the score is 1.0 when both are
/// empty and 0.0 otherwise.
pub fn f1_score(prediction: &str, gold: &str) -> f64 {
    let prediction = normalize_answer(prediction);
    let gold = normalize_answer(gold);

    let pred_tokens: Vec<&str> = prediction.split_whitespace().collect();
    let gold_tokens: Vec<&str> = gold.split_whitespace().collect();

    if pred_tokens.is_empty() || gold_tokens.is_empty() {
        return if pred_tokens.is_empty() && gold_tokens.is_empty() {
            1.0
        } else {
            0.0
        };
    }

    let mut gold_counts: HashMap<&str, usize> = HashMap::new();
    for token in &gold_tokens {
        *gold_counts.entry(token).or_insert(0) += 1;
    }

    let mut overlap = 0usize;
    for token in &pred_tokens {
        if let Some(count) = gold_counts.get_mut(token) {
            if *count > 0 {
                *count -= 1;
                overlap += 1;
            }
        }
    }

    if overlap == 0 {
        return 0.0;
    }

    let precision = overlap as f64 / pred_tokens.len() as f64;
    let recall = overlap as f64 / gold_tokens.len() as f64;
    2.0 * precision * recall / (precision + recall)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::lowercase("The Eiffel Tower", "eiffel tower")]
    #[case::punctuation("Paris, France.", "paris france")]
    #[case::articles("an answer to the question", "answer to question")]
    #[case::whitespace("  spaced   out  ", "spaced out")]
    #[case::empty("", "")]
    fn test_normalize(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_answer(input), expected);
    }

    #[rstest]
    #[case::identical("Paris", "Paris", true)]
    #[case::case_and_article("The Eiffel Tower.", "eiffel tower", true)]
    #[case::different("London", "Paris", false)]
    #[case::extra_words("Paris is the capital", "Paris", false)]
    fn test_exact_match(#[case] prediction: &str, #[case] gold: &str, #[case] expected: bool) {
        assert_eq!(exact_match_score(prediction, gold), expected);
    }

    #[rstest]
    #[case::perfect("yes", "yes", 1.0)]
    #[case::disjoint("red", "blue", 0.0)]
    #[case::both_empty("", "", 1.0)]
    #[case::pred_empty("", "Paris", 0.0)]
    #[case::gold_empty("Paris", "", 0.0)]
    fn test_f1_edges(#[case] prediction: &str, #[case] gold: &str, #[case] expected: f64) {
        assert_eq!(f1_score(prediction, gold), expected);
    }

    #[test]
    fn test_f1_partial_overlap() {
        // pred = {new, york, city}, gold = {new, york}; overlap 2
        // precision 2/3, recall 2/2, f1 = 2 * (2/3) / (5/3) = 0.8
        let f1 = f1_score("New York City", "New York");
        assert!((f1 - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_f1_respects_token_counts() {
        // Repeated prediction tokens only match as many gold occurrences
        // as exist: overlap is 1, not 3.
        let f1 = f1_score("yes yes yes", "yes");
        let precision = 1.0 / 3.0;
        let recall = 1.0;
        let expected = 2.0 * precision * recall / (precision + recall);
        assert!((f1 - expected).abs() < 1e-9);
    }

    #[test]
    fn test_error_answer_scores_zero() {
        // Synthesized error answers score against the gold like any other
        // string; they just never match.
        assert_eq!(f1_score("Error: connection refused", "Paris"), 0.0);
        assert!(!exact_match_score("Error: connection refused", "Paris"));
    }
}

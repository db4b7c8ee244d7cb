//! Property-based tests for tokenization and value matching

use super::tokenizer::is_breaking_char;
use super::*;
use proptest::prelude::*;

// ============================================================================
// Generators
// ============================================================================

fn arb_char() -> impl Strategy<Value = char> {
    prop_oneof![
        4 => proptest::char::range('a', 'z'),
        2 => proptest::char::range('A', 'Z'),
        2 => Just(' '),
        1 => prop::sample::select(vec!['!', ',', '.', '?', '\'', '-', '\u{2019}', '\u{201C}']),
        1 => prop::sample::select(vec!['é', 'ß', 'Ж', '中']),
        1 => prop::sample::select(vec!['😀', '👍', '🎉']),
    ]
}

fn arb_text() -> impl Strategy<Value = String> {
    proptest::collection::vec(arb_char(), 0..40).prop_map(|chars| chars.into_iter().collect())
}

fn strip_breaking(text: &str) -> String {
    text.chars()
        .filter(|c| !is_breaking_char(u32::from(*c)))
        .collect()
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_tokens_reconstruct_input(text in arb_text()) {
        let tokens = tokenize(&text, None);
        let joined: String = tokens.iter().map(|t| t.text.as_str()).collect();
        prop_assert_eq!(joined, strip_breaking(&text));
    }

    #[test]
    fn prop_spans_slice_original(text in arb_text()) {
        for token in tokenize(&text, None) {
            prop_assert_eq!(text.get(token.start..=token.end), Some(token.text.as_str()));
            prop_assert_eq!(token.normalized, token.text.to_lowercase());
        }
    }

    #[test]
    fn prop_tokens_ordered_and_disjoint(text in arb_text()) {
        let tokens = tokenize(&text, None);
        for pair in tokens.windows(2) {
            prop_assert!(pair[0].end < pair[1].start);
        }
        prop_assert!(tokens.len() <= text.chars().count());
    }

    #[test]
    fn prop_supplementary_chars_stand_alone(text in arb_text()) {
        for token in tokenize(&text, None) {
            if token.text.chars().any(|c| u32::from(c) > 0xFFFF) {
                prop_assert_eq!(token.text.chars().count(), 1);
            }
        }
    }

    #[test]
    fn prop_tokenize_is_deterministic(text in arb_text()) {
        prop_assert_eq!(tokenize(&text, None), tokenize(&text, Some("en-US")));
    }

    #[test]
    fn prop_found_values_never_overlap(
        utterance in "[a-c ]{0,30}",
        values in proptest::collection::vec("[a-c]{1,3}( [a-c]{1,3})?", 1..6),
    ) {
        let sorted: Vec<_> = values
            .iter()
            .enumerate()
            .map(|(i, v)| SortedValue::new(v.clone(), i))
            .collect();
        let found = find_values(&utterance, &sorted, &FindValuesOptions::default());

        let mut seen = std::collections::HashSet::new();
        for pair in found.windows(2) {
            prop_assert!(pair[0].end < pair[1].start);
        }
        for result in &found {
            prop_assert!(seen.insert(result.resolution.index));
            prop_assert!(result.resolution.score > 0.0 && result.resolution.score <= 1.0);
            prop_assert_eq!(utterance.get(result.start..=result.end), Some(result.text.as_str()));
        }
    }
}

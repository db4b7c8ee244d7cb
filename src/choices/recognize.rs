//! Choice recognition with ordinal and number fallbacks

use super::find::{find_choices, FindChoicesOptions};
use super::tokenizer::Token;
use super::{Choice, FoundChoice, ModelResult};

const ORDINAL_WORDS: &[&str] = &[
    "first", "second", "third", "fourth", "fifth", "sixth", "seventh", "eighth", "ninth", "tenth",
];

const CARDINAL_WORDS: &[&str] = &[
    "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
];

/// Position reference found in the utterance
enum Position {
    Index(usize),
    Last,
}

/// Recognize which choice(s) the user picked.
///
/// Searches values, titles and synonyms first. When nothing matches, an
/// ordinal ("the second one", "3rd", "last") and then a plain number ("2",
/// "two") select a choice by its 1-based position.
pub fn recognize_choices(
    utterance: &str,
    choices: &[Choice],
    options: &FindChoicesOptions,
) -> Vec<ModelResult<FoundChoice>> {
    let mut matched = find_choices(utterance, choices, options);
    if !matched.is_empty() {
        return matched;
    }

    let tokens = options.values.tokenize(utterance);
    if options.recognize_ordinals {
        matched.extend(
            tokens
                .iter()
                .filter_map(|t| parse_ordinal(t).map(|p| (t, p)))
                .filter_map(|(t, p)| match_choice_by_position(utterance, choices, t, &p)),
        );
    }
    if matched.is_empty() && options.recognize_numbers {
        matched.extend(
            tokens
                .iter()
                .filter_map(|t| parse_number(t).map(|p| (t, p)))
                .filter_map(|(t, p)| match_choice_by_position(utterance, choices, t, &p)),
        );
    }

    matched.sort_by_key(|m| m.start);
    matched
}

fn parse_ordinal(token: &Token) -> Option<Position> {
    let word = token.normalized.as_str();
    if word == "last" {
        return Some(Position::Last);
    }
    if let Some(i) = ORDINAL_WORDS.iter().position(|w| *w == word) {
        return Some(Position::Index(i + 1));
    }
    ["st", "nd", "rd", "th"]
        .iter()
        .find_map(|suffix| word.strip_suffix(suffix))
        .filter(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
        .and_then(|digits| digits.parse().ok())
        .map(Position::Index)
}

fn parse_number(token: &Token) -> Option<Position> {
    let word = token.normalized.as_str();
    if let Some(i) = CARDINAL_WORDS.iter().position(|w| *w == word) {
        return Some(Position::Index(i + 1));
    }
    if word.chars().all(|c| c.is_ascii_digit()) {
        return word.parse().ok().map(Position::Index);
    }
    None
}

fn match_choice_by_position(
    utterance: &str,
    choices: &[Choice],
    token: &Token,
    position: &Position,
) -> Option<ModelResult<FoundChoice>> {
    let index = match position {
        Position::Index(n) => n.checked_sub(1)?,
        Position::Last => choices.len().checked_sub(1)?,
    };
    let choice = choices.get(index)?;
    Some(ModelResult {
        start: token.start,
        end: token.end,
        type_name: "choice",
        text: utterance
            .get(token.start..=token.end)
            .unwrap_or_default()
            .to_string(),
        resolution: FoundChoice {
            value: choice.value.clone(),
            index,
            score: 1.0,
            synonym: None,
        },
    })
}

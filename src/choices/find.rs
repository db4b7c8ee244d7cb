//! Token-level matching of values and choices within an utterance

use super::tokenizer::{tokenize, Token, TokenizerFn};
use super::{Choice, FoundChoice, FoundValue, ModelResult, SortedValue};
use std::collections::HashSet;

const DEFAULT_MAX_TOKEN_DISTANCE: usize = 2;

/// Options for [`find_values`]
#[derive(Debug, Clone, Copy)]
pub struct FindValuesOptions {
    /// Accept matches that cover only some of a value's tokens
    pub allow_partial_matches: bool,
    pub locale: Option<&'static str>,
    /// Maximum number of utterance tokens skipped between two matched tokens
    pub max_token_distance: usize,
    pub tokenizer: Option<TokenizerFn>,
}

impl Default for FindValuesOptions {
    fn default() -> Self {
        Self {
            allow_partial_matches: false,
            locale: None,
            max_token_distance: DEFAULT_MAX_TOKEN_DISTANCE,
            tokenizer: None,
        }
    }
}

impl FindValuesOptions {
    /// Tokenize with the configured tokenizer, or the default one
    pub(crate) fn tokenize(&self, text: &str) -> Vec<Token> {
        let tokenizer = self.tokenizer.unwrap_or(tokenize);
        tokenizer(text, self.locale)
    }
}

/// Options for [`find_choices`] and [`super::recognize_choices`]
#[derive(Debug, Clone, Copy)]
pub struct FindChoicesOptions {
    pub values: FindValuesOptions,
    /// Don't search a choice's value
    pub no_value: bool,
    /// Don't search a choice's action title
    pub no_action: bool,
    pub recognize_ordinals: bool,
    pub recognize_numbers: bool,
}

impl Default for FindChoicesOptions {
    fn default() -> Self {
        Self {
            values: FindValuesOptions::default(),
            no_value: false,
            no_action: false,
            recognize_ordinals: true,
            recognize_numbers: true,
        }
    }
}

/// Find every value mentioned in `utterance`.
///
/// Each value may match at most once and two matches never share an
/// utterance token; higher-scoring matches win. Results are ordered by
/// their position in the utterance.
pub fn find_values(
    utterance: &str,
    values: &[SortedValue],
    options: &FindValuesOptions,
) -> Vec<ModelResult<FoundValue>> {
    let tokens = options.tokenize(utterance);

    let mut matches = Vec::new();
    for entry in values {
        let searched = options.tokenize(entry.value.trim());
        let mut start_pos = 0;
        while start_pos < tokens.len() {
            match match_value(&tokens, options, entry, &searched, start_pos) {
                Some(found) => {
                    start_pos = found.end + 1;
                    matches.push(found);
                }
                None => break,
            }
        }
    }

    // Best matches first; the sort is stable so ties keep value order
    matches.sort_by(|a, b| b.resolution.score.total_cmp(&a.resolution.score));

    let mut results = Vec::new();
    let mut found_indexes = HashSet::new();
    let mut used_tokens = HashSet::new();
    for found in matches {
        if found_indexes.contains(&found.resolution.index)
            || (found.start..=found.end).any(|i| used_tokens.contains(&i))
        {
            continue;
        }
        found_indexes.insert(found.resolution.index);
        used_tokens.extend(found.start..=found.end);

        // Convert token positions into byte spans over the utterance
        let start = tokens[found.start].start;
        let end = tokens[found.end].end;
        results.push(ModelResult {
            start,
            end,
            type_name: found.type_name,
            text: utterance.get(start..=end).unwrap_or_default().to_string(),
            resolution: found.resolution,
        });
    }

    results.sort_by_key(|r| r.start);
    results
}

/// Find every choice mentioned in `utterance` by value, action title or
/// synonym.
pub fn find_choices(
    utterance: &str,
    choices: &[Choice],
    options: &FindChoicesOptions,
) -> Vec<ModelResult<FoundChoice>> {
    let mut synonyms = Vec::new();
    for (index, choice) in choices.iter().enumerate() {
        if !options.no_value {
            synonyms.push(SortedValue::new(&choice.value, index));
        }
        if let Some(action) = &choice.action {
            if !options.no_action {
                synonyms.push(SortedValue::new(&action.title, index));
            }
        }
        for synonym in &choice.synonyms {
            synonyms.push(SortedValue::new(synonym, index));
        }
    }

    find_values(utterance, &synonyms, &options.values)
        .into_iter()
        .map(|found| {
            let choice = &choices[found.resolution.index];
            ModelResult {
                start: found.start,
                end: found.end,
                type_name: "choice",
                text: found.text,
                resolution: FoundChoice {
                    value: choice.value.clone(),
                    index: found.resolution.index,
                    score: found.resolution.score,
                    synonym: Some(found.resolution.value),
                },
            }
        })
        .collect()
}

/// Match the tokens of one value in order, starting at `start_pos`.
///
/// The returned span is in token positions, not bytes.
fn match_value(
    source: &[Token],
    options: &FindValuesOptions,
    entry: &SortedValue,
    searched: &[Token],
    mut start_pos: usize,
) -> Option<ModelResult<FoundValue>> {
    let mut matched = 0usize;
    let mut total_deviation = 0usize;
    let mut span: Option<(usize, usize)> = None;

    for token in searched {
        let Some(pos) = index_of_token(source, token, start_pos) else {
            continue;
        };
        let distance = if matched > 0 { pos - start_pos } else { 0 };
        if distance <= options.max_token_distance {
            matched += 1;
            total_deviation += distance;
            start_pos = pos + 1;
            span = Some(span.map_or((pos, pos), |(start, _)| (start, pos)));
        }
    }

    let (start, end) = span?;
    if matched < searched.len() && !options.allow_partial_matches {
        return None;
    }

    #[allow(clippy::cast_precision_loss)]
    let score = {
        let completeness = matched as f64 / searched.len() as f64;
        let accuracy = matched as f64 / (matched + total_deviation) as f64;
        completeness * accuracy
    };

    Some(ModelResult {
        start,
        end,
        type_name: "value",
        text: String::new(),
        resolution: FoundValue {
            value: entry.value.clone(),
            index: entry.index,
            score,
        },
    })
}

fn index_of_token(tokens: &[Token], token: &Token, start_pos: usize) -> Option<usize> {
    tokens
        .iter()
        .enumerate()
        .skip(start_pos)
        .find(|(_, t)| t.normalized == token.normalized)
        .map(|(i, _)| i)
}

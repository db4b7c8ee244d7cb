//! Codepoint-aware tokenizer used for choice matching

/// Signature of a pluggable tokenizer
pub type TokenizerFn = fn(&str, Option<&str>) -> Vec<Token>;

/// A contiguous span of the original text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Byte offset of the first character
    pub start: usize,
    /// Byte offset of the last byte of the last character (inclusive)
    pub end: usize,
    pub text: String,
    pub normalized: String,
}

/// Split `text` into lowercase-normalized tokens.
///
/// Punctuation, symbols and whitespace separate tokens and are dropped.
/// Characters outside the Basic Multilingual Plane (emoji and friends)
/// always become their own token.
pub fn tokenize(text: &str, _locale: Option<&str>) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut open: Option<(usize, String)> = None;

    for (i, ch) in text.char_indices() {
        let code_point = u32::from(ch);
        if is_breaking_char(code_point) {
            flush(&mut tokens, open.take(), i);
        } else if code_point > 0xFFFF {
            flush(&mut tokens, open.take(), i);
            let text = ch.to_string();
            tokens.push(Token {
                start: i,
                end: i + ch.len_utf8() - 1,
                normalized: text.clone(),
                text,
            });
        } else if let Some((_, buf)) = open.as_mut() {
            buf.push(ch);
        } else {
            open = Some((i, ch.to_string()));
        }
    }
    flush(&mut tokens, open, text.len());

    tokens
}

/// Close an open token whose last character ends right before `next`
fn flush(tokens: &mut Vec<Token>, open: Option<(usize, String)>, next: usize) {
    if let Some((start, text)) = open {
        tokens.push(Token {
            start,
            end: next - 1,
            normalized: text.to_lowercase(),
            text,
        });
    }
}

/// True for code points that separate tokens
pub fn is_breaking_char(code_point: u32) -> bool {
    matches!(
        code_point,
        0x0000..=0x002F
            | 0x003A..=0x0040
            | 0x005B..=0x0060
            | 0x007B..=0x00BF
            | 0x02B9..=0x036F
            | 0x2000..=0x2BFF
            | 0x2E00..=0x2E7F
    )
}

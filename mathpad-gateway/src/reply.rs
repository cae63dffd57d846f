//! # Reply Parser
//!
//! Turns the model's free-text reply into result records.
//!
//! With structured output the reply is already strict JSON. Without it, models
//! tend to wrap the list in code fences and use Python-style literals
//! (`'single quotes'`, `True`), so the parser falls back to normalizing those
//! before giving up.

use crate::error::{parse_error, Result};
use crate::schema::SolveResultRecord;

/// Parse a model reply into a non-empty list of records.
pub fn parse_reply(text: &str) -> Result<Vec<SolveResultRecord>> {
    let body = strip_code_fences(text);
    if body.is_empty() {
        return Err(parse_error("model reply is empty"));
    }

    let records: Vec<SolveResultRecord> = match serde_json::from_str(body) {
        Ok(records) => records,
        Err(strict) => {
            tracing::debug!(error = %strict, "strict decode failed, normalizing quotes");
            let normalized = normalize_quotes(body);
            serde_json::from_str(&normalized).map_err(|e| {
                parse_error(format!("model reply is not a list of result records: {}", e))
                    .with_context("reply", preview(body, 120))
                    .set_source(e)
            })?
        }
    };

    if records.is_empty() {
        return Err(parse_error("model reply contains no result records"));
    }
    Ok(records)
}

/// Pull the body out of the first markdown code fence, if there is one.
///
/// Prose before the opening fence and after the closing one is dropped. An
/// unclosed fence runs to the end of the text.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(open) = trimmed.find("```") else {
        return trimmed;
    };
    let body = trimmed[open + 3..].trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    let body = match body.find("```") {
        Some(close) => &body[..close],
        None => body,
    };
    body.trim()
}

#[derive(Clone, Copy, PartialEq)]
enum Quote {
    None,
    Double,
    Single,
}

/// Rewrite Python-literal style text into JSON.
///
/// Single-quoted strings become double-quoted (inner `"` escaped, `\'`
/// unescaped). A `'` inside a single-quoted string only closes it when the
/// next non-space character is a delimiter, so apostrophes survive.
/// Bare `True`, `False` and `None` become `true`, `false` and `null`.
/// Double-quoted strings are copied untouched.
pub fn normalize_quotes(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 8);
    let mut state = Quote::None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match state {
            Quote::None => match c {
                '"' => {
                    out.push('"');
                    state = Quote::Double;
                }
                '\'' => {
                    out.push('"');
                    state = Quote::Single;
                }
                c if c.is_ascii_alphabetic() => {
                    let start = i;
                    while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                        i += 1;
                    }
                    let word: String = chars[start..i].iter().collect();
                    out.push_str(match word.as_str() {
                        "True" => "true",
                        "False" => "false",
                        "None" => "null",
                        other => other,
                    });
                    continue;
                }
                c => out.push(c),
            },
            Quote::Double => {
                out.push(c);
                if c == '\\' {
                    if let Some(&next) = chars.get(i + 1) {
                        out.push(next);
                        i += 1;
                    }
                } else if c == '"' {
                    state = Quote::None;
                }
            }
            Quote::Single => match c {
                '\\' => match chars.get(i + 1) {
                    Some('\'') => {
                        out.push('\'');
                        i += 1;
                    }
                    Some(&next) => {
                        out.push('\\');
                        out.push(next);
                        i += 1;
                    }
                    None => out.push_str("\\\\"),
                },
                '"' => out.push_str("\\\""),
                '\'' if closes_single(&chars, i + 1) => {
                    out.push('"');
                    state = Quote::None;
                }
                c => out.push(c),
            },
        }
        i += 1;
    }
    out
}

fn closes_single(chars: &[char], from: usize) -> bool {
    chars[from..]
        .iter()
        .find(|c| !c.is_whitespace())
        .map_or(true, |c| matches!(c, ',' | ':' | '}' | ']'))
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}…", cut)
    }
}

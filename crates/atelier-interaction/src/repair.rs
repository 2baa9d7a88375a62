//! Best-effort repair of almost-JSON.
//!
//! The rewriting service is supposed to answer with a JSON object but in
//! practice wraps it in code fences, annotates it with comments, or leaves
//! keys unquoted. Repair normalizes those specific defects; anything still
//! unparseable afterwards is a real error.

use once_cell::sync::Lazy;
use regex::Regex;

static UNQUOTED_KEY: Lazy<Regex> = Lazy::new(|| {
    // { key: ...  or  , key: ...
    Regex::new(r#"([{,]\s*)([A-Za-z_][A-Za-z0-9_]*)\s*:"#).expect("static regex")
});

static TRAILING_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#",\s*([}\]])"#).expect("static regex"));

/// Applies every repair step in order: fence removal, comment stripping,
/// unquoted-key quoting, trailing-comma removal.
pub fn repair_json(raw: &str) -> String {
    let text = strip_code_fences(raw);
    let text = strip_comments(&text);
    let text = UNQUOTED_KEY.replace_all(&text, "$1\"$2\":");
    TRAILING_COMMA.replace_all(&text, "$1").into_owned()
}

/// Unwraps a ```...``` or ```json ... ``` fence if one is present.
fn strip_code_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };

    // Drop an optional language tag on the fence line
    let rest = rest
        .split_once('\n')
        .map(|(_, body)| body)
        .unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim().to_string()
}

/// Removes `//` line comments and `/* */` block comments outside strings.
fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            _ => out.push(c),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn parses(text: &str) -> Value {
        serde_json::from_str(&repair_json(text)).unwrap()
    }

    #[test]
    fn test_valid_json_passes_through() {
        let value = parses(r#"{"prompt": "a fox", "hasComplaints": false}"#);
        assert_eq!(value["prompt"], "a fox");
    }

    #[test]
    fn test_strips_json_code_fence() {
        let value = parses("```json\n{\"prompt\": \"a fox\"}\n```");
        assert_eq!(value["prompt"], "a fox");
    }

    #[test]
    fn test_strips_line_and_block_comments() {
        let value = parses(
            "{\n// the refined prompt\n\"prompt\": \"a fox\", /* negative */ \"negativePrompt\": null\n}",
        );
        assert_eq!(value["prompt"], "a fox");
    }

    #[test]
    fn test_comment_markers_inside_strings_survive() {
        let value = parses(r#"{"prompt": "a sign reading https://example.com"}"#);
        assert_eq!(value["prompt"], "a sign reading https://example.com");
    }

    #[test]
    fn test_quotes_unquoted_keys() {
        let value = parses(r#"{prompt: "a fox", hasComplaints: true}"#);
        assert_eq!(value["prompt"], "a fox");
        assert_eq!(value["hasComplaints"], true);
    }

    #[test]
    fn test_removes_trailing_commas() {
        let value = parses(r#"{"prompt": "a fox",}"#);
        assert_eq!(value["prompt"], "a fox");
    }

    #[test]
    fn test_garbage_stays_unparseable() {
        let repaired = repair_json("sorry, I can't help with that");
        assert!(serde_json::from_str::<Value>(&repaired).is_err());
    }
}

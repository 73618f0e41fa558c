//! Secret redaction for diagnostic text written to logs.

use std::sync::LazyLock;

use regex::Regex;

static KEY_ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b((?:WB|OZON)_API_KEY(?:_[A-Z0-9]+)?)\s*=\s*[^\s;&]+")
        .expect("valid key assignment regex")
});

const REDACTED: &str = "[REDACTED]";

/// Replaces every occurrence of `secrets` in `text`, plus any
/// `WB_API_KEY_*=…` / `OZON_API_KEY*=…` assignment, with `[REDACTED]`.
///
/// Secrets shorter than four characters are ignored so that empty or
/// placeholder values do not blank out unrelated text.
#[must_use]
pub fn sanitize_for_logging(text: &str, secrets: &[&str]) -> String {
    let mut out = text.to_string();
    for secret in secrets {
        if secret.len() >= 4 {
            out = out.replace(secret, REDACTED);
        }
    }
    KEY_ASSIGNMENT
        .replace_all(&out, format!("$1={REDACTED}").as_str())
        .into_owned()
}

/// Shortens `text` to at most `max_chars` characters for log output.
#[must_use]
pub fn truncate_for_log(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_explicit_secrets() {
        let out = sanitize_for_logging("token abcd1234 rejected", &["abcd1234"]);
        assert_eq!(out, "token [REDACTED] rejected");
    }

    #[test]
    fn ignores_tiny_secrets() {
        let out = sanitize_for_logging("a b c", &["a", ""]);
        assert_eq!(out, "a b c");
    }

    #[test]
    fn redacts_env_assignments() {
        let out = sanitize_for_logging(
            "WB_API_KEY_COSMO=eyJhbGciOi OZON_API_KEY = 1111-2222 ok",
            &[],
        );
        assert_eq!(
            out,
            "WB_API_KEY_COSMO=[REDACTED] OZON_API_KEY=[REDACTED] ok"
        );
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_for_log("привет", 3), "при");
        assert_eq!(truncate_for_log("short", 10), "short");
    }
}

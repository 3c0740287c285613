use std::process::Output;

use tokio::process::Command;

/// Escape a string for embedding inside an AppleScript string literal.
/// Backslashes go first so the quote escapes are not doubled.
pub fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Quote a value as an AppleScript string literal.
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", escape_string(s))
}

/// Escape a string for use as a single POSIX shell word.
pub fn shell_escape(s: &str) -> String {
    if !s.is_empty()
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '/' || c == '.' || c == '-' || c == '_')
    {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', "'\\''"))
    }
}

/// True when osascript's stderr reports that the user dismissed the dialog
/// (error -128).
pub fn is_user_cancelled(stderr: &str) -> bool {
    stderr.contains("User canceled.") || stderr.contains("(-128)")
}

/// Run one AppleScript snippet through `osascript`.
pub async fn osascript(script: &str) -> std::io::Result<Output> {
    Command::new("osascript")
        .current_dir("/tmp")
        .args(["-e", script])
        .output()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_double_quotes() {
        assert_eq!(escape_string(r#"say "hi""#), r#"say \"hi\""#);
    }

    #[test]
    fn escapes_backslashes_before_quotes() {
        assert_eq!(escape_string(r#"a\"b"#), r#"a\\\"b"#);
    }

    #[test]
    fn leaves_single_quotes_alone() {
        assert_eq!(escape_string("it's"), "it's");
    }

    #[test]
    fn quoted_wraps_literal() {
        assert_eq!(quoted(r#"x"y"#), r#""x\"y""#);
    }

    #[test]
    fn shell_escape_plain_word_untouched() {
        assert_eq!(shell_escape("/usr/local/bin/venti"), "/usr/local/bin/venti");
    }

    #[test]
    fn shell_escape_wraps_spaces_and_quotes() {
        assert_eq!(shell_escape("a b"), "'a b'");
        assert_eq!(shell_escape("it's"), "'it'\\''s'");
        assert_eq!(shell_escape("$(rm -rf /)"), "'$(rm -rf /)'");
    }

    #[test]
    fn shell_escape_empty_is_quoted() {
        assert_eq!(shell_escape(""), "''");
    }

    #[test]
    fn detects_cancellation() {
        assert!(is_user_cancelled("execution error: User canceled. (-128)"));
        assert!(!is_user_cancelled("execution error: curl: (6) Could not resolve host (6)"));
        assert!(!is_user_cancelled("smc: key CH0C read -1280 bytes (1)"));
        assert!(is_user_cancelled("execution error: User canceled."));
    }
}

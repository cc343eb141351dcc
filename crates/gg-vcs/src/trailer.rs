use regex::Regex;
use std::sync::LazyLock;

static CHANGE_ID_TRAILER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)change-id:\s+(I[a-z0-9]+)").expect("change-id pattern compiles")
});

/// First `Change-Id:` trailer anywhere in a commit message.
pub fn extract_change_id(message: &str) -> Option<String> {
    CHANGE_ID_TRAILER
        .captures(message)
        .and_then(|caps| caps.get(1))
        .map(|id| id.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_trailer() {
        let message = "Fix the frobnicator\n\nLonger body.\n\nChange-Id: I0123456789abcdef0123456789abcdef01234567\n";
        assert_eq!(
            extract_change_id(message).as_deref(),
            Some("I0123456789abcdef0123456789abcdef01234567")
        );
    }

    #[test]
    fn test_trailer_is_case_insensitive() {
        let message = "subject\n\nCHANGE-ID: Ideadbeef\n";
        assert_eq!(extract_change_id(message).as_deref(), Some("Ideadbeef"));
    }

    #[test]
    fn test_first_trailer_wins() {
        let message = "subject\n\nChange-Id: Iaaaa\nChange-Id: Ibbbb\n";
        assert_eq!(extract_change_id(message).as_deref(), Some("Iaaaa"));
    }

    #[test]
    fn test_missing_trailer() {
        assert_eq!(extract_change_id("subject\n\nSigned-off-by: someone\n"), None);
        assert_eq!(extract_change_id("Change-Id: not-an-id"), None);
    }
}

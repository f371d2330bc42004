use once_cell::sync::Lazy;
use regex::Regex;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("valid regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Turn a human label ("Profile Picture!") into a field name ("profile_picture").
///
/// Lowercases, drops everything that is neither a word character nor
/// whitespace, and joins the remaining words with underscores. The output only
/// contains word characters, so cleaning twice gives the same result.
pub fn clean_label(label: &str) -> String {
    let lowered = label.trim().to_lowercase();
    let stripped = NON_WORD.replace_all(&lowered, "");
    WHITESPACE.replace_all(stripped.trim(), "_").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_label_examples() {
        assert_eq!(clean_label("Profile Picture!"), "profile_picture");
        assert_eq!(clean_label("profile_picture"), "profile_picture");
        assert_eq!(clean_label("First name"), "first_name");
        assert_eq!(clean_label("  Hire   date (UTC) "), "hire_date_utc");
        assert_eq!(clean_label("E-Mail"), "email");
        assert_eq!(clean_label("Straße"), "straße");
        assert_eq!(clean_label("!!!"), "");
    }

    #[test]
    fn test_clean_label_is_idempotent() {
        for raw in [
            "Profile Picture!",
            "  Weekly  Working Hours ",
            "Cost-center / Team",
            "ÉTAT civil",
            "already_clean",
            "tab\tseparated\nlines",
        ] {
            let once = clean_label(raw);
            assert_eq!(clean_label(&once), once, "not idempotent for {:?}", raw);
        }
    }

    #[test]
    fn test_clean_label_ignores_case_and_punctuation() {
        assert_eq!(clean_label("PROFILE picture"), clean_label("profile, picture."));
    }
}

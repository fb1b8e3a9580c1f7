//! Introduction question — fixed template, no oracle call.

use crate::questions::distinct::normalize_question;

/// Returns the opening question, greeting the candidate by name when known.
pub fn generate(candidate_name: Option<&str>) -> String {
    let name_part = match candidate_name {
        Some(name) if !name.trim().is_empty() => format!("Hi {}! ", name.trim()),
        _ => "Hi! ".to_string(),
    };
    normalize_question(&format!(
        "{name_part}Can you briefly introduce yourself and highlight your background, \
         strengths, and key experiences that make you a good fit for this role?"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greets_by_name() {
        let q = generate(Some("Ada"));
        assert!(q.starts_with("Hi Ada! "));
        assert!(q.ends_with('?'));
        assert!(!q.ends_with("??"));
    }

    #[test]
    fn test_anonymous_greeting_without_name() {
        let q = generate(None);
        assert!(q.starts_with("Hi! "));
    }

    #[test]
    fn test_blank_name_treated_as_missing() {
        assert_eq!(generate(Some("  ")), generate(None));
    }
}

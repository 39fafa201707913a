// src/services/quiz/normalizer.rs

/// Canonical form of an answer set: trimmed, upper-cased, empties dropped, sorted.
///
/// Two answer sets are equal iff their normalized forms are equal.
pub fn normalize_choices<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut cleaned: Vec<String> = raw
        .iter()
        .map(|item| item.as_ref().trim().to_uppercase())
        .filter(|item| !item.is_empty())
        .collect();
    cleaned.sort();
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_whitespace_and_order() {
        assert_eq!(normalize_choices(&[" c", "a ", "B"]), vec!["A", "B", "C"]);
    }

    #[test]
    fn drops_blank_tokens() {
        assert_eq!(normalize_choices(&["", "  ", "d"]), vec!["D"]);
        assert!(normalize_choices::<&str>(&[]).is_empty());
    }

    #[test]
    fn permutations_normalize_identically() {
        assert_eq!(
            normalize_choices(&["A", "B", "C"]),
            normalize_choices(&["c", "b", "a"])
        );
    }
}

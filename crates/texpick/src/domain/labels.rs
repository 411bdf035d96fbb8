//! Conversions between 1-based `Component N` labels and fragment indices.

use crate::domain::errors::DomainError;

/// Parse a single label such as `3` or `Component 3` into a 0-based index.
pub fn parse_label(label: &str) -> Result<usize, DomainError> {
    let trimmed = label.trim();
    let number = trimmed.split_whitespace().last().unwrap_or_default();
    match number.parse::<usize>() {
        Ok(value) if value >= 1 => Ok(value - 1),
        _ => Err(DomainError::InvalidLabel(trimmed.to_string())),
    }
}

/// Parse a comma separated list of labels, keeping the given order and duplicates.
pub fn parse_selection(input: &str) -> Result<Vec<usize>, DomainError> {
    input
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(parse_label)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_numbers_and_full_labels() {
        assert_eq!(parse_label("1"), Ok(0));
        assert_eq!(parse_label("Component 12"), Ok(11));
        assert_eq!(parse_label("  4 "), Ok(3));
    }

    #[test]
    fn rejects_zero_and_garbage() {
        assert_eq!(
            parse_label("0"),
            Err(DomainError::InvalidLabel("0".into()))
        );
        assert!(parse_label("Component").is_err());
        assert!(parse_label("").is_err());
    }

    #[test]
    fn selection_keeps_order_and_duplicates() {
        assert_eq!(parse_selection("3, 1,3"), Ok(vec![2, 0, 2]));
        assert_eq!(parse_selection(""), Ok(vec![]));
        assert!(parse_selection("1,x").is_err());
    }
}

use super::ProviderError;

const SCORE_LABELS: &[&str] = &["score", "risk", "rating"];

/// Pulls the risk integer out of free-text model output.
///
/// Preference order: a line holding only an integer, then a `score:`/`risk:`/`rating:` label,
/// then the first standalone integer within 0..=40, then the first standalone integer at all.
pub fn extract_score(text: &str) -> Result<u64, ProviderError> {
    if let Some(value) = text.lines().find_map(|line| digits_only(line.trim())) {
        return Ok(value);
    }

    if let Some(value) = labelled_score(text) {
        return Ok(value);
    }

    let numbers = standalone_numbers(text);
    if let Some(value) = numbers.iter().copied().find(|value| *value <= 40) {
        return Ok(value);
    }

    numbers
        .first()
        .copied()
        .ok_or_else(|| ProviderError::Malformed(text.to_string()))
}

fn digits_only(value: &str) -> Option<u64> {
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(saturating_parse(value))
}

fn saturating_parse(digits: &str) -> u64 {
    digits.parse::<u64>().unwrap_or(u64::MAX)
}

fn labelled_score(text: &str) -> Option<u64> {
    let lowered = text.to_ascii_lowercase();
    lowered.match_indices(':').find_map(|(colon, _)| {
        let before = &lowered[..colon];
        if !SCORE_LABELS.iter().any(|label| before.ends_with(label)) {
            return None;
        }

        let digits: String = lowered[colon + 1..]
            .trim_start()
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        (!digits.is_empty()).then(|| saturating_parse(&digits))
    })
}

/// Integers that form a whole word, as in `\b\d+\b`.
fn standalone_numbers(text: &str) -> Vec<u64> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter_map(digits_only)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_integer_line_wins() {
        assert_eq!(extract_score("12").expect("score"), 12);
        assert_eq!(
            extract_score("Risk: 30\n  7 \nReasoning follows").expect("score"),
            7
        );
    }

    #[test]
    fn labelled_score_is_next() {
        assert_eq!(
            extract_score("Two active liens. Risk Score: 18 given 2019 lapse").expect("score"),
            18
        );
        assert_eq!(extract_score("RATING:55 (high)").expect("score"), 55);
    }

    #[test]
    fn falls_back_to_first_in_range_number() {
        assert_eq!(
            extract_score("Across 2019 and 2021 there were 3 filings").expect("score"),
            3
        );
        assert_eq!(extract_score("about 2020 exposure").expect("score"), 2020);
    }

    #[test]
    fn digits_inside_words_are_ignored() {
        assert!(matches!(
            extract_score("form UCC1 lapsed, no number given"),
            Err(ProviderError::Malformed(_))
        ));
    }
}

use once_cell::sync::Lazy;
use regex::Regex;

static SCORE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[-+]?\d*\.?\d+")
        .expect("Invalid score regex")
});

/// Extract the first numeric token from noisy score text ("88%", "[9]", " 7.5 ").
///
/// Returns `None` for missing, blank or non-numeric input.
pub fn parse_score(text: Option<&str>) -> Option<f64> {
    let text = text?.trim();
    if text.is_empty() {
        return None;
    }

    SCORE_REGEX
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

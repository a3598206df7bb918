//! Normalisation of raw recognizer output into ticker symbols.

/// Uppercase `raw` and keep only ASCII letters and digits.
///
/// Returns `None` when nothing is left, e.g. for "$ -" or an empty reply.
pub fn parse_ticker(raw: &str) -> Option<String> {
    let ticker: String = raw
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if ticker.is_empty() { None } else { Some(ticker) }
}

/// The longest ticker among the whitespace-separated segments of `raw`.
///
/// Overlays often carry a price or a pair suffix next to the symbol; the
/// symbol is rendered largest, so the longest segment wins. Ties keep the
/// first segment.
pub fn longest_ticker(raw: &str) -> Option<String> {
    raw.split_whitespace()
        .filter_map(parse_ticker)
        .fold(None, |best: Option<String>, candidate| match best {
            Some(b) if b.len() >= candidate.len() => Some(b),
            _ => Some(candidate),
        })
}

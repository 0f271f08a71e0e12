//! Rejects bundle and accessory listings.

use regex_lite::Regex;

/// Matches listing titles that name a bundle, lot or accessory rather than a
/// single colorway.
///
/// A title is rejected when it contains any vocabulary word as a
/// case-sensitive substring, so `"Mixed Lot"` and `"Needle Set"` are rejected
/// while `"Merino Teal"` passes.
#[derive(Debug, Clone)]
pub struct LotFilter {
    pattern: Option<Regex>,
}

impl LotFilter {
    pub fn new<S: AsRef<str>>(vocabulary: &[S]) -> Result<Self, regex_lite::Error> {
        let alternatives: Vec<String> = vocabulary
            .iter()
            .map(|word| word.as_ref().trim())
            .filter(|word| !word.is_empty())
            .map(regex_lite::escape)
            .collect();

        if alternatives.is_empty() {
            return Ok(Self { pattern: None });
        }

        let pattern = Regex::new(&alternatives.join("|"))?;
        Ok(Self {
            pattern: Some(pattern),
        })
    }

    /// Whether `title` names a lot/bundle/accessory listing.
    pub fn is_lot(&self, title: &str) -> bool {
        self.pattern
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(title))
    }
}

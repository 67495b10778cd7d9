//! Query phrase tokenization.
//!
//! A phrase such as `"ต.บางนา อ.บางนา จ.กรุงเทพมหานคร"` is split on
//! whitespace and on Thai address-unit markers (`ต.`, `อำเภอ`, `จังหวัด`,
//! ...) into content tokens. The last four tokens become the
//! [`PatternSet`] that drives the per-field searches.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Number of positions in a [`PatternSet`].
pub const PATTERN_COUNT: usize = 4;

/// Text shown for an empty pattern position.
pub const PLACEHOLDER_TEXT: &str = "N/A";

/// Whitespace runs and Thai address-unit markers (abbreviated and full).
static DELIMITER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s+|ซ\.|ถ\.|ต\.|อ\.|จ\.|ซอย|ถนน|แขวง|เขต|ตำบล|อำเภอ|จังหวัด")
        .expect("valid regex")
});

/// One position of a [`PatternSet`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Pattern {
    /// A content token taken from the phrase.
    Token(String),
    /// No token at this position. Never matches anything.
    Placeholder,
}

impl Pattern {
    /// The token text, or `None` for the placeholder.
    #[must_use]
    pub fn as_token(&self) -> Option<&str> {
        match self {
            Self::Token(token) => Some(token),
            Self::Placeholder => None,
        }
    }

    /// Whether this position holds no token.
    #[must_use]
    pub const fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(token) => f.write_str(token),
            Self::Placeholder => f.write_str(PLACEHOLDER_TEXT),
        }
    }
}

/// Exactly [`PATTERN_COUNT`] patterns derived from one phrase, real
/// tokens first, placeholders after.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatternSet([Pattern; PATTERN_COUNT]);

impl PatternSet {
    /// All positions, including placeholders.
    #[must_use]
    pub const fn patterns(&self) -> &[Pattern; PATTERN_COUNT] {
        &self.0
    }

    /// The real tokens, in phrase order.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.0.iter().filter_map(Pattern::as_token)
    }

    /// Whether every position is a placeholder.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(Pattern::is_placeholder)
    }

    /// The real tokens joined by single spaces. This is the phrase used
    /// for the final full-address re-rank, so it never contains
    /// [`PLACEHOLDER_TEXT`].
    #[must_use]
    pub fn query_text(&self) -> String {
        self.tokens().collect::<Vec<_>>().join(" ")
    }
}

impl fmt::Display for PatternSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "[{}]", rendered.join(", "))
    }
}

/// Splits `phrase` into a [`PatternSet`].
///
/// Separators are dropped, only the last four content tokens are kept (in
/// their original order) and missing positions are filled with
/// [`Pattern::Placeholder`].
#[must_use]
pub fn tokenize(phrase: &str) -> PatternSet {
    let tokens: Vec<&str> = DELIMITER_RE
        .split(phrase)
        .filter(|segment| !segment.is_empty() && !DELIMITER_RE.is_match(segment))
        .collect();

    let skip = tokens.len().saturating_sub(PATTERN_COUNT);
    let mut kept = tokens[skip..]
        .iter()
        .map(|token| Pattern::Token((*token).to_string()));

    PatternSet(std::array::from_fn(|_| {
        kept.next().unwrap_or(Pattern::Placeholder)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(set: &PatternSet) -> Vec<&str> {
        set.tokens().collect()
    }

    #[test]
    fn separators_only_yield_four_placeholders() {
        for phrase in ["", "   ", "ต. อ. จ.", "ตำบล อำเภอ จังหวัด", "ซอย\tถนน\nแขวงเขต"] {
            let set = tokenize(phrase);
            assert!(set.is_empty(), "{phrase:?} produced {set}");
            assert_eq!(set.patterns().len(), PATTERN_COUNT);
        }
    }

    #[test]
    fn unit_words_split_attached_names() {
        let set = tokenize("ตำบลบางนา อำเภอพระโขนง");
        assert_eq!(
            set.patterns(),
            &[
                Pattern::Token("บางนา".to_string()),
                Pattern::Token("พระโขนง".to_string()),
                Pattern::Placeholder,
                Pattern::Placeholder,
            ]
        );
    }

    #[test]
    fn abbreviated_markers_split_tokens() {
        let set = tokenize("ต.บางนา อ.บางนา จ.กรุงเทพมหานคร 10260");
        assert_eq!(
            tokens(&set),
            ["บางนา", "บางนา", "กรุงเทพมหานคร", "10260"]
        );
    }

    #[test]
    fn street_and_lane_markers_split_tokens() {
        let set = tokenize("ซ.สุขุมวิท101 ถ.สุขุมวิท แขวงบางจาก");
        assert_eq!(tokens(&set), ["สุขุมวิท101", "สุขุมวิท", "บางจาก"]);
    }

    #[test]
    fn keeps_only_last_four_tokens_in_order() {
        let set = tokenize("one two three four five six");
        assert_eq!(tokens(&set), ["three", "four", "five", "six"]);
    }

    #[test]
    fn query_text_excludes_placeholders() {
        let set = tokenize("บางนา กรุงเทพ");
        assert_eq!(set.query_text(), "บางนา กรุงเทพ");
        assert!(
            !set.query_text()
                .split_whitespace()
                .any(|word| word == PLACEHOLDER_TEXT)
        );
        assert_eq!(set.to_string(), "[บางนา, กรุงเทพ, N/A, N/A]");
    }

    #[test]
    fn literal_placeholder_text_in_phrase_is_a_real_token() {
        let set = tokenize("N/A");
        assert_eq!(set.patterns()[0], Pattern::Token("N/A".to_string()));
        assert!(set.patterns()[1].is_placeholder());
    }
}

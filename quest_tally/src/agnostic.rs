//! Locale-agnostic string equivalence.
//!
//! Two strings are agnostically equal when they fold to the same key. The
//! fold removes diacritics and compatibility forms, and depending on the
//! [ComparisonConfig], case and every non-alphanumeric character. Hashing is
//! done on the folded key, so equal strings always share a hash.

use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Sensitivity of agnostic comparisons. Set once per tally run.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Default)]
pub struct ComparisonConfig {
    pub case_sensitive: bool,
    /// Whitespace and punctuation take part in comparisons.
    pub symbols_significant: bool,
}

impl ComparisonConfig {
    pub const DEFAULT: ComparisonConfig = ComparisonConfig {
        case_sensitive: false,
        symbols_significant: false,
    };
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct AgnosticComparer {
    config: ComparisonConfig,
}

impl AgnosticComparer {
    /// Case- and symbol-insensitive.
    pub const DEFAULT: AgnosticComparer = AgnosticComparer::new(ComparisonConfig::DEFAULT);
    pub const CASE_SENSITIVE: AgnosticComparer = AgnosticComparer::new(ComparisonConfig {
        case_sensitive: true,
        symbols_significant: false,
    });
    pub const SYMBOL_SENSITIVE: AgnosticComparer = AgnosticComparer::new(ComparisonConfig {
        case_sensitive: false,
        symbols_significant: true,
    });
    pub const STRICT: AgnosticComparer = AgnosticComparer::new(ComparisonConfig {
        case_sensitive: true,
        symbols_significant: true,
    });

    pub const fn new(config: ComparisonConfig) -> AgnosticComparer {
        AgnosticComparer { config }
    }

    /// One of the four precomputed comparers matching the config.
    pub fn for_config(config: ComparisonConfig) -> AgnosticComparer {
        match (config.case_sensitive, config.symbols_significant) {
            (false, false) => AgnosticComparer::DEFAULT,
            (true, false) => AgnosticComparer::CASE_SENSITIVE,
            (false, true) => AgnosticComparer::SYMBOL_SENSITIVE,
            (true, true) => AgnosticComparer::STRICT,
        }
    }

    pub fn config(&self) -> ComparisonConfig {
        self.config
    }

    /// The comparison key of a string.
    pub fn fold(&self, s: &str) -> String {
        let mut decomposed = String::with_capacity(s.len());
        for c in s.nfkd() {
            if is_combining_mark(c) {
                continue;
            }
            match fold_letter(c) {
                Some(replacement) => decomposed.push_str(replacement),
                None => decomposed.push(fold_punctuation(c)),
            }
        }
        let cased = if self.config.case_sensitive {
            decomposed
        } else {
            decomposed.to_lowercase()
        };
        let collapsed = collapse_whitespace(&cased);
        if self.config.symbols_significant {
            return collapsed;
        }
        let stripped: String = collapsed.chars().filter(|c| c.is_alphanumeric()).collect();
        // A string made only of symbols keeps them, otherwise "???" == "!!!".
        if stripped.is_empty() {
            collapsed
        } else {
            stripped
        }
    }

    pub fn equals(&self, a: &str, b: &str) -> bool {
        a == b || self.fold(a) == self.fold(b)
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        self.fold(a).cmp(&self.fold(b))
    }

    pub fn hash<H: Hasher>(&self, s: &str, state: &mut H) {
        self.fold(s).hash(state)
    }

    pub fn hash_str(&self, s: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(s, &mut hasher);
        hasher.finish()
    }
}

impl Default for AgnosticComparer {
    fn default() -> Self {
        AgnosticComparer::DEFAULT
    }
}

// Letters that have no canonical decomposition.
fn fold_letter(c: char) -> Option<&'static str> {
    let r = match c {
        'ß' => "ss",
        'æ' => "ae",
        'Æ' => "AE",
        'œ' => "oe",
        'Œ' => "OE",
        'ø' => "o",
        'Ø' => "O",
        'đ' => "d",
        'Đ' => "D",
        'ł' => "l",
        'Ł' => "L",
        'þ' => "th",
        'Þ' => "TH",
        _ => return None,
    };
    Some(r)
}

fn fold_punctuation(c: char) -> char {
    match c {
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' | '`' => '\'',
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => '"',
        '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}'
        | '\u{2212}' => '-',
        _ => c,
    }
}

pub(crate) fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<&str>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: [&str; 12] = [
        "Café au lait",
        "cafe au lait",
        "CAFE AU LAIT!",
        "café—au—lait",
        "Straße",
        "strasse",
        "Ｗｉｄｅ",
        "wide",
        "???",
        "!!!",
        "  spaced   out ",
        "spaced out",
    ];

    #[test]
    fn default_ignores_case_diacritics_and_symbols() {
        let cmp = AgnosticComparer::DEFAULT;
        assert!(cmp.equals("Café au lait", "CAFE AU LAIT!"));
        assert!(cmp.equals("café—au—lait", "cafe au lait"));
        assert!(cmp.equals("Straße", "strasse"));
        assert!(cmp.equals("Ｗｉｄｅ", "wide"));
        assert!(!cmp.equals("cafe", "coffee"));
    }

    #[test]
    fn symbol_only_strings_keep_their_symbols() {
        let cmp = AgnosticComparer::DEFAULT;
        assert!(!cmp.equals("???", "!!!"));
        assert!(cmp.equals("???", " ??? "));
    }

    #[test]
    fn case_sensitive_variant() {
        let cmp = AgnosticComparer::CASE_SENSITIVE;
        assert!(!cmp.equals("Apple", "apple"));
        assert!(cmp.equals("Apple!", "Apple"));
        assert!(cmp.equals("Ápple", "Apple"));
    }

    #[test]
    fn symbol_sensitive_variant() {
        let cmp = AgnosticComparer::SYMBOL_SENSITIVE;
        assert!(cmp.equals("Apple pie", "apple   PIE"));
        assert!(!cmp.equals("apple pie", "apple-pie"));
        assert!(cmp.equals("it’s", "it's"));
    }

    #[test]
    fn strict_variant_still_folds_diacritics() {
        let cmp = AgnosticComparer::STRICT;
        assert!(cmp.equals("Naïve", "Naive"));
        assert!(!cmp.equals("Naive", "naive"));
    }

    #[test]
    fn equal_strings_share_a_hash() {
        for cmp in [
            AgnosticComparer::DEFAULT,
            AgnosticComparer::CASE_SENSITIVE,
            AgnosticComparer::SYMBOL_SENSITIVE,
            AgnosticComparer::STRICT,
        ] {
            for a in SAMPLES {
                for b in SAMPLES {
                    if cmp.equals(a, b) {
                        assert_eq!(cmp.hash_str(a), cmp.hash_str(b), "{:?} / {:?}", a, b);
                    }
                }
            }
        }
    }

    #[test]
    fn compare_is_consistent_with_equals() {
        let cmp = AgnosticComparer::DEFAULT;
        assert_eq!(cmp.compare("Éclair", "eclair"), Ordering::Equal);
        assert_eq!(cmp.compare("apple", "banana"), Ordering::Less);
    }

    #[test]
    fn for_config_picks_precomputed_variant() {
        let config = ComparisonConfig {
            case_sensitive: true,
            symbols_significant: false,
        };
        assert_eq!(
            AgnosticComparer::for_config(config),
            AgnosticComparer::CASE_SENSITIVE
        );
        assert_eq!(
            AgnosticComparer::for_config(ComparisonConfig::default()),
            AgnosticComparer::DEFAULT
        );
    }
}

//! Maven-style version ordering
//!
//! Versions are split into numeric and qualifier items on `.`, `-`, `_`
//! and on digit/letter transitions. Numeric items compare numerically;
//! qualifiers compare by rank:
//! `alpha < beta < milestone < rc < snapshot < (release) < sp < other`.
//! Trailing zeros and release qualifiers (`final`, `ga`, `release`) are
//! insignificant, so `1.0`, `1.0.0` and `1.0.0.RELEASE` are equal.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Rank of the implicit release qualifier
const RELEASE_RANK: u8 = 5;

#[derive(Debug, Clone)]
enum Item {
    Number(u64),
    Qualifier { rank: u8, text: String },
}

impl Item {
    fn qualifier(text: &str) -> Self {
        let rank = match text {
            "alpha" | "a" => 0,
            "beta" | "b" => 1,
            "milestone" | "m" => 2,
            "rc" | "cr" => 3,
            "snapshot" => 4,
            "" | "ga" | "final" | "release" => RELEASE_RANK,
            "sp" => 6,
            _ => 7,
        };
        Item::Qualifier {
            rank,
            text: text.to_string(),
        }
    }

    fn release() -> Self {
        Item::Qualifier {
            rank: RELEASE_RANK,
            text: String::new(),
        }
    }

    fn is_release(&self) -> bool {
        matches!(self, Item::Qualifier { rank, .. } if *rank == RELEASE_RANK)
    }

    fn cmp_item(&self, other: &Item) -> Ordering {
        match (self, other) {
            (Item::Number(a), Item::Number(b)) => a.cmp(b),
            (Item::Number(_), Item::Qualifier { .. }) => Ordering::Greater,
            (Item::Qualifier { .. }, Item::Number(_)) => Ordering::Less,
            (
                Item::Qualifier { rank: ra, text: ta },
                Item::Qualifier { rank: rb, text: tb },
            ) => ra.cmp(rb).then_with(|| {
                if *ra == 7 {
                    ta.cmp(tb)
                } else {
                    Ordering::Equal
                }
            }),
        }
    }

    /// The item a shorter version is padded with when compared to `self`
    fn padding_for(&self) -> Item {
        match self {
            Item::Number(_) => Item::Number(0),
            Item::Qualifier { .. } => Item::release(),
        }
    }
}

/// A version with Maven ordering semantics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    raw: String,
    #[serde(skip)]
    items: Vec<Item>,
}

impl Version {
    /// Parses a version string. Returns None for blank input.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        Some(Self {
            raw: raw.to_string(),
            items: tokenize(raw),
        })
    }

    /// The version as written
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns true if the version carries a pre-release qualifier
    /// (alpha, beta, milestone, rc or snapshot)
    pub fn is_prerelease(&self) -> bool {
        self.items
            .iter()
            .any(|item| matches!(item, Item::Qualifier { rank, .. } if *rank < RELEASE_RANK))
    }
}

fn tokenize(raw: &str) -> Vec<Item> {
    let lower = raw.to_ascii_lowercase();
    let mut tokens: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_is_digit = false;

    for ch in lower.chars() {
        if ch == '.' || ch == '-' || ch == '_' {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            continue;
        }
        let is_digit = ch.is_ascii_digit();
        if !current.is_empty() && is_digit != current_is_digit {
            tokens.push(std::mem::take(&mut current));
        }
        current_is_digit = is_digit;
        current.push(ch);
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    let mut items: Vec<Item> = Vec::new();
    for token in tokens {
        match token.parse::<u64>() {
            Ok(n) => items.push(Item::Number(n)),
            Err(_) => {
                let item = Item::qualifier(&token);
                if item.is_release() {
                    continue;
                }
                // `1.0-alpha` and `1.0.0-alpha` compare equal
                while items.len() > 1 && matches!(items.last(), Some(Item::Number(0))) {
                    items.pop();
                }
                items.push(item);
            }
        }
    }

    while items.len() > 1 && matches!(items.last(), Some(Item::Number(0))) {
        items.pop();
    }
    items
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.items.len().max(other.items.len());
        for idx in 0..len {
            let ordering = match (self.items.get(idx), other.items.get(idx)) {
                (Some(a), Some(b)) => a.cmp_item(b),
                (Some(a), None) => a.cmp_item(&a.padding_for()),
                (None, Some(b)) => b.padding_for().cmp_item(b),
                (None, None) => Ordering::Equal,
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl std::hash::Hash for Version {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        for item in &self.items {
            match item {
                Item::Number(n) => n.hash(state),
                Item::Qualifier { rank, text } => {
                    rank.hash(state);
                    if *rank == 7 {
                        text.hash(state);
                    }
                }
            }
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl TryFrom<String> for Version {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Version::parse(&value).ok_or_else(|| "empty version".to_string())
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_numeric_ordering() {
        assert!(v("1.0.0") < v("2.0.0"));
        assert!(v("1.9.0") < v("1.10.0"));
        assert!(v("5.10.0") > v("5.9.3"));
        assert!(v("2.19.0") > v("2.17.2"));
    }

    #[test]
    fn test_trailing_zeros_are_insignificant() {
        assert_eq!(v("1.0"), v("1.0.0"));
        assert_eq!(v("1"), v("1.0.0"));
    }

    #[test]
    fn test_release_qualifiers_are_insignificant() {
        assert_eq!(v("5.0.0.RELEASE"), v("5.0.0"));
        assert_eq!(v("4.0.0.Final"), v("4.0"));
        assert_eq!(v("1.0-ga"), v("1.0"));
    }

    #[test]
    fn test_qualifier_ordering() {
        assert!(v("1.0-alpha1") < v("1.0-beta1"));
        assert!(v("1.0-beta1") < v("1.0-M1"));
        assert!(v("1.0-M1") < v("1.0-RC1"));
        assert!(v("1.0-RC1") < v("1.0-SNAPSHOT"));
        assert!(v("1.0-SNAPSHOT") < v("1.0"));
        assert!(v("1.0") < v("1.0-sp1"));
    }

    #[test]
    fn test_prerelease_before_next_patch() {
        assert!(v("1.0-alpha") < v("1.0.1"));
        assert_eq!(v("1.0-alpha"), v("1.0.0-alpha"));
        assert!(v("1.1-alpha") > v("1.0.5"));
    }

    #[test]
    fn test_qualifier_numbers() {
        assert!(v("2.0.0-M1") < v("2.0.0-M2"));
        assert!(v("3.0.0-RC1") < v("3.0.0-RC2"));
    }

    #[test]
    fn test_is_prerelease() {
        assert!(v("1.0-SNAPSHOT").is_prerelease());
        assert!(v("2.0.0-M1").is_prerelease());
        assert!(v("3.0.0-RC1").is_prerelease());
        assert!(!v("5.0.0.RELEASE").is_prerelease());
        assert!(!v("1.18.38").is_prerelease());
        assert!(!v("1.0-sp1").is_prerelease());
    }

    #[test]
    fn test_raw_preserved() {
        assert_eq!(v("5.0.0.RELEASE").as_str(), "5.0.0.RELEASE");
        assert_eq!(v(" 1.2 ").to_string(), "1.2");
    }

    #[test]
    fn test_parse_empty() {
        assert!(Version::parse("").is_none());
        assert!(Version::parse("  ").is_none());
    }

    #[test]
    fn test_max_selection() {
        let versions = [v("1.0"), v("2.0-RC1"), v("1.5"), v("2.0")];
        assert_eq!(versions.iter().max().unwrap().as_str(), "2.0");
    }

    #[test]
    fn test_serde_roundtrip_keeps_ordering() {
        let json = serde_json::to_string(&v("1.10.0")).unwrap();
        assert_eq!(json, "\"1.10.0\"");
        let parsed: Version = serde_json::from_str(&json).unwrap();
        assert!(parsed > v("1.9"));
    }
}

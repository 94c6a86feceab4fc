//! Query normalization, cache keys, and the record match predicate.
//!
//! Everything that decides *whether* and *in what order* a record matches
//! lives here, so the indexed path and the linear-scan path share one
//! definition and a cached result is always identical to a recomputed one.

use crate::error::EngineError;
use crate::record::FoldedText;

/// What a cached result was computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Search,
    Category,
}

/// Canonical cache key for a search or listing request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub kind: QueryKind,
    pub text: String,
    pub collection: Option<String>,
    pub exact: bool,
}

impl QueryKey {
    /// Normalizes a search request: trims and case-folds the text.
    pub fn search(text: &str, collection: Option<&str>, exact: bool) -> Result<Self, EngineError> {
        let text = normalize_text(text).ok_or(EngineError::InvalidQuery)?;
        Ok(Self {
            kind: QueryKind::Search,
            text,
            collection: normalize_collection(collection),
            exact,
        })
    }

    /// Normalizes a category listing: trims only, categories match exactly.
    pub fn category(category: &str, collection: Option<&str>) -> Result<Self, EngineError> {
        let text = category.trim();
        if text.is_empty() {
            return Err(EngineError::InvalidQuery);
        }
        Ok(Self {
            kind: QueryKind::Category,
            text: text.to_string(),
            collection: normalize_collection(collection),
            exact: true,
        })
    }

    /// Returns `true` if this key is scoped to `collection`.
    pub fn is_scoped_to(&self, collection: &str) -> bool {
        self.collection.as_deref() == Some(collection.trim())
    }
}

/// Trims and lower-cases query text; `None` if nothing is left.
pub fn normalize_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
}

fn normalize_collection(collection: Option<&str>) -> Option<String> {
    collection
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

/// Splits text into lower-cased word tokens with edge punctuation stripped.
///
/// Used both to build the name/keyword indices and to tokenize queries.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
}

/// Returns `true` if `text` uses `*` or `?` wildcards.
#[inline]
pub fn is_glob(text: &str) -> bool {
    text.contains(['*', '?'])
}

/// Whole-string wildcard match: `*` matches any run, `?` any single char.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    let mut star: Option<usize> = None;
    let mut resume = 0;

    while t < text.len() {
        match pattern.get(p) {
            Some('?') => {
                p += 1;
                t += 1;
            },
            Some('*') => {
                star = Some(p);
                p += 1;
                resume = t;
            },
            Some(&c) if c == text[t] => {
                p += 1;
                t += 1;
            },
            _ => match star {
                Some(star_at) => {
                    p = star_at + 1;
                    resume += 1;
                    t = resume;
                },
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|&c| c == '*')
}

/// Ranking bucket for a matching record; lower sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchTier {
    NameEquals,
    NamePrefix,
    NameContains,
    KeywordOnly,
}

/// Prepared search predicate for one normalized query.
#[derive(Debug, Clone)]
pub struct Matcher<'q> {
    text: &'q str,
    exact: bool,
    glob: bool,
}

impl<'q> Matcher<'q> {
    /// `text` must already be normalized (see [`normalize_text`]).
    pub fn new(text: &'q str, exact: bool) -> Self {
        Self {
            text,
            exact,
            glob: is_glob(text),
        }
    }

    /// Returns `true` if index narrowing can be used. Globs always scan.
    #[inline]
    pub fn is_indexable(&self) -> bool {
        !self.glob
    }

    pub fn text(&self) -> &str {
        self.text
    }

    /// Classifies a record by its folded text, or `None` if it does not match.
    pub fn tier(&self, text: &FoldedText) -> Option<MatchTier> {
        let name = text.name.as_str();

        if self.glob {
            if glob_match(self.text, name) {
                return Some(MatchTier::NameEquals);
            }
            return text
                .keywords
                .iter()
                .any(|kw| glob_match(self.text, kw))
                .then_some(MatchTier::KeywordOnly);
        }

        if name == self.text {
            return Some(MatchTier::NameEquals);
        }
        if !self.exact {
            if name.starts_with(self.text) {
                return Some(MatchTier::NamePrefix);
            }
            if name.contains(self.text) {
                return Some(MatchTier::NameContains);
            }
        }

        text.keywords
            .iter()
            .any(|kw| if self.exact { kw == self.text } else { kw.contains(self.text) })
            .then_some(MatchTier::KeywordOnly)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::record::Record;

    fn rocket() -> FoldedText {
        FoldedText::of(&Record::new("🚀", "Rocket", "Travel", ["Launch", "space"]))
    }

    #[test]
    fn keys_normalize_case_and_whitespace() {
        let a = QueryKey::search("  Rocket ", Some(" Work "), false).unwrap();
        let b = QueryKey::search("rocket", Some("Work"), false).unwrap();
        assert_eq!(a, b);
        assert!(a.is_scoped_to("Work"));
        assert_ne!(a, QueryKey::search("rocket", None, false).unwrap());
        assert_ne!(a, QueryKey::search("rocket", Some("Work"), true).unwrap());
    }

    #[test]
    fn blank_query_is_invalid() {
        assert_eq!(QueryKey::search(" \t", None, false), Err(EngineError::InvalidQuery));
        assert_eq!(QueryKey::category("", None), Err(EngineError::InvalidQuery));
    }

    #[test]
    fn category_keys_keep_case() {
        let key = QueryKey::category(" Smileys & Emotion ", None).unwrap();
        assert_eq!(key.text, "Smileys & Emotion");
        assert_eq!(key.kind, QueryKind::Category);
        assert_ne!(key, QueryKey::search("Smileys & Emotion", None, true).unwrap());
    }

    #[test]
    fn blank_collection_means_unscoped() {
        let key = QueryKey::search("fire", Some("  "), false).unwrap();
        assert_eq!(key.collection, None);
    }

    #[test]
    fn tokenize_strips_edge_punctuation() {
        let tokens: Vec<String> = tokenize("Face with Tears-of-Joy! (laughing)").collect();
        assert_eq!(tokens, vec!["face", "with", "tears-of-joy", "laughing"]);
        assert_eq!(tokenize(" -- ").count(), 0);
    }

    #[test]
    fn glob_matching() {
        assert!(glob_match("rock*", "rocket"));
        assert!(glob_match("*ket", "rocket"));
        assert!(glob_match("r?cket", "rocket"));
        assert!(glob_match("*", ""));
        assert!(glob_match("*o*e*", "rocket"));
        assert!(!glob_match("rock", "rocket"));
        assert!(!glob_match("?", ""));
        assert!(!glob_match("x*", "rocket"));
    }

    #[test]
    fn tiers_rank_name_before_keywords() {
        let r = rocket();
        assert_eq!(Matcher::new("rocket", false).tier(&r), Some(MatchTier::NameEquals));
        assert_eq!(Matcher::new("rock", false).tier(&r), Some(MatchTier::NamePrefix));
        assert_eq!(Matcher::new("ocke", false).tier(&r), Some(MatchTier::NameContains));
        assert_eq!(Matcher::new("aun", false).tier(&r), Some(MatchTier::KeywordOnly));
        assert_eq!(Matcher::new("fire", false).tier(&r), None);
    }

    #[test]
    fn exact_requires_whole_name_or_keyword() {
        let r = rocket();
        assert_eq!(Matcher::new("rock", true).tier(&r), None);
        assert_eq!(Matcher::new("launch", true).tier(&r), Some(MatchTier::KeywordOnly));
        assert_eq!(Matcher::new("rocket", true).tier(&r), Some(MatchTier::NameEquals));
    }

    #[test]
    fn glob_matcher_is_not_indexable() {
        let m = Matcher::new("spa*", false);
        assert!(!m.is_indexable());
        assert_eq!(m.tier(&rocket()), Some(MatchTier::KeywordOnly));
        assert!(Matcher::new("space", false).is_indexable());
    }
}

//! Inverted indices over one [`RecordStore`] snapshot.
//!
//! [`IndexSet::build`] derives four maps from a snapshot:
//!
//! | Map        | Key                                   | Value             |
//! |------------|---------------------------------------|-------------------|
//! | `names`    | lower-cased name token                | record positions  |
//! | `keywords` | lower-cased keyword token             | record positions  |
//! | `category` | exact category string                 | record positions  |
//! | `symbols`  | exact symbol                          | record position   |
//!
//! Posting lists are sorted ascending and deduplicated, so merging them
//! preserves dataset order. Positions always refer to the snapshot the set
//! was built from; the engine swaps store and indices together.
//!
//! Token lookups only narrow the search: callers confirm every candidate with
//! the real match predicate, because records match on substrings and a token
//! containing the query may still belong to a record that does not match.

use rustc_hash::FxHashMap;

use crate::query::tokenize;
use crate::record::RecordStore;

/// Sorted record positions.
pub type Postings = Vec<usize>;

#[derive(Debug, Default, Clone)]
pub struct IndexSet {
    names: FxHashMap<String, Postings>,
    keywords: FxHashMap<String, Postings>,
    categories: FxHashMap<String, Postings>,
    symbols: FxHashMap<String, usize>,
    generation: u64,
}

impl IndexSet {
    /// Builds all indices for `store`. An empty store yields empty indices.
    pub fn build(store: &RecordStore) -> Self {
        let mut set = Self {
            generation: store.generation(),
            ..Self::default()
        };

        let texts = store.records().iter().zip(store.folded_texts());
        for (id, (record, folded)) in texts.enumerate() {
            for token in tokenize(&folded.name) {
                push_posting(&mut set.names, token, id);
            }
            for keyword in &folded.keywords {
                for token in tokenize(keyword) {
                    push_posting(&mut set.keywords, token, id);
                }
            }
            push_posting(&mut set.categories, record.category.clone(), id);
            set.symbols.insert(record.symbol.clone(), id);
        }

        set
    }

    /// Generation of the snapshot these indices were built from.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Positions of records whose category is exactly `category`.
    pub fn by_category(&self, category: &str) -> &[usize] {
        self.categories.get(category).map(Vec::as_slice).unwrap_or_default()
    }

    /// Positions of records with `token` in their name.
    pub fn by_name_token(&self, token: &str) -> &[usize] {
        self.names.get(token).map(Vec::as_slice).unwrap_or_default()
    }

    /// Positions of records with `token` in a keyword.
    pub fn by_keyword_token(&self, token: &str) -> &[usize] {
        self.keywords.get(token).map(Vec::as_slice).unwrap_or_default()
    }

    /// Position of the record with exactly this symbol.
    pub fn by_symbol(&self, symbol: &str) -> Option<usize> {
        self.symbols.get(symbol).copied()
    }

    /// Positions of every record that can match `query`.
    ///
    /// Each query token is looked up against the token vocabulary rather
    /// than the records: an exact query takes the postings of equal tokens,
    /// a non-exact query the postings of every token containing it. A record
    /// whose name or keyword contains the query contains each query token
    /// inside one of its own tokens, so no true match is left out.
    ///
    /// Returned positions are sorted and unique. Empty when no token is
    /// indexed, which tells the caller to fall back to a full scan.
    pub fn candidates(&self, query: &str, exact: bool) -> Postings {
        let mut out: Postings = Vec::new();
        for token in tokenize(query) {
            if exact {
                out.extend_from_slice(self.by_name_token(&token));
                out.extend_from_slice(self.by_keyword_token(&token));
                continue;
            }
            for map in [&self.names, &self.keywords] {
                for (indexed, postings) in map {
                    if indexed.contains(token.as_str()) {
                        out.extend_from_slice(postings);
                    }
                }
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Distinct categories, sorted.
    pub fn categories(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.categories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_against(&self, store: &RecordStore) {
        assert_eq!(self.generation, store.generation());
        assert_eq!(self.symbols.len(), store.len());
        let maps = [&self.names, &self.keywords, &self.categories];
        for map in maps {
            for postings in map.values() {
                assert!(postings.windows(2).all(|w| w[0] < w[1]), "postings unsorted");
                assert!(postings.iter().all(|&id| id < store.len()), "dangling position");
            }
        }
    }
}

fn push_posting(map: &mut FxHashMap<String, Postings>, key: String, id: usize) {
    let postings = map.entry(key).or_default();
    // records are visited in order, so a repeat can only be the last entry
    if postings.last() != Some(&id) {
        postings.push(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Record, ReplaceReason};

    fn store() -> RecordStore {
        RecordStore::try_new(
            vec![
                Record::new("🚀", "rocket", "Travel", ["launch", "space"]),
                Record::new("🔥", "fire", "Nature", ["hot", "flame"]),
                Record::new("🌋", "volcano", "Nature", ["hot", "eruption", "mountain"]),
                Record::new("🧑‍🚀", "Astronaut", "People & Body", ["space", "rocket man"]),
            ],
            1,
            ReplaceReason::Load,
        )
        .unwrap()
    }

    #[test]
    fn builds_all_maps() {
        let store = store();
        let index = IndexSet::build(&store);

        assert_eq!(index.by_name_token("rocket"), &[0]);
        assert_eq!(index.by_keyword_token("rocket"), &[3]);
        assert_eq!(index.by_keyword_token("hot"), &[1, 2]);
        assert_eq!(index.by_category("Nature"), &[1, 2]);
        assert_eq!(index.by_category("nature"), &[] as &[usize]);
        assert_eq!(index.by_category("People & Body"), &[3]);
        assert_eq!(index.by_symbol("🌋"), Some(2));
        assert_eq!(index.generation(), 1);
        index.debug_validate_against(&store);
    }

    #[test]
    fn name_tokens_are_lowercased() {
        let index = IndexSet::build(&store());
        assert_eq!(index.by_name_token("astronaut"), &[3]);
        assert!(index.by_name_token("Astronaut").is_empty());
    }

    #[test]
    fn candidates_union_sorted() {
        let index = IndexSet::build(&store());
        assert_eq!(index.candidates("space rocket", false), vec![0, 3]);
        assert_eq!(index.candidates("Hot!", false), vec![1, 2]);
        assert!(index.candidates("zebra", false).is_empty());
    }

    #[test]
    fn candidates_include_substring_tokens() {
        let store = RecordStore::try_new(
            vec![
                Record::new("🔥", "fire", "Nature", ["flame"]),
                Record::new("🎆", "fireworks", "Activities", ["celebration"]),
                Record::new("🚒", "fire engine", "Travel", ["truck"]),
                Record::new("🧯", "extinguisher", "Objects", ["bonfire safety"]),
            ],
            1,
            ReplaceReason::Load,
        )
        .unwrap();
        let index = IndexSet::build(&store);

        assert_eq!(index.candidates("fire", false), vec![0, 1, 2, 3]);
        assert_eq!(index.candidates("ork", false), vec![1]);
        assert_eq!(index.candidates("fire", true), vec![0, 2]);
        assert!(index.candidates("rock", false).is_empty());
    }

    #[test]
    fn empty_store_gives_empty_indices() {
        let index = IndexSet::build(&RecordStore::empty());
        assert!(index.is_empty());
        assert!(index.categories().is_empty());
        assert!(index.candidates("anything", false).is_empty());
    }

    #[test]
    fn categories_are_sorted() {
        let index = IndexSet::build(&store());
        assert_eq!(index.categories(), vec!["Nature", "People & Body", "Travel"]);
    }

    #[test]
    fn build_is_deterministic() {
        let store = store();
        let a = IndexSet::build(&store);
        let b = IndexSet::build(&store);
        for token in ["rocket", "space", "hot", "man"] {
            assert_eq!(a.by_name_token(token), b.by_name_token(token));
            assert_eq!(a.by_keyword_token(token), b.by_keyword_token(token));
            assert_eq!(a.candidates(token, false), b.candidates(token, false));
        }
    }
}

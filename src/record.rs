//! Dataset records and the immutable record store snapshot.
//!
//! A [`RecordStore`] is one validated, generation-stamped snapshot of the
//! dataset. It is created by [`RecordStore::try_new`] and never mutated; a
//! reload produces a new store that replaces the old one wholesale.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashSet;

/// One pictographic symbol and its searchable metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Record {
    pub symbol: String,
    pub name: String,
    pub category: String,
    pub keywords: Vec<String>,
}

impl Record {
    pub fn new(
        symbol: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        keywords: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            category: category.into(),
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }
}

/// Lower-cased name and keywords of one record.
///
/// Computed once per snapshot so matching never case-folds on the hot path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldedText {
    pub name: String,
    pub keywords: Vec<String>,
}

impl FoldedText {
    pub fn of(record: &Record) -> Self {
        Self {
            name: record.name.to_lowercase(),
            keywords: record.keywords.iter().map(|kw| kw.to_lowercase()).collect(),
        }
    }
}

/// Collaborator event that produced a dataset snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReplaceReason {
    #[default]
    Load,
    Update,
    LanguageSwitch,
    Import,
    Reset,
}

impl fmt::Display for ReplaceReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Load => "load",
            Self::Update => "update",
            Self::LanguageSwitch => "language-switch",
            Self::Import => "import",
            Self::Reset => "reset",
        })
    }
}

/// Why a candidate snapshot was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotDefect {
    EmptySymbol { position: usize },
    EmptyName { symbol: String },
    DuplicateSymbol { symbol: String },
}

impl fmt::Display for SnapshotDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySymbol { position } => write!(f, "record {} has an empty symbol", position),
            Self::EmptyName { symbol } => write!(f, "record {} has an empty name", symbol),
            Self::DuplicateSymbol { symbol } => write!(f, "symbol {} appears more than once", symbol),
        }
    }
}

/// Immutable, ordered snapshot of dataset records.
#[derive(Debug, Default)]
pub struct RecordStore {
    records: Vec<Arc<Record>>,
    folded: Vec<FoldedText>,
    generation: u64,
    reason: ReplaceReason,
}

impl RecordStore {
    /// The empty store an engine starts with (generation 0).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Validates `records` and wraps them as snapshot `generation`.
    pub fn try_new(
        records: Vec<Record>,
        generation: u64,
        reason: ReplaceReason,
    ) -> Result<Self, SnapshotDefect> {
        validate(&records)?;
        let folded = records.iter().map(FoldedText::of).collect();
        Ok(Self {
            records: records.into_iter().map(Arc::new).collect(),
            folded,
            generation,
            reason,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    pub fn reason(&self) -> ReplaceReason {
        self.reason
    }

    /// Returns the record at dataset position `id`.
    #[inline]
    pub fn get(&self, id: usize) -> Option<&Arc<Record>> {
        self.records.get(id)
    }

    pub fn records(&self) -> &[Arc<Record>] {
        &self.records
    }

    /// Lower-cased text of the record at `id`.
    #[inline]
    pub fn folded(&self, id: usize) -> Option<&FoldedText> {
        self.folded.get(id)
    }

    /// Lower-cased text of every record, in dataset order.
    pub fn folded_texts(&self) -> &[FoldedText] {
        &self.folded
    }
}

fn validate(records: &[Record]) -> Result<(), SnapshotDefect> {
    let mut seen = FxHashSet::with_capacity_and_hasher(records.len(), Default::default());
    for (position, record) in records.iter().enumerate() {
        if record.symbol.is_empty() {
            return Err(SnapshotDefect::EmptySymbol { position });
        }
        if record.name.trim().is_empty() {
            return Err(SnapshotDefect::EmptyName {
                symbol: record.symbol.clone(),
            });
        }
        if !seen.insert(record.symbol.as_str()) {
            return Err(SnapshotDefect::DuplicateSymbol {
                symbol: record.symbol.clone(),
            });
        }
    }
    Ok(())
}

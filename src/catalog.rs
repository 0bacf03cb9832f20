//! Anime metadata and synopsis tables.
//!
//! Both tables come from the offline preprocessing step and are read-only at
//! serving time. An anime is referenced sometimes by its external id and
//! sometimes by its display title; [`AnimeRef`] makes that distinction an
//! explicit tagged variant so lookups dispatch on the tag instead of
//! inspecting value types at runtime.

use std::fmt;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::codec::AnimeId;

/// Substituted when the metadata table carries no genre for a title.
pub const GENRE_PLACEHOLDER: &str = "Various Genres";

/// Substituted when neither synopsis key resolves for a title.
pub const SYNOPSIS_PLACEHOLDER: &str = "No synopsis available";

/// One row of the anime metadata table.
///
/// Field names follow the preprocessed CSV headers; the upstream table is
/// sorted by descending score with missing scores last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimeRecord {
    pub anime_id: AnimeId,
    #[serde(rename = "eng_version")]
    pub title: String,
    #[serde(rename = "Score")]
    pub score: Option<f32>,
    #[serde(rename = "Genres")]
    pub genre: Option<String>,
    #[serde(rename = "Episodes")]
    pub episodes: Option<u32>,
    #[serde(rename = "Type")]
    pub kind: Option<String>,
    #[serde(rename = "Members")]
    pub members: Option<u64>,
    #[serde(rename = "Premiered")]
    pub premiered: Option<String>,
}

impl AnimeRecord {
    /// Genre string with the documented placeholder substituted when absent.
    pub fn genre_or_default(&self) -> &str {
        self.genre.as_deref().unwrap_or(GENRE_PLACEHOLDER)
    }
}

/// One row of the synopsis table.
///
/// The upstream CSV really does spell the column `sypnopsis`; the rename
/// keeps the loader compatible with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynopsisRecord {
    #[serde(rename = "MAL_ID")]
    pub anime_id: AnimeId,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "sypnopsis")]
    pub synopsis: Option<String>,
}

/// Reference to an anime either by external id or by display title.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AnimeRef {
    ById(AnimeId),
    ByTitle(String),
}

impl fmt::Display for AnimeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnimeRef::ById(id) => write!(f, "id {id}"),
            AnimeRef::ByTitle(title) => write!(f, "title {title:?}"),
        }
    }
}

impl From<AnimeId> for AnimeRef {
    fn from(id: AnimeId) -> Self {
        AnimeRef::ById(id)
    }
}

impl From<&str> for AnimeRef {
    fn from(title: &str) -> Self {
        AnimeRef::ByTitle(title.to_string())
    }
}

impl From<String> for AnimeRef {
    fn from(title: String) -> Self {
        AnimeRef::ByTitle(title)
    }
}

/// Read-only anime metadata table with id- and title-keyed lookup.
#[derive(Debug, Clone)]
pub struct AnimeCatalog {
    records: Vec<AnimeRecord>,
    by_id: HashMap<AnimeId, usize>,
    by_title: HashMap<String, usize>,
}

impl AnimeCatalog {
    /// Index a table in its upstream order. When two rows share a title the
    /// earlier row wins, which under the upstream sort order is the
    /// higher-scored entry.
    pub fn new(records: Vec<AnimeRecord>) -> Self {
        let mut by_id = HashMap::with_capacity(records.len());
        let mut by_title = HashMap::with_capacity(records.len());
        for (position, record) in records.iter().enumerate() {
            by_id.entry(record.anime_id).or_insert(position);
            by_title.entry(record.title.clone()).or_insert(position);
        }
        Self {
            records,
            by_id,
            by_title,
        }
    }

    /// Resolve a reference, dispatching on its tag.
    pub fn get(&self, anime: &AnimeRef) -> Option<&AnimeRecord> {
        match anime {
            AnimeRef::ById(id) => self.by_id(*id),
            AnimeRef::ByTitle(title) => self.by_title(title),
        }
    }

    pub fn by_id(&self, id: AnimeId) -> Option<&AnimeRecord> {
        self.by_id.get(&id).map(|&position| &self.records[position])
    }

    pub fn by_title(&self, title: &str) -> Option<&AnimeRecord> {
        self.by_title
            .get(title)
            .map(|&position| &self.records[position])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[AnimeRecord] {
        &self.records
    }
}

/// Read-only synopsis table keyed by id or by name.
#[derive(Debug, Clone)]
pub struct SynopsisTable {
    records: Vec<SynopsisRecord>,
    by_id: HashMap<AnimeId, usize>,
    by_name: HashMap<String, usize>,
}

impl SynopsisTable {
    pub fn new(records: Vec<SynopsisRecord>) -> Self {
        let mut by_id = HashMap::with_capacity(records.len());
        let mut by_name = HashMap::with_capacity(records.len());
        for (position, record) in records.iter().enumerate() {
            by_id.entry(record.anime_id).or_insert(position);
            by_name.entry(record.name.clone()).or_insert(position);
        }
        Self {
            records,
            by_id,
            by_name,
        }
    }

    /// Resolve a reference, dispatching on its tag.
    pub fn get(&self, anime: &AnimeRef) -> Option<&str> {
        match anime {
            AnimeRef::ById(id) => self.by_id(*id),
            AnimeRef::ByTitle(title) => self.by_name(title),
        }
    }

    pub fn by_id(&self, id: AnimeId) -> Option<&str> {
        self.by_id
            .get(&id)
            .and_then(|&position| self.records[position].synopsis.as_deref())
    }

    pub fn by_name(&self, name: &str) -> Option<&str> {
        self.by_name
            .get(name)
            .and_then(|&position| self.records[position].synopsis.as_deref())
    }

    /// Synopsis for an id, falling back to the name key and then to the
    /// documented placeholder.
    pub fn lookup_or_default(&self, id: AnimeId, name: &str) -> &str {
        self.by_id(id)
            .or_else(|| self.by_name(name))
            .unwrap_or(SYNOPSIS_PLACEHOLDER)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u32, title: &str, genre: Option<&str>, score: Option<f32>) -> AnimeRecord {
        AnimeRecord {
            anime_id: AnimeId(id),
            title: title.to_string(),
            score,
            genre: genre.map(str::to_string),
            episodes: None,
            kind: None,
            members: None,
            premiered: None,
        }
    }

    #[test]
    fn reference_dispatches_on_tag() {
        let catalog = AnimeCatalog::new(vec![
            record(10, "Steel Hearts", Some("Action"), Some(8.1)),
            record(20, "Paper Moons", None, None),
        ]);

        let by_id = catalog.get(&AnimeRef::ById(AnimeId(20))).expect("known id");
        assert_eq!(by_id.title, "Paper Moons");

        let by_title = catalog
            .get(&AnimeRef::from("Steel Hearts"))
            .expect("known title");
        assert_eq!(by_title.anime_id, AnimeId(10));

        assert!(catalog.get(&AnimeRef::ById(AnimeId(99))).is_none());
        assert!(catalog.get(&AnimeRef::from("Missing")).is_none());
    }

    #[test]
    fn missing_genre_uses_placeholder() {
        let catalog = AnimeCatalog::new(vec![record(20, "Paper Moons", None, None)]);
        let hit = catalog.by_id(AnimeId(20)).expect("known id");
        assert_eq!(hit.genre_or_default(), GENRE_PLACEHOLDER);
    }

    #[test]
    fn duplicate_titles_keep_first_row() {
        let catalog = AnimeCatalog::new(vec![
            record(1, "Remake", None, Some(9.0)),
            record(2, "Remake", None, Some(6.0)),
        ]);
        assert_eq!(
            catalog.by_title("Remake").expect("known title").anime_id,
            AnimeId(1)
        );
    }

    #[test]
    fn synopsis_falls_back_id_then_name_then_placeholder() {
        let table = SynopsisTable::new(vec![
            SynopsisRecord {
                anime_id: AnimeId(10),
                name: "Steel Hearts".to_string(),
                synopsis: Some("A story of gears and grit.".to_string()),
            },
            SynopsisRecord {
                anime_id: AnimeId(20),
                name: "Paper Moons".to_string(),
                synopsis: None,
            },
        ]);

        assert_eq!(
            table.lookup_or_default(AnimeId(10), "ignored"),
            "A story of gears and grit."
        );
        // Unknown id, known name.
        assert_eq!(
            table.lookup_or_default(AnimeId(77), "Steel Hearts"),
            "A story of gears and grit."
        );
        // Known id with an empty synopsis column.
        assert_eq!(
            table.lookup_or_default(AnimeId(20), "Paper Moons"),
            SYNOPSIS_PLACEHOLDER
        );
    }
}

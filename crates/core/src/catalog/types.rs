//! Types for the listing catalog.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use tracing::warn;

/// One product listing, keyed by its detail-page URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Detail-page URL (catalog key).
    pub url: String,
    /// Display name.
    pub name: String,
    /// Primary photo URL, if the detail page had one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl CatalogEntry {
    pub fn new(url: impl Into<String>, name: impl Into<String>, image_url: Option<String>) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            image_url,
        }
    }
}

/// On-disk value of a catalog key, as written.
#[derive(Serialize)]
struct EntryRecordRef<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_url: Option<&'a str>,
}

/// On-disk value of a catalog key, as read.
#[derive(Deserialize)]
struct EntryRecord {
    name: String,
    #[serde(default)]
    image_url: Option<String>,
}

/// Mapping of detail-page URL to listing.
///
/// Iteration follows crawl order; inserting an existing key replaces the
/// entry in place. Serializes as `{url: {name, image_url}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    positions: HashMap<String, usize>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts an entry, returning the one it replaced.
    pub fn insert(&mut self, entry: CatalogEntry) -> Result<Option<CatalogEntry>, CatalogError> {
        if entry.url.trim().is_empty() {
            return Err(CatalogError::EmptyKey);
        }
        match self.positions.get(&entry.url) {
            Some(&index) => Ok(Some(std::mem::replace(&mut self.entries[index], entry))),
            None => {
                self.positions.insert(entry.url.clone(), self.entries.len());
                self.entries.push(entry);
                Ok(None)
            }
        }
    }

    pub fn get(&self, url: &str) -> Option<&CatalogEntry> {
        self.positions.get(url).map(|&index| &self.entries[index])
    }

    pub fn contains(&self, url: &str) -> bool {
        self.positions.contains_key(url)
    }

    /// Entries in crawl order.
    pub fn iter(&self) -> std::slice::Iter<'_, CatalogEntry> {
        self.entries.iter()
    }

    /// Entries that carry a photo URL, in crawl order.
    pub fn with_images(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter().filter(|e| e.image_url.is_some())
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a CatalogEntry;
    type IntoIter = std::slice::Iter<'a, CatalogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl Serialize for Catalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(
                &entry.url,
                &EntryRecordRef {
                    name: &entry.name,
                    image_url: entry.image_url.as_deref(),
                },
            )?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Catalog {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CatalogVisitor;

        impl<'de> Visitor<'de> for CatalogVisitor {
            type Value = Catalog;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of detail-page URL to {name, image_url}")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Catalog, A::Error> {
                let mut catalog = Catalog::new();
                while let Some((url, record)) = access.next_entry::<String, EntryRecord>()? {
                    catalog
                        .insert(CatalogEntry {
                            url,
                            name: record.name,
                            image_url: record.image_url,
                        })
                        .map_err(de::Error::custom)?;
                }
                Ok(catalog)
            }
        }

        deserializer.deserialize_map(CatalogVisitor)
    }
}

impl FromIterator<CatalogEntry> for Catalog {
    /// Collects entries, dropping any with an empty key.
    fn from_iter<I: IntoIterator<Item = CatalogEntry>>(iter: I) -> Self {
        let mut catalog = Catalog::new();
        for entry in iter {
            let name = entry.name.clone();
            if let Err(e) = catalog.insert(entry) {
                warn!(name = %name, error = %e, "Dropping catalog entry");
            }
        }
        catalog
    }
}

/// Catalog statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogStats {
    /// Total listings.
    pub total_entries: usize,
    /// Listings with a photo URL.
    pub entries_with_image: usize,
}

impl From<&Catalog> for CatalogStats {
    fn from(catalog: &Catalog) -> Self {
        Self {
            total_entries: catalog.len(),
            entries_with_image: catalog.with_images().count(),
        }
    }
}

/// Errors for catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("No catalog has been saved yet; run a crawl first")]
    NotFound,

    #[error("Catalog entries must have a non-empty URL key")]
    EmptyKey,

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

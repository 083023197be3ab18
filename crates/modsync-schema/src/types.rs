//! Identifiers and metadata records for workshop mods.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

/// Update token used when the remote freshness of a mod is unknown.
///
/// A lock entry carrying this token predates freshness tracking; remote
/// metadata carrying it could not be fetched.
pub const UNKNOWN_UPDATE: &str = "0";

/// Errors that can occur when constructing a [`ModId`].
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ModIdError {
    /// The id is an empty string.
    #[error("Mod id is empty")]
    Empty,

    /// The id contains a character other than an ASCII digit.
    #[error("Mod id '{0}' is not numeric")]
    NotNumeric(String),
}

/// Opaque numeric identifier of a mod on the remote content service.
///
/// Stored as a string so leading zeros and very long ids survive untouched.
/// Ordering is lexical, which is also the order used when ids are written
/// into the build configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModId(String);

impl ModId {
    /// Parse an id, rejecting anything that is not a non-empty digit string.
    ///
    /// # Errors
    ///
    /// Returns [`ModIdError::Empty`] for an empty string and
    /// [`ModIdError::NotNumeric`] if any character is not an ASCII digit.
    pub fn parse(raw: &str) -> Result<Self, ModIdError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ModIdError::Empty);
        }
        if !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ModIdError::NotNumeric(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    /// Return the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ModId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::ops::Deref for ModId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for ModId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<std::path::Path> for ModId {
    fn as_ref(&self) -> &std::path::Path {
        std::path::Path::new(&self.0)
    }
}

impl Borrow<str> for ModId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ModId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ModId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl TryFrom<&str> for ModId {
    type Error = ModIdError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

/// A mod requested by the source list, with an optional display tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModRef {
    /// The requested mod.
    pub id: ModId,
    /// Human-chosen label overriding the remote title, if any.
    pub tag: Option<String>,
}

impl ModRef {
    /// Create a reference, treating an empty or whitespace tag as absent.
    pub fn new(id: ModId, tag: Option<&str>) -> Self {
        let tag = tag
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        Self { id, tag }
    }
}

/// A declared dependency of a mod, as listed on its item page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Id of the required mod.
    pub id: ModId,
    /// Title of the required mod as shown by the remote service.
    pub name: String,
}

/// Remote facts about a single mod, fetched once per resolution run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModMetadata {
    /// The mod this metadata describes.
    pub id: ModId,
    /// Display name (remote title, or the source-list tag when one was given).
    pub name: String,
    /// Service-defined freshness token; [`UNKNOWN_UPDATE`] when unknown.
    pub updated: String,
    /// Required items, in page order.
    pub dependencies: Vec<Dependency>,
}

impl ModMetadata {
    /// Stand-in metadata for a mod whose page could not be fetched or parsed.
    pub fn placeholder(id: &ModId) -> Self {
        Self {
            id: id.clone(),
            name: format!("Mod {id}"),
            updated: UNKNOWN_UPDATE.to_string(),
            dependencies: Vec::new(),
        }
    }

    /// Whether the freshness token is known.
    pub fn has_known_update(&self) -> bool {
        self.updated != UNKNOWN_UPDATE
    }
}

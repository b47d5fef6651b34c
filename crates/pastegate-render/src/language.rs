//! Language registry.
//!
//! Maps the language identifier stored on a paste to a [`Language`], which
//! the formatter receives and which supplies download file extensions.
//! Unrecognized identifiers fall back to a plain-text "unknown" language.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{RenderError, Result};

/// Extension used when a language names none.
pub const FALLBACK_EXTENSION: &str = "txt";

/// A language a paste can be written in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub alt_ids: Vec<String>,
    #[serde(default)]
    pub extensions: Vec<String>,
}

impl Language {
    /// A language with no alternate ids or extensions.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            alt_ids: Vec::new(),
            extensions: Vec::new(),
        }
    }

    /// Add an alternate id.
    pub fn alt_id(mut self, id: impl Into<String>) -> Self {
        self.alt_ids.push(id.into());
        self
    }

    /// Add a file extension (without the dot).
    pub fn extension(mut self, ext: impl Into<String>) -> Self {
        self.extensions.push(ext.into());
        self
    }

    /// Preferred file extension.
    pub fn file_extension(&self) -> &str {
        self.extensions
            .first()
            .map(String::as_str)
            .unwrap_or(FALLBACK_EXTENSION)
    }

    /// The fallback language.
    pub fn unknown() -> Self {
        Language::new("unknown", "Unknown")
    }
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    groups: Vec<LanguageGroup>,
}

/// A named group of languages, for listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageGroup {
    pub name: String,
    pub languages: Vec<Language>,
}

/// Lookup table from language ids to languages.
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    groups: Vec<LanguageGroup>,
    by_id: HashMap<String, Arc<Language>>,
    by_extension: HashMap<String, Arc<Language>>,
    unknown: Arc<Language>,
}

impl LanguageRegistry {
    /// Build a registry from groups of languages.
    ///
    /// Ids and alternate ids are matched case-insensitively and must be
    /// unique across the registry. The first language to claim an extension
    /// keeps it.
    pub fn new(groups: Vec<LanguageGroup>) -> Result<Self> {
        let mut by_id = HashMap::new();
        let mut by_extension = HashMap::new();

        for language in groups.iter().flat_map(|g| g.languages.iter()) {
            let language = Arc::new(language.clone());
            for id in std::iter::once(&language.id).chain(language.alt_ids.iter()) {
                let key = id.to_ascii_lowercase();
                if by_id.insert(key, Arc::clone(&language)).is_some() {
                    return Err(RenderError::DuplicateLanguage(id.clone()));
                }
            }
            for ext in &language.extensions {
                by_extension
                    .entry(ext.to_ascii_lowercase())
                    .or_insert_with(|| Arc::clone(&language));
            }
        }

        Ok(Self {
            groups,
            by_id,
            by_extension,
            unknown: Arc::new(Language::unknown()),
        })
    }

    /// Parse a registry from JSON of the form
    /// `{"groups": [{"name": ..., "languages": [{"id": ..., "name": ...}]}]}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: RegistryFile = serde_json::from_str(json)?;
        Self::new(file.groups)
    }

    /// A small registry of common languages.
    pub fn builtin() -> Self {
        let groups = vec![
            LanguageGroup {
                name: "Text".into(),
                languages: vec![
                    Language::new("text", "Plain Text").alt_id("plain").extension("txt"),
                    Language::new("markdown", "Markdown").alt_id("md").extension("md"),
                ],
            },
            LanguageGroup {
                name: "Programming".into(),
                languages: vec![
                    Language::new("rust", "Rust").alt_id("rs").extension("rs"),
                    Language::new("go", "Go").alt_id("golang").extension("go"),
                    Language::new("python", "Python").alt_id("py").extension("py"),
                    Language::new("c", "C").extension("c").extension("h"),
                    Language::new("javascript", "JavaScript").alt_id("js").extension("js"),
                    Language::new("bash", "Bash").alt_id("sh").extension("sh"),
                ],
            },
        ];
        // Builtin ids are unique, so this only falls back if that changes.
        Self::new(groups).unwrap_or_else(|_| Self::empty())
    }

    /// A registry that only knows the unknown language.
    pub fn empty() -> Self {
        Self {
            groups: Vec::new(),
            by_id: HashMap::new(),
            by_extension: HashMap::new(),
            unknown: Arc::new(Language::unknown()),
        }
    }

    /// Look a language up by id or alternate id.
    pub fn get(&self, id: &str) -> Option<&Arc<Language>> {
        self.by_id.get(&id.to_ascii_lowercase())
    }

    /// Look a language up, falling back to the unknown language.
    pub fn resolve(&self, id: &str) -> &Arc<Language> {
        self.get(id).unwrap_or(&self.unknown)
    }

    /// Look a language up by file extension.
    pub fn by_extension(&self, ext: &str) -> Option<&Arc<Language>> {
        let ext = ext.trim_start_matches('.');
        self.by_extension.get(&ext.to_ascii_lowercase())
    }

    /// Language groups, in definition order.
    pub fn groups(&self) -> &[LanguageGroup] {
        &self.groups
    }

    /// The fallback language.
    pub fn unknown(&self) -> &Arc<Language> {
        &self.unknown
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

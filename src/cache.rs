//! Extracted-source cache.
//!
//! An explicit component injected into source navigation rather than ambient
//! singleton state, so tests can supply isolated temporary caches. Keys are
//! `(archive identity, fully-qualified class name)`; values point at the
//! extracted file on disk together with the scanned declaration line and doc
//! block, so repeated queries never re-extract.

use std::fs;
use std::path::PathBuf;

use dashmap::DashMap;
use tracing::warn;

use crate::error::{NavError, Result};

#[derive(Debug, Clone)]
pub struct ExtractedSource {
    pub path: PathBuf,
    pub line: Option<u32>,
    pub documentation: Option<String>,
}

pub struct SourceCache {
    dir: PathBuf,
    capacity: usize,
    entries: DashMap<(String, String), ExtractedSource>,
}

impl SourceCache {
    pub fn new(dir: PathBuf, capacity: usize) -> Result<Self> {
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            capacity,
            entries: DashMap::new(),
        })
    }

    /// Cached entry, if present and still intact. A cached file that has
    /// disappeared from disk is treated as corruption: the entry is dropped
    /// and the caller re-extracts.
    pub fn get(&self, archive: &str, class_name: &str) -> Option<ExtractedSource> {
        let key = (archive.to_string(), class_name.to_string());
        let entry = self.entries.get(&key)?.clone();
        if !entry.path.exists() {
            warn!(
                "{}",
                NavError::CacheCorruption {
                    class_name: class_name.to_string(),
                    path: entry.path.clone(),
                }
            );
            drop(entry);
            self.entries.remove(&key);
            return None;
        }
        Some(entry)
    }

    /// Write extracted content to the cache directory and register it.
    pub fn store(
        &self,
        archive: &str,
        class_name: &str,
        content: &str,
        line: Option<u32>,
        documentation: Option<String>,
    ) -> Result<ExtractedSource> {
        if self.entries.len() >= self.capacity {
            return Err(NavError::ResourceExhausted {
                capacity: self.capacity,
            });
        }
        let file_name = format!("{}.groovy-nav.java", sanitize(class_name));
        let path = self.dir.join(file_name);
        fs::write(&path, content)?;
        let entry = ExtractedSource {
            path,
            line,
            documentation,
        };
        self.entries.insert(
            (archive.to_string(), class_name.to_string()),
            entry.clone(),
        );
        Ok(entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn sanitize(class_name: &str) -> String {
    class_name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

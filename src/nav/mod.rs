//! Binary-to-source navigation.
//!
//! Translates a classpath hit (runtime class library or dependency jar) into
//! an openable source location by lazily extracting the matching entry from
//! a source archive into the injected cache. Declaration line and doc block
//! come from a best-effort scan of the extracted source; an empty result is
//! an allowed outcome, never a failure. All I/O here is blocking and bounded
//! by a deadline, so callers keep it off latency-sensitive query paths and
//! fail over to binary-only when the deadline passes.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use regex::Regex;
use tracing::{debug, warn};
use zip::ZipArchive;

use crate::cache::{ExtractedSource, SourceCache};
use crate::config::RuntimeDescriptor;
use crate::error::Result;
use crate::resolve::{LocationOrigin, SourceLocation};

pub struct SourceNavigator {
    cache: Arc<SourceCache>,
    deadline: Duration,
}

impl SourceNavigator {
    pub fn new(cache: Arc<SourceCache>, deadline: Duration) -> Self {
        Self { cache, deadline }
    }

    /// Source for a class owned by the host runtime, out of its bundled
    /// source archive (e.g. `src.zip`).
    pub fn runtime_source(
        &self,
        runtime: &RuntimeDescriptor,
        qualified_name: &str,
    ) -> Result<Option<SourceLocation>> {
        let Some(sources) = &runtime.sources else {
            debug!(qualified_name, "runtime has no bundled source archive");
            return Ok(None);
        };
        self.extract(sources, qualified_name, LocationOrigin::ExtractedRuntime)
    }

    /// Source for a class found in a dependency jar, via its companion
    /// `*-sources.jar` when one sits next to the binary.
    pub fn dependency_source(
        &self,
        jar: &Path,
        qualified_name: &str,
    ) -> Result<Option<SourceLocation>> {
        match sibling_sources_jar(jar) {
            Some(sources) => {
                self.extract(&sources, qualified_name, LocationOrigin::ExtractedDependency)
            }
            None => {
                debug!(
                    jar = %jar.display(),
                    qualified_name,
                    "no companion source archive"
                );
                Ok(None)
            }
        }
    }

    fn extract(
        &self,
        archive: &Path,
        qualified_name: &str,
        origin: LocationOrigin,
    ) -> Result<Option<SourceLocation>> {
        let archive_key = archive.to_string_lossy().into_owned();
        if let Some(hit) = self.cache.get(&archive_key, qualified_name) {
            return Ok(Some(location_from(&hit, qualified_name, origin)));
        }

        let started = Instant::now();
        let file = match File::open(archive) {
            Ok(file) => file,
            Err(e) => {
                warn!(archive = %archive.display(), "source archive unavailable: {e}");
                return Ok(None);
            }
        };
        let mut zip = match ZipArchive::new(file) {
            Ok(zip) => zip,
            Err(e) => {
                warn!(archive = %archive.display(), "unreadable source archive: {e}");
                return Ok(None);
            }
        };

        let rel = qualified_name.replace('.', "/");
        let candidates = [format!("{rel}.java"), format!("{rel}.groovy")];
        let mut entry_name: Option<String> = None;
        // Runtime archives prefix entries with the module name
        // (java.base/java/util/List.java), dependency jars do not.
        for name in zip.file_names() {
            if started.elapsed() > self.deadline {
                warn!(qualified_name, "source navigation deadline passed");
                return Ok(None);
            }
            if candidates
                .iter()
                .any(|c| name == c || name.ends_with(&format!("/{c}")))
            {
                entry_name = Some(name.to_string());
                break;
            }
        }
        let Some(entry_name) = entry_name else {
            debug!(qualified_name, archive = %archive.display(), "no matching source entry");
            return Ok(None);
        };

        let mut content = String::new();
        match zip.by_name(&entry_name).map(|mut e| e.read_to_string(&mut content)) {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                warn!(entry = entry_name.as_str(), "failed to read source entry: {e}");
                return Ok(None);
            }
            Err(e) => {
                warn!(entry = entry_name.as_str(), "failed to open source entry: {e}");
                return Ok(None);
            }
        }

        let simple = qualified_name.rsplit('.').next().unwrap_or(qualified_name);
        let (line, documentation) = scan_declaration(&content, simple);
        let stored = self
            .cache
            .store(&archive_key, qualified_name, &content, line, documentation)?;
        debug!(qualified_name, entry = entry_name.as_str(), "extracted source");
        Ok(Some(location_from(&stored, qualified_name, origin)))
    }
}

fn location_from(
    extracted: &ExtractedSource,
    qualified_name: &str,
    origin: LocationOrigin,
) -> SourceLocation {
    SourceLocation {
        uri: extracted.path.to_string_lossy().into_owned(),
        symbol_name: qualified_name.to_string(),
        line: extracted.line,
        documentation: extracted.documentation.clone(),
        origin,
    }
}

fn sibling_sources_jar(jar: &Path) -> Option<PathBuf> {
    let stem = jar.file_stem()?.to_str()?;
    let sources = jar.with_file_name(format!("{stem}-sources.jar"));
    sources.exists().then_some(sources)
}

/// Locate the type declaration line (0-based) and its attached doc block.
pub fn scan_declaration(content: &str, simple_name: &str) -> (Option<u32>, Option<String>) {
    let pattern = format!(
        r"\b(?:class|interface|enum|record|trait|@interface)\s+{}\b",
        regex::escape(simple_name)
    );
    let Ok(re) = Regex::new(&pattern) else {
        return (None, None);
    };
    let lines: Vec<&str> = content.lines().collect();
    for (idx, line) in lines.iter().enumerate() {
        if re.is_match(line) {
            return (Some(idx as u32), extract_doc_block(&lines, idx));
        }
    }
    (None, None)
}

/// Nearest preceding `/** … */` block, skipping blank lines and annotations.
/// Heuristic: returns `None` rather than failing when the shape is odd.
fn extract_doc_block(lines: &[&str], decl_idx: usize) -> Option<String> {
    let mut idx = decl_idx.checked_sub(1)?;
    loop {
        let line = lines.get(idx)?.trim();
        if line.is_empty() || line.starts_with('@') {
            idx = idx.checked_sub(1)?;
            continue;
        }
        if line.ends_with("*/") {
            break;
        }
        return None;
    }

    let end = idx;
    let mut start = end;
    loop {
        let line = lines.get(start)?.trim();
        if line.starts_with("/**") {
            break;
        }
        start = start.checked_sub(1)?;
    }

    let mut cleaned = Vec::new();
    for line in &lines[start..=end] {
        let mut text = line.trim();
        text = text.strip_prefix("/**").unwrap_or(text);
        text = text.strip_suffix("*/").unwrap_or(text);
        text = text.trim_start_matches('*').trim();
        if !text.is_empty() {
            cleaned.push(text.to_string());
        }
    }
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.join("\n"))
    }
}

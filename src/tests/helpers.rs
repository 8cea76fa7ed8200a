//! Shared test fixtures: synthetic trees, temp workspaces, archive fixtures.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::cache::SourceCache;
use crate::config::NavConfig;
use crate::position::TreeSpan;
use crate::service::NavigationService;
use crate::syntax::{GrammarTreeProducer, NodeClass, ParsedUnit, SyntaxNodeData, TreeProducer};

/// Node data for hand-built trees; callers wire children via the builder.
pub fn node(kind: &str, class: NodeClass, name: Option<&str>, span: TreeSpan) -> SyntaxNodeData {
    SyntaxNodeData {
        kind: kind.to_string(),
        class,
        name: name.map(|n| n.to_string()),
        qualified: None,
        multi_target: false,
        span,
        children: Vec::new(),
    }
}

pub fn parse(uri: &str, content: &str) -> ParsedUnit {
    GrammarTreeProducer::groovy()
        .parse(uri, content)
        .expect("fixture source must parse")
}

/// Service with a real producer and an isolated cache under `dir`.
pub fn service_in(dir: &TempDir, config: NavConfig) -> NavigationService {
    let cache = Arc::new(
        SourceCache::new(dir.path().join("cache"), config.cache_capacity)
            .expect("cache dir must be creatable"),
    );
    let producer: Arc<dyn TreeProducer> = Arc::new(GrammarTreeProducer::groovy());
    NavigationService::with_components(producer, config, cache)
}

/// Write a source file under the workspace root, returning its URI.
pub fn write_source(root: &Path, rel: &str, content: &str) -> String {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}

/// Write a zip archive with the given (entry name, content) pairs.
pub fn write_archive(path: &Path, entries: &[(&str, &str)]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let file = fs::File::create(path).unwrap();
    let mut writer = ZipWriter::new(file);
    for (name, content) in entries {
        writer
            .start_file(name.to_string(), SimpleFileOptions::default())
            .unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
}

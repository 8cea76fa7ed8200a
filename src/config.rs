//! Service configuration, loadable from TOML.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::graph::TraversalStrategy;

/// The host runtime's binary image and (optionally) its bundled source
/// archive, e.g. `$JAVA_HOME/lib/modules` and `$JAVA_HOME/lib/src.zip`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeDescriptor {
    /// Local path of the runtime image; binary-only results point here.
    pub image: PathBuf,

    /// Bundled source archive, when the installation ships one.
    pub sources: Option<PathBuf>,

    /// Package prefixes the runtime claims during classpath search.
    #[serde(default = "default_runtime_packages")]
    pub packages: Vec<String>,
}

fn default_runtime_packages() -> Vec<String> {
    vec![
        "java.".to_string(),
        "javax.".to_string(),
        "jdk.".to_string(),
        "groovy.".to_string(),
        "org.codehaus.groovy.".to_string(),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Which indexing traversal to use; both are kept in parity.
    pub traversal: TraversalStrategy,

    /// Below this many files, a change recompiles the whole owning context;
    /// above it, only the changed file plus anything stale.
    pub full_recompile_threshold: usize,

    /// Upper bound on one source-navigation attempt before failing over to
    /// binary-only.
    pub navigation_deadline_ms: u64,

    /// Where extracted sources land; defaults under the user cache dir.
    pub cache_dir: Option<PathBuf>,

    /// Maximum number of extracted sources kept.
    pub cache_capacity: usize,

    /// Classpath entries added to every context (jars or class directories).
    pub extra_classpath: Vec<PathBuf>,

    /// Host runtime description; absent means runtime references resolve to
    /// nothing.
    pub runtime: Option<RuntimeDescriptor>,

    /// Directory names skipped during workspace discovery.
    pub ignore_dirs: Vec<String>,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            traversal: TraversalStrategy::default(),
            full_recompile_threshold: 25,
            navigation_deadline_ms: 5_000,
            cache_dir: None,
            cache_capacity: 512,
            extra_classpath: Vec::new(),
            runtime: None,
            ignore_dirs: vec![
                ".git".to_string(),
                ".gradle".to_string(),
                "build".to_string(),
                "target".to_string(),
                "node_modules".to_string(),
            ],
        }
    }
}

impl NavConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: NavConfig = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    pub fn effective_cache_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.cache_dir {
            return Ok(dir.clone());
        }
        dirs::cache_dir()
            .map(|d| d.join("groovy-nav"))
            .ok_or_else(|| anyhow!("no cache directory available; set cache_dir explicitly"))
    }
}

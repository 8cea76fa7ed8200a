use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NavError {
    #[error("No syntax node at {line}:{character}")]
    NodeNotFound { line: u32, character: u32 },

    #[error("Invalid position {line}:{character}")]
    InvalidPosition { line: i64, character: i64 },

    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("Compilation of {uri} failed with {diagnostics} diagnostic(s)")]
    CompilationFailed { uri: String, diagnostics: usize },

    #[error("Syntax error at {line}:{column}: {reason}")]
    Syntax { line: u32, column: u32, reason: String },

    #[error("Source cache capacity exhausted ({capacity} entries)")]
    ResourceExhausted { capacity: usize },

    #[error("Corrupt cache entry for {class_name} (missing {path})")]
    CacheCorruption { class_name: String, path: PathBuf },

    #[error("Compilation context dependency cycle through '{0}'")]
    DependencyCycle(String),

    #[error("Parser error: {0}")]
    Parser(String),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, NavError>;

//! Shader source loading
//!
//! A stage is assembled from one or more files concatenated in order, so a
//! shared header (version line, common helpers) can be prepended to each
//! stage. Paths are resolved against the working directory first and then
//! against the configured search directories.

use std::fs;
use std::path::{Path, PathBuf};

use crate::render::{RenderError, RenderResult};

/// Pipeline stage a source belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex stage
    Vertex,
    /// Fragment stage
    Fragment,
}

/// Source text of one shader stage
#[derive(Debug, Clone)]
pub struct ShaderSource {
    /// Stage the source compiles for
    pub stage: ShaderStage,
    /// Full GLSL text
    pub source: String,
    /// Human readable origin used in diagnostics
    pub origin: String,
}

impl ShaderSource {
    /// Wrap in-memory source text
    pub fn inline(stage: ShaderStage, origin: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            stage,
            source: source.into(),
            origin: origin.into(),
        }
    }
}

/// Loads and concatenates stage sources from disk
#[derive(Debug, Clone)]
pub struct ShaderLoader {
    stage: ShaderStage,
    search_dirs: Vec<PathBuf>,
}

impl ShaderLoader {
    /// Create a loader for one stage
    pub fn new(stage: ShaderStage) -> Self {
        Self {
            stage,
            search_dirs: Vec::new(),
        }
    }

    /// Add a directory to search when a path does not exist as given
    pub fn with_search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dirs.push(dir.into());
        self
    }

    /// Load and concatenate the given files
    pub fn load<P: AsRef<Path>>(&self, paths: &[P]) -> RenderResult<ShaderSource> {
        if paths.is_empty() {
            return Err(RenderError::ShaderCompilation {
                name: format!("{:?}", self.stage),
                message: "no source files given".to_string(),
            });
        }

        let mut source = String::new();
        let mut origins = Vec::with_capacity(paths.len());
        for path in paths {
            let resolved = self.resolve(path.as_ref());
            log::debug!("Loading {:?} shader source from {}", self.stage, resolved.display());
            let text = fs::read_to_string(&resolved)?;
            source.push_str(&text);
            if !text.ends_with('\n') {
                source.push('\n');
            }
            origins.push(resolved.display().to_string());
        }

        Ok(ShaderSource {
            stage: self.stage,
            source,
            origin: origins.join(" + "),
        })
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.exists() {
            return path.to_path_buf();
        }
        self.search_dirs
            .iter()
            .map(|dir| dir.join(path))
            .find(|candidate| candidate.exists())
            .unwrap_or_else(|| path.to_path_buf())
    }
}

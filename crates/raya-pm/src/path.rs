//! Path resolution for local dependencies
//!
//! Handles resolution of local filesystem paths for monorepo and local package support.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during path resolution
#[derive(Debug, Error)]
pub enum PathError {
    /// Path does not exist
    #[error("Path does not exist: {0}")]
    PathNotFound(PathBuf),

    /// Path is not a directory
    #[error("Path is not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Missing raya.toml manifest
    #[error("Missing raya.toml in path: {0}")]
    MissingManifest(PathBuf),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid path (e.g., absolute when relative expected)
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Path traversal outside project root
    #[error("Path traversal outside project root: {0}")]
    PathTraversal(PathBuf),
}

/// Path dependency resolver
pub struct PathResolver {
    /// Project root directory
    project_root: PathBuf,
}

impl PathResolver {
    /// Create a new path resolver
    pub fn new(project_root: PathBuf) -> Self {
        // Canonicalize the project root to handle symlinks consistently
        let project_root = project_root
            .canonicalize()
            .unwrap_or(project_root);
        Self { project_root }
    }

    /// Resolve a relative path dependency
    ///
    /// # Arguments
    /// * `path` - Relative path from manifest location
    /// * `manifest_dir` - Directory containing the manifest file
    ///
    /// # Returns
    /// Absolute, canonicalized path to the dependency
    pub fn resolve(&self, path: &str, manifest_dir: &Path) -> Result<PathBuf, PathError> {
        // Parse the path
        let dep_path = Path::new(path);

        // Resolve relative to manifest directory
        let mut resolved = manifest_dir.join(dep_path);

        // Canonicalize the path
        resolved = resolved
            .canonicalize()
            .map_err(|_| PathError::PathNotFound(resolved.clone()))?;

        // Verify it's a directory
        if !resolved.is_dir() {
            return Err(PathError::NotADirectory(resolved));
        }

        // Check for raya.toml
        let manifest_path = resolved.join("raya.toml");
        if !manifest_path.exists() {
            return Err(PathError::MissingManifest(resolved));
        }

        // Verify it's within project bounds (prevent path traversal attacks)
        if !resolved.starts_with(&self.project_root) {
            return Err(PathError::PathTraversal(resolved));
        }

        Ok(resolved)
    }

    /// Resolve a path relative to the project root
    pub fn resolve_from_root(&self, path: &str) -> Result<PathBuf, PathError> {
        self.resolve(path, &self.project_root)
    }

    /// Check if a path exists and is a valid package directory
    pub fn validate(&self, path: &Path) -> Result<(), PathError> {
        if !path.exists() {
            return Err(PathError::PathNotFound(path.to_path_buf()));
        }

        if !path.is_dir() {
            return Err(PathError::NotADirectory(path.to_path_buf()));
        }

        let manifest_path = path.join("raya.toml");
        if !manifest_path.exists() {
            return Err(PathError::MissingManifest(path.to_path_buf()));
        }

        Ok(())
    }

    /// Get the manifest path for a package directory
    pub fn manifest_path(&self, package_dir: &Path) -> PathBuf {
        package_dir.join("raya.toml")
    }

    /// Get the source directory for a package
    pub fn source_dir(&self, package_dir: &Path) -> PathBuf {
        package_dir.join("src")
    }

    /// Normalize a path for cross-platform consistency
    pub fn normalize(path: &Path) -> PathBuf {
        let mut components = Vec::new();

        for component in path.components() {
            match component {
                std::path::Component::ParentDir => {
                    components.pop();
                }
                std::path::Component::CurDir => {}
                _ => components.push(component),
            }
        }

        components.iter().collect()
    }

    /// Convert an absolute path to a path relative to the project root
    pub fn make_relative(&self, absolute: &Path) -> Result<PathBuf, PathError> {
        // Canonicalize the input path to handle symlinks consistently
        let absolute = absolute
            .canonicalize()
            .map_err(|_| PathError::PathNotFound(absolute.to_path_buf()))?;

        absolute
            .strip_prefix(&self.project_root)
            .map(|p| p.to_path_buf())
            .map_err(|_| PathError::InvalidPath(format!("{:?} is not within project root", absolute)))
    }
}

/// Helper to find the project root by looking for raya.toml
pub fn find_project_root(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir;

    loop {
        let manifest = current.join("raya.toml");
        if manifest.exists() {
            return Some(current.to_path_buf());
        }

        current = current.parent()?;
    }
}

//! Source image discovery
//!
//! Lists the images of a source directory (or a single file) with extension
//! and exclusion filters.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions of decodable source images
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "bmp", "jpg", "jpeg", "jpe", "png", "webp", "gif", "tif", "tiff",
];

/// File scanner with configurable filters
pub struct FileScanner {
    root: PathBuf,
    extensions: Vec<String>,
    exclude_patterns: Vec<String>,
    recursive: bool,
}

impl FileScanner {
    /// Create a new file scanner rooted at the given path
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: Vec::new(),
            exclude_patterns: Vec::new(),
            recursive: false,
        }
    }

    /// Filter by file extensions, compared case-insensitively
    pub fn with_extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions = extensions.iter().map(|s| s.to_ascii_lowercase()).collect();
        self
    }

    /// Add patterns to exclude (glob patterns matched against the file name)
    pub fn exclude(mut self, patterns: &[&str]) -> Self {
        self.exclude_patterns = patterns.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Descend into subdirectories
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Scan and return matching files, sorted by path
    pub fn scan(&self) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Err(Error::directory_not_found(&self.root));
        }

        let mut walker = WalkDir::new(&self.root).min_depth(1);
        if !self.recursive {
            walker = walker.max_depth(1);
        }

        let mut files = Vec::new();

        for entry in walker
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !self.is_hidden(e.path()))
            .filter_map(|e| e.ok())
        {
            let path = entry.path();

            if !entry.file_type().is_file() {
                continue;
            }

            if !self.matches_extension(path) || self.should_exclude(path) {
                continue;
            }

            files.push(path.to_path_buf());
        }

        files.sort();
        Ok(files)
    }

    fn matches_extension(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .is_some_and(|ext| self.extensions.iter().any(|e| *e == ext))
    }

    fn is_hidden(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with('.') && n != "." && n != "..")
            .unwrap_or(false)
    }

    fn should_exclude(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        self.exclude_patterns
            .iter()
            .filter_map(|pattern| glob::Pattern::new(pattern).ok())
            .any(|pattern| pattern.matches(name))
    }
}

/// Collect source images from a directory, or accept a single image file
pub fn collect_images(source: &Path) -> Result<Vec<PathBuf>> {
    if source.is_file() {
        let scanner = FileScanner::new(".").with_extensions(IMAGE_EXTENSIONS);
        return if scanner.matches_extension(source) {
            Ok(vec![source.to_path_buf()])
        } else {
            Err(Error::validation(format!(
                "Not a supported image file: {}",
                source.display()
            ))
            .with_suggestion(format!("Supported extensions: {}", IMAGE_EXTENSIONS.join(", "))))
        };
    }

    if !source.exists() {
        return Err(Error::file_not_found(source));
    }

    FileScanner::new(source)
        .with_extensions(IMAGE_EXTENSIONS)
        .scan()
}

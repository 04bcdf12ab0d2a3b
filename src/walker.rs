//! Filesystem walker for the ingest pipeline.
//!
//! Recursively lists files under a root with `walkdir`, keeps those whose
//! relative path ends with one of the requested suffixes, and drops
//! anything matching the configured exclude globs. Results are sorted by
//! relative path so every run visits files in the same order.

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::warn;
use walkdir::WalkDir;

use vectordocs_core::ingest::{ExtensionFilter, FileWalker, SourceFile};
use vectordocs_core::Error;

use crate::config::IngestConfig;

pub struct FsWalker {
    exclude: GlobSet,
    follow_symlinks: bool,
}

impl FsWalker {
    pub fn new(exclude_globs: &[String], follow_symlinks: bool) -> Result<Self> {
        Ok(Self {
            exclude: build_globset(exclude_globs)?,
            follow_symlinks,
        })
    }

    pub fn from_config(config: &IngestConfig) -> Result<Self> {
        Self::new(&config.exclude_globs, config.follow_symlinks)
    }

    fn scan(&self, root: &Path, filter: &ExtensionFilter) -> vectordocs_core::Result<Vec<SourceFile>> {
        if !root.is_dir() {
            return Err(Error::NotFound {
                path: root.to_path_buf(),
            });
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(root).follow_links(self.follow_symlinks) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable path");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative = path.strip_prefix(root).unwrap_or(path);
            let rel_str = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            if self.exclude.is_match(&rel_str) || !filter.matches(&rel_str) {
                continue;
            }

            let last_modified = entry
                .metadata()
                .ok()
                .and_then(|m| m.modified().ok())
                .map(DateTime::<Utc>::from);

            files.push(SourceFile {
                path: path.to_path_buf(),
                relative_path: rel_str,
                last_modified,
            });
        }

        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        Ok(files)
    }
}

#[async_trait]
impl FileWalker for FsWalker {
    async fn list_files(
        &self,
        root: &Path,
        filter: &ExtensionFilter,
    ) -> vectordocs_core::Result<Vec<SourceFile>> {
        self.scan(root, filter)
    }

    /// Reads bytes and decodes lossily, so files with stray non-UTF-8
    /// bytes are still indexed.
    async fn read_to_string(&self, file: &SourceFile) -> Result<String> {
        let bytes = tokio::fs::read(&file.path)
            .await
            .with_context(|| format!("Failed to read {}", file.path.display()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).with_context(|| format!("Invalid exclude glob: {}", pattern))?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn tree() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("src/nested")).unwrap();
        fs::create_dir_all(root.join("obj")).unwrap();
        fs::write(root.join("src/b.cs"), "class B { }").unwrap();
        fs::write(root.join("src/nested/a.cs"), "class A { }").unwrap();
        fs::write(root.join("app.js"), "let x = 1;").unwrap();
        fs::write(root.join("bundle.cjs"), "module.exports = {};").unwrap();
        fs::write(root.join("README.md"), "# readme").unwrap();
        fs::write(root.join("obj/gen.cs"), "class Gen { }").unwrap();
        tmp
    }

    fn relative(files: &[SourceFile]) -> Vec<&str> {
        files.iter().map(|f| f.relative_path.as_str()).collect()
    }

    #[tokio::test]
    async fn lists_matching_files_in_lexical_order() {
        let tmp = tree();
        let walker = FsWalker::new(&[], false).unwrap();
        let files = walker
            .list_files(tmp.path(), &ExtensionFilter::parse(".cs"))
            .await
            .unwrap();
        assert_eq!(relative(&files), vec!["obj/gen.cs", "src/b.cs", "src/nested/a.cs"]);
        assert!(files.iter().all(|f| f.last_modified.is_some()));
    }

    #[tokio::test]
    async fn suffix_match_is_plain_ends_with() {
        let tmp = tree();
        let walker = FsWalker::new(&[], false).unwrap();
        let files = walker
            .list_files(tmp.path(), &ExtensionFilter::parse(".js"))
            .await
            .unwrap();
        assert_eq!(relative(&files), vec!["app.js", "bundle.cjs"]);
    }

    #[tokio::test]
    async fn exclude_globs_are_applied() {
        let tmp = tree();
        let walker = FsWalker::new(&["obj/**".to_string()], false).unwrap();
        let files = walker
            .list_files(tmp.path(), &ExtensionFilter::parse(".cs"))
            .await
            .unwrap();
        assert_eq!(relative(&files), vec!["src/b.cs", "src/nested/a.cs"]);
    }

    #[tokio::test]
    async fn missing_root_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let walker = FsWalker::new(&[], false).unwrap();
        let err = walker
            .list_files(&tmp.path().join("gone"), &ExtensionFilter::parse(".cs"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn reads_non_utf8_lossily() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("odd.cs"), b"int x;\xff\n").unwrap();
        let walker = FsWalker::new(&[], false).unwrap();
        let files = walker
            .list_files(tmp.path(), &ExtensionFilter::parse(".cs"))
            .await
            .unwrap();
        let text = walker.read_to_string(&files[0]).await.unwrap();
        assert!(text.starts_with("int x;"));
    }

    #[test]
    fn invalid_glob_is_rejected() {
        assert!(FsWalker::new(&["[".to_string()], false).is_err());
    }
}

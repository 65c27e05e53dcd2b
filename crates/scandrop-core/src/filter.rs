use std::path::Path;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

/// Pattern configuration for the watch root. Immutable after startup.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    /// Base-name globs a file must match to qualify. Empty means match all.
    pub include: Vec<String>,
    /// Base-name globs that disqualify a file. These win over includes.
    pub exclude: Vec<String>,
    /// Whether glob matching respects case.
    pub case_sensitive: bool,
    /// Whether events for directories are dropped outright.
    pub ignore_directories: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            exclude: vec![
                ".*".to_string(),
                "*.lock".to_string(),
                "*.tmp".to_string(),
                "*.git".to_string(),
            ],
            case_sensitive: true,
            ignore_directories: true,
        }
    }
}

/// Compiled accept/reject decisions for watched paths.
///
/// Decisions are a pure function of the base name and the directory flag;
/// file contents are never consulted.
#[derive(Debug)]
pub struct PathFilter {
    include: GlobSet,
    exclude: GlobSet,
    include_all: bool,
    ignore_directories: bool,
}

impl PathFilter {
    /// Compile the configured patterns. Invalid globs are rejected up front
    /// rather than silently skipped.
    pub fn new(config: &FilterConfig) -> Result<Self, globset::Error> {
        Ok(Self {
            include: Self::build_set(&config.include, config.case_sensitive)?,
            exclude: Self::build_set(&config.exclude, config.case_sensitive)?,
            include_all: config.include.is_empty(),
            ignore_directories: config.ignore_directories,
        })
    }

    fn build_set(patterns: &[String], case_sensitive: bool) -> Result<GlobSet, globset::Error> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = GlobBuilder::new(pattern)
                .case_insensitive(!case_sensitive)
                .build()?;
            builder.add(glob);
        }
        builder.build()
    }

    /// Whether an event for `path` qualifies for processing.
    pub fn accepts(&self, path: &Path, is_directory: bool) -> bool {
        if is_directory && self.ignore_directories {
            return false;
        }
        let Some(name) = path.file_name() else {
            return false;
        };
        if self.exclude.is_match(name) {
            return false;
        }
        self.include_all || self.include.is_match(name)
    }
}

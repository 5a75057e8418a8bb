use crate::types::TestCase;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// File extensions that pair a test program with its golden output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extensions {
    pub source: String,
    pub expect: String,
}

impl Default for Extensions {
    fn default() -> Self {
        Self {
            source: "bite".to_string(),
            expect: "expected".to_string(),
        }
    }
}

/// Walk `root` recursively and yield a test case for every file with the source extension.
///
/// Entries are visited sorted by file name, so two walks over the same tree yield the
/// same order. Symlinks are followed; a link cycle is reported and skipped. The
/// expectation file is not checked here: a missing one is reported when the case is run,
/// so it shows up as a failure instead of silently shrinking the suite.
pub fn discover(root: PathBuf, extensions: Extensions) -> impl Iterator<Item = TestCase> {
    WalkDir::new(&root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("skipping unreadable entry: {e}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter_map(move |entry| case_for(&root, entry.path(), &extensions))
}

/// Build the test case for `path`, or `None` if it is not a test program.
pub fn case_for(root: &Path, path: &Path, extensions: &Extensions) -> Option<TestCase> {
    let ext = path.extension()?;
    if ext != extensions.source.as_str() {
        return None;
    }
    let stem = path.file_stem()?.to_string_lossy().into_owned();
    let relative = path.strip_prefix(root).unwrap_or(path);
    Some(TestCase {
        name: relative.with_extension("").to_string_lossy().into_owned(),
        stem,
        source: path.to_path_buf(),
        expectation: path.with_extension(&extensions.expect),
    })
}

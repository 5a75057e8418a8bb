use crate::backend::DEFAULT_TIMEOUT;
use crate::discovery::Extensions;
use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_ROOT: &str = "tests";

#[cfg(windows)]
pub const DEFAULT_EXECUTABLE: &str = "cmake-build-debug/bite.exe";
#[cfg(not(windows))]
pub const DEFAULT_EXECUTABLE: &str = "cmake-build-debug/bite";

/// Optional YAML file, e.g.
///
/// ```yaml
/// Executable: ../cmake-build-debug/bite
/// Timeout: 2.5
/// SourceExtension: bite
/// ExpectExtension: expected
/// LogDir: logs
/// ```
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct FileConfig {
    #[serde(alias = "BitePath")]
    pub executable: Option<String>,
    pub timeout: Option<f64>,
    pub source_extension: Option<String>,
    pub expect_extension: Option<String>,
    pub log_dir: Option<String>,
}

/// Values given on the command line; they win over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub root: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub executable: Option<PathBuf>,
    pub timeout: Option<Duration>,
    pub source_ext: Option<String>,
    pub expect_ext: Option<String>,
    pub log_dir: Option<PathBuf>,
}

/// Fully resolved settings for one harness run.
#[derive(Debug, Clone, PartialEq)]
pub struct HarnessConfig {
    pub root: PathBuf,
    pub executable: PathBuf,
    pub timeout: Duration,
    pub extensions: Extensions,
    pub log_dir: PathBuf,
}

/// Parse a timeout in seconds; fractions are allowed, zero and negatives are not.
pub fn parse_timeout(s: &str) -> Result<Duration, String> {
    let secs: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("'{s}' is not a number of seconds"))?;
    seconds_to_duration(secs)
}

fn seconds_to_duration(secs: f64) -> Result<Duration, String> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(format!("timeout must be a positive number of seconds, got {secs}"));
    }
    Duration::try_from_secs_f64(secs).map_err(|e| format!("invalid timeout {secs}: {e}"))
}

fn normalize_ext(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_string()
}

/// Relative paths in a config file are taken relative to the file itself.
fn resolve_path_relative_to_yaml(path: &str, yaml_file_path: &Path) -> PathBuf {
    let path_buf = Path::new(path.trim());
    if path_buf.is_absolute() {
        return path_buf.to_path_buf();
    }
    match yaml_file_path.parent() {
        Some(dir) => dir.join(path_buf),
        None => path_buf.to_path_buf(),
    }
}

pub fn load_file_config(path: &Path) -> Result<FileConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("could not read config file {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(FileConfig::default());
    }
    serde_yaml::from_str(&content)
        .with_context(|| format!("invalid YAML in config file {}", path.display()))
}

impl HarnessConfig {
    /// Merge command line, config file and built-in defaults, in that order of priority.
    pub fn resolve(overrides: Overrides) -> Result<Self> {
        let (file, file_path) = match &overrides.config {
            Some(path) => (load_file_config(path)?, Some(path.as_path())),
            None => (FileConfig::default(), None),
        };
        let from_file = |value: &Option<String>| -> Option<PathBuf> {
            match (value, file_path) {
                (Some(v), Some(yaml)) => Some(resolve_path_relative_to_yaml(v, yaml)),
                _ => None,
            }
        };

        let executable = overrides
            .executable
            .or_else(|| from_file(&file.executable))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_EXECUTABLE));

        let timeout = match (overrides.timeout, file.timeout) {
            (Some(t), _) => t,
            (None, Some(secs)) => seconds_to_duration(secs).map_err(|e| anyhow!(e))?,
            (None, None) => DEFAULT_TIMEOUT,
        };

        let defaults = Extensions::default();
        let extensions = Extensions {
            source: normalize_ext(
                &overrides
                    .source_ext
                    .or(file.source_extension)
                    .unwrap_or(defaults.source),
            ),
            expect: normalize_ext(
                &overrides
                    .expect_ext
                    .or(file.expect_extension)
                    .unwrap_or(defaults.expect),
            ),
        };
        if extensions.source.is_empty() || extensions.expect.is_empty() {
            return Err(anyhow!("file extensions must not be empty"));
        }
        if extensions.source == extensions.expect {
            return Err(anyhow!(
                "source and expectation extensions are both '{}'",
                extensions.source
            ));
        }

        let log_dir = overrides
            .log_dir
            .or_else(|| from_file(&file.log_dir))
            .unwrap_or_else(|| PathBuf::from("."));

        let root = overrides
            .root
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ROOT));
        if !root.is_dir() {
            return Err(anyhow!("test directory {} does not exist", root.display()));
        }

        Ok(Self {
            root,
            executable,
            timeout,
            extensions,
            log_dir,
        })
    }
}

use crate::types::{Summary, TestCase, Verdict, VerdictKind};
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use colored::Colorize;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Which per-case lines go to the console while the suite runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Echo {
    #[default]
    All,
    FailuresOnly,
    Silent,
}

/// Context written at the top of every log file.
#[derive(Debug, Clone)]
pub struct LogHeader {
    pub root: PathBuf,
    pub executable: PathBuf,
    pub timeout: Duration,
}

/// Owns the failure log for a whole run and keeps the pass/fail tally.
///
/// The log is opened by [`Reporter::create`] and closed by [`Reporter::summarize`]; if the
/// run is abandoned early the file is closed when the reporter is dropped.
#[derive(Debug)]
pub struct Reporter {
    log: File,
    summary: Summary,
    echo: Echo,
}

/// `test_log_20261018_142501_123.txt`, from the harness start time.
pub fn log_file_name(started: &DateTime<Local>, attempt: u32) -> String {
    let stamp = started.format("%Y%m%d_%H%M%S_%3f");
    if attempt == 0 {
        format!("test_log_{stamp}.txt")
    } else {
        format!("test_log_{stamp}_{attempt}.txt")
    }
}

/// Create a fresh log file in `dir`, never reusing an existing name.
fn open_new_log(dir: &Path, started: &DateTime<Local>) -> Result<(File, PathBuf)> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("could not create log directory {}", dir.display()))?;
    let mut attempt = 0;
    loop {
        let path = dir.join(log_file_name(started, attempt));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((file, path)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("could not open log file {}", path.display()));
            }
        }
    }
}

impl Reporter {
    pub fn create(log_dir: &Path, header: &LogHeader, echo: Echo) -> Result<Self> {
        let started = Local::now();
        let (log, log_path) = open_new_log(log_dir, &started)?;
        debug!("writing failures to {}", log_path.display());
        let mut reporter = Self {
            log,
            summary: Summary {
                log_path,
                ..Summary::default()
            },
            echo,
        };
        let text = format!(
            "bite-test run started {}\nroot: {}\nexecutable: {}\ntimeout: {:.3}s\n\n",
            started.to_rfc3339(),
            header.root.display(),
            header.executable.display(),
            header.timeout.as_secs_f64()
        );
        reporter.write_log(&text)?;
        Ok(reporter)
    }

    pub fn log_path(&self) -> &Path {
        &self.summary.log_path
    }

    pub fn record(&mut self, case: &TestCase, verdict: &Verdict) -> Result<()> {
        if verdict.passed() {
            self.record_success(case);
            Ok(())
        } else {
            self.record_failure(case, verdict)
        }
    }

    pub fn record_success(&mut self, case: &TestCase) {
        self.summary.total += 1;
        self.summary.passed += 1;
        if self.echo == Echo::All {
            println!("{}", render_case_line(case, &Verdict::Passed));
        }
    }

    /// The entry is flushed to the log before the failure is counted.
    pub fn record_failure(&mut self, case: &TestCase, verdict: &Verdict) -> Result<()> {
        let entry = render_log_entry(case, verdict);
        self.write_log(&entry)?;
        self.summary.total += 1;
        self.summary.failed += 1;
        *self
            .summary
            .failures_by_kind
            .entry(verdict.kind())
            .or_default() += 1;
        if self.echo != Echo::Silent {
            println!("{}", render_case_line(case, verdict));
        }
        Ok(())
    }

    /// Write the totals, close the log and hand back the summary.
    pub fn summarize(mut self) -> Result<Summary> {
        let mut footer = format!(
            "Total: {}, Passed: {}, Failed: {}\n",
            self.summary.total, self.summary.passed, self.summary.failed
        );
        for (kind, count) in &self.summary.failures_by_kind {
            footer.push_str(&format!("  {kind}: {count}\n"));
        }
        self.write_log(&footer)?;
        self.log
            .sync_all()
            .with_context(|| format!("could not flush {}", self.summary.log_path.display()))?;
        let Reporter { log, summary, .. } = self;
        drop(log);
        Ok(summary)
    }

    fn write_log(&mut self, text: &str) -> Result<()> {
        self.log
            .write_all(text.as_bytes())
            .and_then(|()| self.log.flush())
            .with_context(|| format!("could not write to {}", self.summary.log_path.display()))
    }
}

/// One log entry, terminated by a blank line.
pub fn render_log_entry(case: &TestCase, verdict: &Verdict) -> String {
    let mut out = format!("[{}] {}\n", verdict.kind(), case.name);
    out.push_str(&format!("source: {}\n", case.source.display()));
    match verdict {
        Verdict::Passed => {}
        Verdict::RuntimeError { stderr, status } => {
            if let Some(code) = status {
                out.push_str(&format!("exit code: {code}\n"));
            }
            out.push_str("stderr:\n");
            push_block(&mut out, stderr);
        }
        Verdict::Mismatch { expected, actual } => {
            out.push_str("expected:\n");
            push_block(&mut out, expected);
            out.push_str("actual:\n");
            push_block(&mut out, actual);
        }
        Verdict::Timeout { limit } => {
            out.push_str(&format!(
                "killed after {:.3}s without finishing\n",
                limit.as_secs_f64()
            ));
        }
        Verdict::LaunchFailure { reason } => {
            out.push_str(&format!("{reason}\n"));
        }
        Verdict::MissingExpectation { path } => {
            out.push_str(&format!("no expectation file at {}\n", path.display()));
        }
        Verdict::UnreadableExpectation { path, reason } => {
            out.push_str(&format!("cannot read {}: {reason}\n", path.display()));
        }
    }
    out.push('\n');
    out
}

fn push_block(out: &mut String, text: &str) {
    out.push_str(text);
    if !text.ends_with('\n') {
        out.push('\n');
    }
}

pub fn render_case_line(case: &TestCase, verdict: &Verdict) -> String {
    match verdict.kind() {
        VerdictKind::Passed => format!("{} {}", "[OK]".green().bold(), case.name.green()),
        kind => format!(
            "{} {} ({})",
            "[FAIL]".red().bold(),
            case.name.red().bold(),
            kind
        ),
    }
}

pub fn render_summary(summary: &Summary) -> String {
    let mut out = format!(
        "Total: {}, Passed: {}, Failed: {}",
        summary.total,
        summary.passed.to_string().green(),
        if summary.failed > 0 {
            summary.failed.to_string().red().bold().to_string()
        } else {
            summary.failed.to_string().green().to_string()
        }
    );
    out.push('\n');
    if !summary.all_passed() {
        let breakdown: Vec<String> = summary
            .failures_by_kind
            .iter()
            .map(|(kind, count)| format!("{kind}: {count}"))
            .collect();
        out.push_str(&format!("  {}\n", breakdown.join(", ")));
        out.push_str(&format!(
            "See {} for details\n",
            summary.log_path.display().to_string().bold()
        ));
    }
    out
}

pub fn print_summary(summary: &Summary) {
    print!("{}", render_summary(summary));
}

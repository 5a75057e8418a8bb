use anyhow::Result;
use bite_test::backend::ExternalBackend;
use bite_test::config::{HarnessConfig, Overrides, parse_timeout};
use bite_test::discovery::discover;
use bite_test::engine::run_cases;
use bite_test::report::{Echo, LogHeader, Reporter, print_summary};
use clap::Parser;
use colored::control::set_override as set_color_override;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Parser, Debug, Clone)]
#[command(
    version,
    about = "Run every bite test program under a directory and compare its output with the golden file"
)]
struct Cli {
    // ROOT: directory searched recursively for test programs
    #[arg(value_name = "ROOT")]
    root: Option<PathBuf>,

    #[arg(long, value_name = "SECONDS", value_parser = parse_timeout,
          help = "Per-test wall-clock limit [default: 4]")]
    timeout: Option<Duration>,

    #[arg(long = "bite-path", value_name = "PATH", visible_alias = "executable",
          help = "Interpreter under test")]
    bite_path: Option<PathBuf>,

    #[arg(long = "source-ext", value_name = "EXT", help = "Extension of test programs [default: bite]")]
    source_ext: Option<String>,

    #[arg(long = "expect-ext", value_name = "EXT",
          help = "Extension of expected-output files [default: expected]")]
    expect_ext: Option<String>,

    #[arg(long = "log-dir", value_name = "DIR", help = "Where the failure log is written [default: .]")]
    log_dir: Option<PathBuf>,

    #[arg(long, value_name = "FILE", help = "YAML file with default settings")]
    config: Option<PathBuf>,

    #[arg(short = 'q', long = "silent", help = "Only print the summary")]
    silent: bool,

    #[arg(short = 'p', long = "hide-passes", help = "Only print failing tests")]
    hide_passes: bool,

    #[arg(long = "no-color", help = "Disable colored output")]
    no_color: bool,

    #[arg(short = 'v', long = "verbose", help = "Log progress details")]
    verbose: bool,
}

fn display_path(path: &Path) -> String {
    match std::fs::canonicalize(path) {
        Ok(p) => p.to_string_lossy().into_owned(),
        Err(_) => path.display().to_string(),
    }
}

fn resolve_executable_path(cmd: &Path) -> String {
    if cmd.components().count() > 1 {
        return display_path(cmd);
    }
    match which::which(cmd) {
        Ok(p) => p.to_string_lossy().into_owned(),
        Err(_) => cmd.display().to_string(),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        std::env::var("RUST_LOG").unwrap_or_else(|_| "bite_test=info".to_string())
    } else {
        std::env::var("RUST_LOG").unwrap_or_else(|_| "bite_test=warn".to_string())
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if cli.no_color {
        set_color_override(false);
    }

    let echo = if cli.silent {
        Echo::Silent
    } else if cli.hide_passes {
        Echo::FailuresOnly
    } else {
        Echo::All
    };

    let config = match HarnessConfig::resolve(Overrides {
        root: cli.root,
        config: cli.config,
        executable: cli.bite_path,
        timeout: cli.timeout,
        source_ext: cli.source_ext,
        expect_ext: cli.expect_ext,
        log_dir: cli.log_dir,
    }) {
        Ok(config) => config,
        Err(e) => {
            error!("{e:#}");
            std::process::exit(2);
        }
    };

    info!(
        "{} {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );
    info!("test root: {}", display_path(&config.root));
    info!("executable: {}", resolve_executable_path(&config.executable));
    info!("timeout: {:?}", config.timeout);

    let header = LogHeader {
        root: config.root.clone(),
        executable: config.executable.clone(),
        timeout: config.timeout,
    };
    let mut reporter = match Reporter::create(&config.log_dir, &header, echo) {
        Ok(reporter) => reporter,
        Err(e) => {
            error!("{e:#}");
            std::process::exit(2);
        }
    };
    info!("failure log: {}", reporter.log_path().display());

    let backend = ExternalBackend::new(config.executable.clone(), config.timeout);
    let cases = discover(config.root.clone(), config.extensions.clone());
    if let Err(e) = run_cases(&backend, cases, &mut reporter) {
        error!("{e:#}");
        drop(reporter);
        std::process::exit(2);
    }
    let summary = match reporter.summarize() {
        Ok(summary) => summary,
        Err(e) => {
            error!("{e:#}");
            std::process::exit(2);
        }
    };

    if summary.total == 0 {
        warn!(
            "no *.{} files found under {}",
            config.extensions.source,
            config.root.display()
        );
    }
    print_summary(&summary);

    if !summary.all_passed() {
        std::process::exit(1);
    }
    Ok(())
}

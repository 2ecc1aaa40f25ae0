//! unpkg CLI - extract installer packages from the command line

pub mod progress;

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;

use crate::config::UnpkgConfig;
use crate::driver;
use crate::notify;
use progress::{PACKAGE, print_done, print_step, print_summary};

#[derive(Parser)]
#[command(name = "unpkg")]
#[command(version, about = "Extract .pkg and .mpkg installer packages without installing them", long_about = None)]
struct Cli {
    /// Packages to extract (.pkg files, .pkg bundles or .mpkg metapackages)
    #[arg(required = true)]
    packages: Vec<PathBuf>,
}

impl Cli {
    /// Extract every package. Per-package failures are reported, not returned.
    fn execute(self) -> anyhow::Result<()> {
        let config = UnpkgConfig::load()?;
        let notifier = notify::from_config(&config.notifications);

        let started = Instant::now();
        let summary = driver::run_with_progress(
            &self.packages,
            &config,
            notifier.as_ref(),
            &|index, total, path| {
                let name = path
                    .file_name()
                    .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().to_string());
                print_step(index + 1, total, PACKAGE, &format!("Extracting {name}..."));
            },
        );

        print_summary(summary.succeeded(), summary.failed());
        print_done(started.elapsed());
        Ok(())
    }
}

/// Run the unpkg CLI
pub fn run_cli() -> anyhow::Result<()> {
    // Setup logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    cli.execute()
}

/// Run the CLI on explicit arguments (`args[0]` is the program name).
pub fn run_cli_with<I, T>(args: I) -> anyhow::Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::try_parse_from(args)?.execute()
}

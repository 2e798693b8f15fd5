//! Pass commands and the options they share

use std::path::PathBuf;

use anyhow::Result;
use cardline_core::{PacingPolicy, PassSummary, ProgressContext};

pub mod download;
pub mod publish;

/// Effective run settings: config file values with CLI overrides applied
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub input_file: PathBuf,
    pub output_dir: PathBuf,
    pub image_dir: PathBuf,
    pub client_id: Option<String>,
    pub fixup: bool,
    pub pacing: PacingPolicy,
    pub scryfall_url: String,
    pub imgur_url: String,
}

/// Summary table on a TTY, one log line otherwise
fn report(summary: &PassSummary, progress: &ProgressContext) {
    if progress.is_tty() {
        summary.print();
    } else {
        summary.log();
    }
}

/// Download, then publish.
///
/// The client id is checked first so a run that cannot publish never spends
/// a download pass.
pub fn run_all(opts: &RunOptions, progress: &ProgressContext) -> Result<()> {
    publish::require_client_id(opts)?;
    download::run(opts, progress)?;
    publish::run(opts, progress)?;
    log::info!("Card images uploaded to Imgur; links are in the results table");
    Ok(())
}

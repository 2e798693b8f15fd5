//! Publish pass: download results → Imgur links

use anyhow::{Context, Result};
use cardline_core::{
    Pacer, Pass, PassPaths, PassSummary, ProgressContext, run_publish, run_publish_fixup,
};
use cardline_imgur::ImgurClient;

use super::{RunOptions, report};

/// The Imgur client id, or an error telling the operator where to put one
pub fn require_client_id(opts: &RunOptions) -> Result<&str> {
    opts.client_id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .context(
            "Imgur client id required for publish: pass --client-id, set IMGUR_CLIENT_ID, \
             or add [imgur] client_id to cardline.toml",
        )
}

pub fn run(opts: &RunOptions, progress: &ProgressContext) -> Result<PassSummary> {
    let client_id = require_client_id(opts)?;
    let paths = PassPaths::for_pass(Pass::Publish, &opts.input_file, &opts.output_dir)?;
    let publisher = ImgurClient::new(opts.imgur_url.as_str(), client_id);
    let mut pacer = Pacer::new(opts.pacing);

    let summary = if opts.fixup {
        run_publish_fixup(&paths, &opts.image_dir, &publisher, &mut pacer, progress)?
    } else {
        run_publish(&paths, &publisher, &mut pacer, progress)?
    };
    report(&summary, progress);
    Ok(summary)
}

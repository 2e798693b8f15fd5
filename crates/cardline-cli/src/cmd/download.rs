//! Download pass: card list → Scryfall → local images

use anyhow::Result;
use cardline_core::{
    Pacer, Pass, PassPaths, PassSummary, ProgressContext, run_download, run_download_fixup,
};
use cardline_scryfall::{ImageDownloader, ScryfallClient};

use super::{RunOptions, report};

pub fn run(opts: &RunOptions, progress: &ProgressContext) -> Result<PassSummary> {
    let paths = PassPaths::for_pass(Pass::Download, &opts.input_file, &opts.output_dir)?;
    let resolver = ScryfallClient::new(opts.scryfall_url.as_str());
    let fetcher = ImageDownloader::new(&opts.image_dir);
    let mut pacer = Pacer::new(opts.pacing);

    let summary = if opts.fixup {
        run_download_fixup(&paths, &resolver, &fetcher, &mut pacer, progress)?
    } else {
        run_download(&paths, &resolver, &fetcher, &mut pacer, progress)?
    };
    report(&summary, progress);
    Ok(summary)
}

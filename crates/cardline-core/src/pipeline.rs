//! Row pipeline: read a table, run each row through a stage, split the
//! outcomes into a results table and an error table.
//!
//! Two passes share the same loop:
//!
//! 1. Download: card list → resolve artwork → fetch image → `ImagePath`
//! 2. Publish: download results → upload image → `ImgurUri`
//!
//! Every input row lands in exactly one of the two output tables. Row
//! failures are recorded and the run continues; only table I/O failures
//! abort it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use indicatif::ProgressBar;

use crate::card::{CardKey, ImageLocation};
use crate::error::RowError;
use crate::pacing::Pacer;
use crate::progress::ProgressContext;
use crate::summary::{PassStats, PassSummary};
use crate::table::{
    self, CARD_NAME, CardRow, ERROR_HEADER, IMAGE_PATH, IMGUR_URI, InputLayout, SET_CODE,
    TableSink,
};

/// Card database lookup: (name, set) → artwork location
pub trait Resolver {
    fn resolve(&self, card: &CardKey) -> Result<ImageLocation, RowError>;
}

/// Downloads artwork to a deterministic local file
pub trait Fetcher {
    /// Create whatever local directories `fetch` writes into.
    fn prepare(&self) -> io::Result<()> {
        Ok(())
    }

    fn fetch(&self, card: &CardKey, location: &ImageLocation) -> Result<PathBuf, RowError>;
}

/// Uploads a local image and returns its hosted link
pub trait Publisher {
    fn publish(&self, image: &Path) -> Result<String, RowError>;
}

/// Per-row work of one pass; `Ok` is the value for the results table.
pub trait RowStage {
    fn process(&mut self, row: &CardRow) -> Result<String, RowError>;
}

/// Resolve then fetch
pub struct DownloadStage<'a, R, F> {
    resolver: &'a R,
    fetcher: &'a F,
}

impl<'a, R: Resolver, F: Fetcher> DownloadStage<'a, R, F> {
    pub fn new(resolver: &'a R, fetcher: &'a F) -> Self {
        Self { resolver, fetcher }
    }
}

impl<R: Resolver, F: Fetcher> RowStage for DownloadStage<'_, R, F> {
    fn process(&mut self, row: &CardRow) -> Result<String, RowError> {
        let location = self.resolver.resolve(&row.card)?;
        log::debug!("{}: resolved to {location}", row.card);
        let path = self.fetcher.fetch(&row.card, &location)?;
        Ok(path.display().to_string())
    }
}

/// Upload the row's image path
pub struct PublishStage<'a, P> {
    publisher: &'a P,
}

impl<'a, P: Publisher> PublishStage<'a, P> {
    pub fn new(publisher: &'a P) -> Self {
        Self { publisher }
    }
}

impl<P: Publisher> RowStage for PublishStage<'_, P> {
    fn process(&mut self, row: &CardRow) -> Result<String, RowError> {
        let image = row.payload.as_deref().unwrap_or_default();
        self.publisher.publish(Path::new(image))
    }
}

/// The two pipeline passes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Download,
    Publish,
}

impl Pass {
    pub fn label(self) -> &'static str {
        match self {
            Self::Download => "download",
            Self::Publish => "publish",
        }
    }

    /// Column holding the successful output value
    pub fn result_column(self) -> &'static str {
        match self {
            Self::Download => IMAGE_PATH,
            Self::Publish => IMGUR_URI,
        }
    }

    pub fn result_header(self) -> [&'static str; 3] {
        [CARD_NAME, SET_CODE, self.result_column()]
    }

    /// How the pass reads its input table
    pub fn input_layout(self) -> InputLayout {
        match self {
            Self::Download => InputLayout::CARD_LIST,
            Self::Publish => InputLayout::DOWNLOADED,
        }
    }

    /// How the pass's own results table reads back
    pub fn output_layout(self) -> InputLayout {
        InputLayout {
            name: CARD_NAME,
            set_code: SET_CODE,
            payload: Some(self.result_column()),
        }
    }
}

/// Input and output tables of one pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassPaths {
    pub input: PathBuf,
    pub results: PathBuf,
    pub errors: PathBuf,
}

impl PassPaths {
    /// Table locations derived from the operator's card list and output dir.
    ///
    /// Download writes `<out>/<list name>` and `<out>/errors.csv`; publish
    /// reads `<out>/<list name>` and writes `<out>/<list stem>_imgur.csv` and
    /// `<out>/errors_imgur.csv`.
    pub fn for_pass(pass: Pass, input_file: &Path, output_dir: &Path) -> anyhow::Result<Self> {
        let file_name = input_file
            .file_name()
            .with_context(|| format!("Input path has no file name: {}", input_file.display()))?;
        let downloaded = output_dir.join(file_name);
        let paths = match pass {
            Pass::Download => Self {
                input: input_file.to_path_buf(),
                results: downloaded,
                errors: output_dir.join("errors.csv"),
            },
            Pass::Publish => {
                let stem = input_file
                    .file_stem()
                    .unwrap_or(file_name)
                    .to_string_lossy();
                Self {
                    input: downloaded,
                    results: output_dir.join(format!("{stem}_imgur.csv")),
                    errors: output_dir.join("errors_imgur.csv"),
                }
            }
        };
        Ok(paths)
    }

    /// Directory the output tables live in
    pub fn output_dir(&self) -> &Path {
        self.results.parent().unwrap_or(Path::new("."))
    }

    fn ensure_input_not_overwritten(&self) -> anyhow::Result<()> {
        let same = match (fs::canonicalize(&self.input), fs::canonicalize(&self.results)) {
            (Ok(input), Ok(results)) => input == results,
            _ => false,
        };
        anyhow::ensure!(
            !same,
            "Results table {} would overwrite the input table; choose another output dir",
            self.results.display()
        );
        Ok(())
    }
}

/// Process `rows` in order, writing exactly one output row per input row.
pub fn run_rows(
    rows: &[CardRow],
    stage: &mut impl RowStage,
    pacer: &mut Pacer,
    results: &mut TableSink,
    errors: &mut TableSink,
    pb: &ProgressBar,
) -> io::Result<PassStats> {
    let mut stats = PassStats::default();
    for row in rows {
        pacer.tick();
        pb.set_message(row.card.to_string());
        let outcome = match row.missing {
            Some(column) => Err(RowError::ShortRow { column }),
            None => stage.process(row),
        };
        match outcome {
            Ok(value) => {
                log::debug!("row {}: {} -> {value}", row.position, row.card);
                results.write_row(&row.card, &value)?;
                stats.record_success();
            }
            Err(e) => {
                log::warn!("row {}: {} failed: {e}", row.position, row.card);
                errors.write_row(&row.card, &e.to_string())?;
                stats.record_failure(e.kind());
            }
        }
        pb.inc(1);
    }
    Ok(stats)
}

/// Run one full pass: read the input table, truncate and refill both
/// output tables.
pub fn run_pass(
    pass: Pass,
    paths: &PassPaths,
    stage: &mut impl RowStage,
    pacer: &mut Pacer,
    progress: &ProgressContext,
) -> anyhow::Result<PassSummary> {
    let start = Instant::now();
    let rows = table::read_card_rows(&paths.input, &pass.input_layout())?;
    paths.ensure_input_not_overwritten()?;

    let output_dir = paths.output_dir();
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Cannot create output directory {}", output_dir.display()))?;

    let mut results = TableSink::create(&paths.results, pass.result_header())
        .with_context(|| format!("Cannot create {}", paths.results.display()))?;
    let mut errors = TableSink::create(&paths.errors, ERROR_HEADER)
        .with_context(|| format!("Cannot create {}", paths.errors.display()))?;

    log::info!(
        "{}: {} rows from {}",
        pass.label(),
        rows.len(),
        paths.input.display()
    );
    let pauses_before = pacer.pauses();
    let pb = progress.rows_bar(pass.label(), rows.len());
    let stats = run_rows(&rows, stage, pacer, &mut results, &mut errors, &pb)
        .context("Failed writing output tables")?;
    pb.finish_and_clear();

    results.finish().context("Failed to finalize results table")?;
    errors.finish().context("Failed to finalize error table")?;

    Ok(PassSummary {
        pass: pass.label(),
        stats,
        pauses: pacer.pauses() - pauses_before,
        elapsed: start.elapsed(),
        results_path: paths.results.clone(),
        errors_path: paths.errors.clone(),
        carried_over: None,
    })
}

/// Download pass over the operator's card list
pub fn run_download<R: Resolver, F: Fetcher>(
    paths: &PassPaths,
    resolver: &R,
    fetcher: &F,
    pacer: &mut Pacer,
    progress: &ProgressContext,
) -> anyhow::Result<PassSummary> {
    fetcher
        .prepare()
        .context("Cannot create image directory")?;
    let mut stage = DownloadStage::new(resolver, fetcher);
    run_pass(Pass::Download, paths, &mut stage, pacer, progress)
}

/// Publish pass over the download results
pub fn run_publish<P: Publisher>(
    paths: &PassPaths,
    publisher: &P,
    pacer: &mut Pacer,
    progress: &ProgressContext,
) -> anyhow::Result<PassSummary> {
    let mut stage = PublishStage::new(publisher);
    run_pass(Pass::Publish, paths, &mut stage, pacer, progress)
}

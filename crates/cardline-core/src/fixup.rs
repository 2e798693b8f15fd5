//! Fixup: re-run only the rows a previous pass did not complete.
//!
//! The prior error table is split into rows eligible for retry and rows that
//! are not. Eligible rows go through the pass again, together with any input
//! rows that neither prior table mentions (for publish, downloads recovered
//! by a download fixup). The results table is rewritten as prior results plus
//! new successes, and the error table as the ineligible rows plus rows that
//! failed again. Both rewrites are staged and renamed into place at the end,
//! so an interrupted fixup leaves the previous tables intact.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;

use crate::card::CardKey;
use crate::pacing::Pacer;
use crate::pipeline::{
    DownloadStage, Fetcher, Pass, PassPaths, PublishStage, Publisher, Resolver, RowStage,
    run_rows,
};
use crate::progress::ProgressContext;
use crate::summary::{CarriedOver, PassSummary};
use crate::table::{self, CardRow, ERROR_HEADER, InputLayout, TableSink};

/// Decides whether a prior error row can be retried, and builds the
/// pipeline input for it.
pub trait RetryPolicy {
    fn retry(&self, failed: &CardRow) -> Option<CardRow>;

    /// Input rows whose key is in neither prior output table.
    fn unprocessed(&self, _seen: &HashSet<CardKey>) -> Vec<CardRow> {
        Vec::new()
    }
}

/// Download retries need only the key.
#[derive(Debug, Default, Clone, Copy)]
pub struct DownloadRetry;

impl RetryPolicy for DownloadRetry {
    fn retry(&self, failed: &CardRow) -> Option<CardRow> {
        let card = &failed.card;
        if card.name.trim().is_empty() || card.set_code.trim().is_empty() {
            return None;
        }
        Some(CardRow::new(failed.position, card.clone(), None))
    }
}

/// Publish retries need an image on disk.
///
/// The path comes from the download results table when the key is listed
/// there, otherwise from the deterministic artifact name under `image_dir`.
#[derive(Debug, Default, Clone)]
pub struct PublishRetry {
    known: HashMap<CardKey, PathBuf>,
    image_dir: PathBuf,
    /// Rows of the download results table, in file order
    downloaded: Vec<CardRow>,
}

impl PublishRetry {
    pub fn new(known: HashMap<CardKey, PathBuf>, image_dir: impl Into<PathBuf>) -> Self {
        Self {
            known,
            image_dir: image_dir.into(),
            downloaded: Vec::new(),
        }
    }

    /// Index the download results table; a missing table yields an empty index.
    pub fn load(downloaded: &Path, image_dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let rows = if downloaded.exists() {
            table::read_card_rows(downloaded, &InputLayout::DOWNLOADED)?
        } else {
            log::debug!(
                "{} not found, falling back to artifact names",
                downloaded.display()
            );
            Vec::new()
        };
        let known = rows
            .iter()
            .filter_map(|row| {
                let path = row.payload.as_deref().filter(|p| !p.is_empty())?;
                Some((row.card.clone(), PathBuf::from(path)))
            })
            .collect();
        Ok(Self {
            downloaded: rows,
            ..Self::new(known, image_dir)
        })
    }

    fn image_for(&self, card: &CardKey) -> PathBuf {
        self.known
            .get(card)
            .cloned()
            .unwrap_or_else(|| self.image_dir.join(card.image_file_name()))
    }
}

impl RetryPolicy for PublishRetry {
    fn retry(&self, failed: &CardRow) -> Option<CardRow> {
        let image = self.image_for(&failed.card);
        if !image.is_file() {
            log::debug!(
                "{}: no image at {}, keeping error",
                failed.card,
                image.display()
            );
            return None;
        }
        Some(CardRow::new(
            failed.position,
            failed.card.clone(),
            Some(image.display().to_string()),
        ))
    }

    fn unprocessed(&self, seen: &HashSet<CardKey>) -> Vec<CardRow> {
        self.downloaded
            .iter()
            .filter(|row| !seen.contains(&row.card))
            .cloned()
            .collect()
    }
}

/// Re-run `pass` on the retryable subset of its prior error table plus the
/// rows the policy reports as unprocessed.
pub fn run_fixup(
    pass: Pass,
    paths: &PassPaths,
    stage: &mut impl RowStage,
    policy: &impl RetryPolicy,
    pacer: &mut Pacer,
    progress: &ProgressContext,
) -> anyhow::Result<PassSummary> {
    let start = Instant::now();
    table::cleanup_tmp_files(paths.output_dir()).context("Failed to clean stale tmp files")?;

    anyhow::ensure!(
        paths.errors.exists(),
        "No prior error table at {}; run the {} pass first",
        paths.errors.display(),
        pass.label()
    );
    let prior_errors = table::read_card_rows(&paths.errors, &InputLayout::ERRORS)?;
    let prior_results = if paths.results.exists() {
        table::read_card_rows(&paths.results, &pass.output_layout())?
    } else {
        Vec::new()
    };

    let seen: HashSet<CardKey> = prior_results
        .iter()
        .chain(&prior_errors)
        .map(|row| row.card.clone())
        .collect();

    let mut retry = Vec::new();
    let mut keep = Vec::new();
    for failed in prior_errors {
        match policy.retry(&failed) {
            Some(row) => retry.push(row),
            None => keep.push(failed),
        }
    }
    let unprocessed = policy.unprocessed(&seen);
    log::info!(
        "{} fixup: {} rows to retry, {} not yet processed, {} kept as errors, {} prior results",
        pass.label(),
        retry.len(),
        unprocessed.len(),
        keep.len(),
        prior_results.len()
    );
    retry.extend(unprocessed);

    let mut results = TableSink::staged(&paths.results, pass.result_header())
        .with_context(|| format!("Cannot stage {}", paths.results.display()))?;
    let mut errors = TableSink::staged(&paths.errors, ERROR_HEADER)
        .with_context(|| format!("Cannot stage {}", paths.errors.display()))?;

    for row in &prior_results {
        results.write_row(&row.card, row.payload.as_deref().unwrap_or_default())?;
    }
    for row in &keep {
        errors.write_row(&row.card, row.payload.as_deref().unwrap_or_default())?;
    }

    let pauses_before = pacer.pauses();
    let pb = progress.rows_bar(pass.label(), retry.len());
    let stats = run_rows(&retry, stage, pacer, &mut results, &mut errors, &pb)
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
        carried_over: Some(CarriedOver {
            prior_results: prior_results.len(),
            ineligible_errors: keep.len(),
        }),
    })
}

/// Retry failed downloads
pub fn run_download_fixup<R: Resolver, F: Fetcher>(
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
    run_fixup(
        Pass::Download,
        paths,
        &mut stage,
        &DownloadRetry,
        pacer,
        progress,
    )
}

/// Retry failed uploads whose image is still on disk
pub fn run_publish_fixup<P: Publisher>(
    paths: &PassPaths,
    image_dir: &Path,
    publisher: &P,
    pacer: &mut Pacer,
    progress: &ProgressContext,
) -> anyhow::Result<PassSummary> {
    let policy = PublishRetry::load(&paths.input, image_dir)?;
    let mut stage = PublishStage::new(publisher);
    run_fixup(Pass::Publish, paths, &mut stage, &policy, pacer, progress)
}

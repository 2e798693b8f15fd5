//! CSV tables: the record source and the result/error sinks

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::card::CardKey;

pub const CARD_NAME: &str = "CardName";
pub const SET_CODE: &str = "SetCode";
pub const IMAGE_PATH: &str = "ImagePath";
pub const IMGUR_URI: &str = "ImgurUri";
pub const ERROR_MESSAGE: &str = "ErrorMessage";

/// Header spellings of the hand-written download input
pub const INPUT_CARD_NAME: &str = "Card Name";
pub const INPUT_SET_CODE: &str = "Set Code";

/// Header of every error table
pub const ERROR_HEADER: [&str; 3] = [CARD_NAME, SET_CODE, ERROR_MESSAGE];

/// One record of a source table, keyed by column name, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    position: usize,
    fields: Vec<(String, String)>,
}

impl Row {
    pub fn new(position: usize, fields: Vec<(String, String)>) -> Self {
        Self { position, fields }
    }

    /// 1-based position in the source table (header excluded)
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }
}

/// Read a whole table, failing when any `required` column is absent.
///
/// A missing column is an operator error and aborts the run; there is no
/// per-row recovery for it. Records may be ragged: extra fields are ignored
/// and a short record simply lacks the trailing columns.
pub fn read_rows(path: &Path, required: &[&str]) -> anyhow::Result<Vec<Row>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Cannot open table {}", path.display()))?;

    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("Cannot read header of {}", path.display()))?
        .iter()
        .map(String::from)
        .collect();

    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|col| !headers.iter().any(|h| h == col))
        .collect();
    anyhow::ensure!(
        missing.is_empty(),
        "{}: missing required column(s) {missing:?} (found {headers:?})",
        path.display()
    );

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record =
            record.with_context(|| format!("{}: malformed row {}", path.display(), idx + 1))?;
        let fields = headers
            .iter()
            .cloned()
            .zip(record.iter().map(String::from))
            .collect();
        rows.push(Row::new(idx + 1, fields));
    }
    log::debug!("{}: {} rows", path.display(), rows.len());
    Ok(rows)
}

/// Which columns of a source table feed the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputLayout {
    pub name: &'static str,
    pub set_code: &'static str,
    /// Extra per-row input (the image path for the publish pass)
    pub payload: Option<&'static str>,
}

impl InputLayout {
    /// Raw operator-supplied card list
    pub const CARD_LIST: Self = Self {
        name: INPUT_CARD_NAME,
        set_code: INPUT_SET_CODE,
        payload: None,
    };

    /// Output of the download pass
    pub const DOWNLOADED: Self = Self {
        name: CARD_NAME,
        set_code: SET_CODE,
        payload: Some(IMAGE_PATH),
    };

    /// Any error table
    pub const ERRORS: Self = Self {
        name: CARD_NAME,
        set_code: SET_CODE,
        payload: Some(ERROR_MESSAGE),
    };

    pub fn required(&self) -> Vec<&'static str> {
        let mut cols = vec![self.name, self.set_code];
        cols.extend(self.payload);
        cols
    }
}

/// Typed view of a row as the pipeline consumes it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardRow {
    pub position: usize,
    pub card: CardKey,
    pub payload: Option<String>,
    /// First required column the record was too short to reach
    pub missing: Option<&'static str>,
}

impl CardRow {
    pub fn new(position: usize, card: CardKey, payload: Option<String>) -> Self {
        Self {
            position,
            card,
            payload,
            missing: None,
        }
    }

    pub fn from_row(row: &Row, layout: &InputLayout) -> Self {
        let field = |col: &str| row.get(col).unwrap_or_default().to_string();
        Self {
            position: row.position(),
            card: CardKey::new(field(layout.name), field(layout.set_code)),
            payload: layout.payload.map(field),
            missing: layout
                .required()
                .into_iter()
                .find(|col| row.get(col).is_none()),
        }
    }
}

/// Read a table and project it through `layout`.
pub fn read_card_rows(path: &Path, layout: &InputLayout) -> anyhow::Result<Vec<CardRow>> {
    let rows = read_rows(path, &layout.required())?;
    Ok(rows
        .iter()
        .map(|row| CardRow::from_row(row, layout))
        .collect())
}

/// Three-column CSV writer, flushed after every row.
///
/// Direct sinks write straight to the final path so an interrupted run still
/// leaves a valid partial table. Staged sinks write `<path>.tmp` and rename on
/// [`TableSink::finish`], so the previous table survives until the new one is
/// complete.
pub struct TableSink {
    writer: csv::Writer<File>,
    tmp_path: Option<PathBuf>,
    final_path: PathBuf,
    row_count: usize,
}

impl std::fmt::Debug for TableSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableSink")
            .field("final_path", &self.final_path)
            .field("staged", &self.tmp_path.is_some())
            .field("row_count", &self.row_count)
            .finish_non_exhaustive()
    }
}

impl TableSink {
    /// Create (truncating) a table at `path` and write its header
    pub fn create(path: &Path, header: [&str; 3]) -> io::Result<Self> {
        let file = File::create(path)?;
        Self::with_file(file, None, path.to_path_buf(), header)
    }

    /// Create a table that only replaces `path` once finished
    pub fn staged(path: &Path, header: [&str; 3]) -> io::Result<Self> {
        let tmp_path = tmp_path_for(path);
        if tmp_path.exists() {
            fs::remove_file(&tmp_path)?;
        }
        let file = File::create(&tmp_path)?;
        Self::with_file(file, Some(tmp_path), path.to_path_buf(), header)
    }

    fn with_file(
        file: File,
        tmp_path: Option<PathBuf>,
        final_path: PathBuf,
        header: [&str; 3],
    ) -> io::Result<Self> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.write_record(header)?;
        writer.flush()?;
        Ok(Self {
            writer,
            tmp_path,
            final_path,
            row_count: 0,
        })
    }

    /// Append `(name, set, value)`
    pub fn write_row(&mut self, card: &CardKey, value: &str) -> io::Result<()> {
        self.writer
            .write_record([card.name.as_str(), card.set_code.as_str(), value])?;
        self.writer.flush()?;
        self.row_count += 1;
        Ok(())
    }

    /// Flush and, for staged sinks, atomically rename tmp → final.
    pub fn finish(mut self) -> io::Result<usize> {
        self.writer.flush()?;
        if let Some(tmp_path) = &self.tmp_path {
            fs::rename(tmp_path, &self.final_path)?;
        }
        Ok(self.row_count)
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Remove stale .tmp files left behind by an interrupted fixup
pub fn cleanup_tmp_files(output_dir: &Path) -> io::Result<()> {
    if !output_dir.exists() {
        return Ok(());
    }
    for entry in fs::read_dir(output_dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "tmp") {
            log::warn!("Removing stale tmp file: {}", path.display());
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

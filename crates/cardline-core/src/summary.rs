//! Per-pass run statistics and reporting

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

use crate::progress::fmt_num;

/// Row counts collected while a pass runs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassStats {
    pub rows: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Failures keyed by [`crate::RowError::kind`]
    pub failures_by_kind: BTreeMap<&'static str, usize>,
}

impl PassStats {
    pub fn record_success(&mut self) {
        self.rows += 1;
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self, kind: &'static str) {
        self.rows += 1;
        self.failed += 1;
        *self.failures_by_kind.entry(kind).or_default() += 1;
    }
}

/// What a fixup run carried over from the prior tables untouched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CarriedOver {
    pub prior_results: usize,
    pub ineligible_errors: usize,
}

/// Outcome of one pipeline pass
#[derive(Debug, Clone)]
pub struct PassSummary {
    pub pass: &'static str,
    pub stats: PassStats,
    pub pauses: usize,
    pub elapsed: Duration,
    pub results_path: PathBuf,
    pub errors_path: PathBuf,
    /// Set when the pass ran in fixup mode
    pub carried_over: Option<CarriedOver>,
}

impl PassSummary {
    fn rows(&self) -> Vec<(String, String)> {
        let stats = &self.stats;
        let mut rows = vec![
            ("Rows".to_string(), fmt_num(stats.rows)),
            ("Succeeded".to_string(), fmt_num(stats.succeeded)),
            ("Failed".to_string(), fmt_num(stats.failed)),
        ];
        for (kind, count) in &stats.failures_by_kind {
            rows.push((format!("  {kind}"), fmt_num(*count)));
        }
        if let Some(carried) = self.carried_over {
            rows.push((
                "Kept results".to_string(),
                fmt_num(carried.prior_results),
            ));
            rows.push((
                "Kept errors".to_string(),
                fmt_num(carried.ineligible_errors),
            ));
        }
        rows.push(("Pauses".to_string(), fmt_num(self.pauses)));
        rows.push((
            "Elapsed".to_string(),
            format!("{:.1}s", self.elapsed.as_secs_f64()),
        ));
        rows.push(("Results".to_string(), self.results_path.display().to_string()));
        rows.push(("Errors".to_string(), self.errors_path.display().to_string()));
        rows
    }

    /// Print as a table on stderr (TTY mode).
    pub fn print(&self) {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_header(vec![
                Cell::new(self.pass).fg(Color::Cyan),
                Cell::new("Value").fg(Color::Cyan),
            ]);
        for (label, value) in self.rows() {
            let value_cell = if label == "Failed" && self.stats.failed > 0 {
                Cell::new(value).fg(Color::Yellow)
            } else {
                Cell::new(value)
            };
            table.add_row(vec![Cell::new(label), value_cell]);
        }
        eprintln!("\n{table}");
    }

    /// Log as a single line (non-TTY mode).
    pub fn log(&self) {
        let kinds: Vec<String> = self
            .stats
            .failures_by_kind
            .iter()
            .map(|(kind, n)| format!("{kind}={n}"))
            .collect();
        log::info!(
            "{}: {} rows, {} ok, {} failed [{}], {} pauses [{:.1}s] -> {}, {}",
            self.pass,
            fmt_num(self.stats.rows),
            fmt_num(self.stats.succeeded),
            fmt_num(self.stats.failed),
            kinds.join(" "),
            self.pauses,
            self.elapsed.as_secs_f64(),
            self.results_path.display(),
            self.errors_path.display()
        );
    }
}

// src/services/store.rs
use chrono::{NaiveDate, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AnalyticsError, AnalyticsResult};
use crate::models::{sanitize_price, HistoricalTable, Instrument, PriceRow};

const DATE_COLUMN: &str = "Date";
const DATE_FORMAT: &str = "%Y-%m-%d";
/// Written in place of a missing price.
const MISSING_PRICE: &str = "0.0";

/// What one `append` changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AppendSummary {
    pub rows_appended: usize,
    pub cells_filled: usize,
}

impl AppendSummary {
    pub fn is_empty(&self) -> bool {
        self.rows_appended == 0 && self.cells_filled == 0
    }
}

/// Wide CSV table of daily prices: `Date,VTI,VEA,BND,BNDX`.
///
/// Single writer. Stored prices are never rewritten; `append` adds dates the
/// file does not have yet and fills cells that hold no price.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    // tolerates "2024-01-02 00:00:00"
    let day = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(day, DATE_FORMAT).ok()
}

fn parse_price(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().and_then(sanitize_price)
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        HistoryStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn read_error(&self, detail: impl std::fmt::Display) -> AnalyticsError {
        AnalyticsError::StorageRead(format!("{}: {}", self.path.display(), detail))
    }

    fn write_error(&self, detail: impl std::fmt::Display) -> AnalyticsError {
        AnalyticsError::StorageWrite(format!("{}: {}", self.path.display(), detail))
    }

    /// Reads the whole table. Missing cells load as the sentinel.
    pub fn load(&self) -> AnalyticsResult<HistoricalTable> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(|e| self.read_error(e))?;

        let headers = rdr.headers().map_err(|e| self.read_error(e))?.clone();
        let date_idx = headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(DATE_COLUMN))
            .ok_or_else(|| self.read_error("no 'Date' column"))?;
        let columns: Vec<(Instrument, usize)> = headers
            .iter()
            .enumerate()
            .filter_map(|(idx, h)| Instrument::from_ticker(h).map(|i| (i, idx)))
            .collect();
        for i in Instrument::ALL {
            if !columns.iter().any(|&(c, _)| c == i) {
                debug!("Column {} missing from {}", i, self.path.display());
            }
        }

        let mut rows = Vec::new();
        for (line, record) in rdr.records().enumerate() {
            let record = record.map_err(|e| self.read_error(e))?;
            let raw_date = record.get(date_idx).unwrap_or_default();
            let date = parse_date(raw_date).ok_or_else(|| {
                self.read_error(format!("bad date '{}' on data row {}", raw_date, line + 1))
            })?;
            let mut row = PriceRow::empty(date);
            for &(instrument, idx) in &columns {
                row.prices[instrument.index()] = record.get(idx).and_then(parse_price);
            }
            rows.push(row);
        }

        let table = HistoricalTable::from_rows(rows);
        debug!("Loaded {} rows from {}", table.len(), self.path.display());
        Ok(table)
    }

    /// `load`, treating an unreadable store as empty.
    pub fn load_or_empty(&self) -> HistoricalTable {
        match self.load() {
            Ok(table) => table,
            Err(e) => {
                warn!("{}; treating historical store as empty", e);
                HistoricalTable::default()
            }
        }
    }

    pub fn last_date(&self, instrument: Instrument) -> Option<NaiveDate> {
        self.load_or_empty().last_date_for(instrument)
    }

    pub fn last_date_overall(&self) -> Option<NaiveDate> {
        self.load_or_empty().last_date()
    }

    /// Adds rows whose dates are not stored yet and fills missing cells of
    /// rows that are. A stored price is never replaced.
    pub fn append(&self, new_rows: &HistoricalTable) -> AnalyticsResult<AppendSummary> {
        let existing = if self.exists() {
            match self.load() {
                Ok(table) => table,
                Err(e) => {
                    warn!("{}; starting a fresh table", e);
                    self.set_aside_corrupt()?;
                    HistoricalTable::default()
                }
            }
        } else {
            HistoricalTable::default()
        };

        let mut rows = existing.into_rows();
        let positions: HashMap<NaiveDate, usize> =
            rows.iter().enumerate().map(|(i, r)| (r.date, i)).collect();
        let mut summary = AppendSummary::default();
        for incoming in new_rows.rows() {
            match positions.get(&incoming.date) {
                Some(&i) => {
                    for (slot, price) in rows[i].prices.iter_mut().zip(incoming.prices) {
                        if slot.is_none() && price.is_some() {
                            *slot = price;
                            summary.cells_filled += 1;
                        }
                    }
                }
                None => {
                    rows.push(incoming.clone());
                    summary.rows_appended += 1;
                }
            }
        }

        if summary.is_empty() {
            info!("No new rows to append to {}", self.path.display());
            return Ok(summary);
        }
        if summary.cells_filled > 0 {
            debug!("Filled {} missing prices in stored rows", summary.cells_filled);
        }

        self.write_table(&HistoricalTable::from_rows(rows))?;
        info!(
            "Appended {} rows and filled {} missing prices in {}",
            summary.rows_appended,
            summary.cells_filled,
            self.path.display()
        );
        Ok(summary)
    }

    /// `<file>.corrupt-<UTC timestamp>`, suffixed further if that name is taken.
    fn backup_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stamp = Utc::now().format("%Y%m%dT%H%M%S");
        let mut backup = self.path.with_file_name(format!("{}.corrupt-{}", name, stamp));
        let mut n = 1;
        while backup.exists() {
            backup = self
                .path
                .with_file_name(format!("{}.corrupt-{}-{}", name, stamp, n));
            n += 1;
        }
        backup
    }

    fn set_aside_corrupt(&self) -> AnalyticsResult<()> {
        let backup = self.backup_path();
        fs::rename(&self.path, &backup).map_err(|e| self.write_error(e))?;
        warn!("Moved unreadable table to {}", backup.display());
        Ok(())
    }

    /// Writes through a temporary file and renames it over the table.
    fn write_table(&self, table: &HistoricalTable) -> AnalyticsResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.write_error(e))?;
            }
        }

        let tmp = self.path.with_extension("csv.tmp");
        {
            let mut wtr = csv::Writer::from_path(&tmp).map_err(|e| self.write_error(e))?;
            let mut header = vec![DATE_COLUMN];
            header.extend(Instrument::ALL.iter().map(|i| i.ticker()));
            wtr.write_record(&header).map_err(|e| self.write_error(e))?;

            for row in table.rows() {
                let mut record = Vec::with_capacity(1 + Instrument::ALL.len());
                record.push(row.date.format(DATE_FORMAT).to_string());
                for price in row.prices {
                    record.push(match price {
                        Some(p) => p.to_string(),
                        None => MISSING_PRICE.to_string(),
                    });
                }
                wtr.write_record(&record).map_err(|e| self.write_error(e))?;
            }
            wtr.flush().map_err(|e| self.write_error(e))?;
        }
        fs::rename(&tmp, &self.path).map_err(|e| self.write_error(e))?;
        Ok(())
    }
}

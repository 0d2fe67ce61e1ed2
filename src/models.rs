// src/models.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One of the four funds tracked by the planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Instrument {
    #[serde(rename = "VTI")]
    UsStocks,
    #[serde(rename = "VEA")]
    IntlStocks,
    #[serde(rename = "BND")]
    UsBonds,
    #[serde(rename = "BNDX")]
    IntlBonds,
}

impl Instrument {
    /// Persisted column order.
    pub const ALL: [Instrument; 4] = [
        Instrument::UsStocks,
        Instrument::IntlStocks,
        Instrument::UsBonds,
        Instrument::IntlBonds,
    ];

    pub fn ticker(self) -> &'static str {
        match self {
            Instrument::UsStocks => "VTI",
            Instrument::IntlStocks => "VEA",
            Instrument::UsBonds => "BND",
            Instrument::IntlBonds => "BNDX",
        }
    }

    pub fn from_ticker(ticker: &str) -> Option<Instrument> {
        Instrument::ALL
            .into_iter()
            .find(|i| i.ticker().eq_ignore_ascii_case(ticker.trim()))
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.ticker())
    }
}

/// Daily adjusted closes for one instrument, as delivered by a price source.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentSeries {
    pub instrument: Instrument,
    pub points: Vec<(NaiveDate, f64)>,
}

/// One date of the wide historical table. `None` is the "no data" sentinel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceRow {
    pub date: NaiveDate,
    pub prices: [Option<f64>; 4],
}

impl PriceRow {
    pub fn empty(date: NaiveDate) -> Self {
        PriceRow { date, prices: [None; 4] }
    }

    pub fn price(&self, instrument: Instrument) -> Option<f64> {
        self.prices[instrument.index()]
    }
}

/// Date-indexed table of prices for all four instruments.
///
/// Rows are strictly increasing by date and every row carries a slot for
/// every instrument.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HistoricalTable {
    rows: Vec<PriceRow>,
}

impl HistoricalTable {
    /// Builds a table from rows in any order; later duplicates of a date are dropped.
    pub fn from_rows(mut rows: Vec<PriceRow>) -> Self {
        rows.sort_by_key(|r| r.date);
        rows.dedup_by_key(|r| r.date);
        HistoricalTable { rows }
    }

    /// Aligns per-instrument series on the union of their dates.
    pub fn from_series(series: &[InstrumentSeries]) -> Self {
        let mut by_date: BTreeMap<NaiveDate, PriceRow> = BTreeMap::new();
        for s in series {
            for &(date, price) in &s.points {
                let row = by_date.entry(date).or_insert_with(|| PriceRow::empty(date));
                row.prices[s.instrument.index()] = sanitize_price(price);
            }
        }
        HistoricalTable {
            rows: by_date.into_values().collect(),
        }
    }

    pub fn rows(&self) -> &[PriceRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }

    /// Last date carrying a real price for `instrument`.
    pub fn last_date_for(&self, instrument: Instrument) -> Option<NaiveDate> {
        self.rows
            .iter()
            .rev()
            .find(|r| r.price(instrument).is_some())
            .map(|r| r.date)
    }

    /// First date carrying a real price for `instrument`.
    pub fn first_date_for(&self, instrument: Instrument) -> Option<NaiveDate> {
        self.rows
            .iter()
            .find(|r| r.price(instrument).is_some())
            .map(|r| r.date)
    }

    /// The instrument's column over the full date axis, sentinels included.
    pub fn column(&self, instrument: Instrument) -> Vec<(NaiveDate, Option<f64>)> {
        self.rows
            .iter()
            .map(|r| (r.date, r.price(instrument)))
            .collect()
    }

    pub(crate) fn into_rows(self) -> Vec<PriceRow> {
        self.rows
    }
}

/// Zero, negative and non-finite prices are stored as the sentinel.
pub fn sanitize_price(price: f64) -> Option<f64> {
    if price.is_finite() && price > 0.0 {
        Some(price)
    } else {
        None
    }
}

/// Fractions of the portfolio held in each fund.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AllocationWeights {
    pub us_stocks: f64,
    pub intl_stocks: f64,
    pub us_bonds: f64,
    pub intl_bonds: f64,
}

impl AllocationWeights {
    pub fn weight(&self, instrument: Instrument) -> f64 {
        match instrument {
            Instrument::UsStocks => self.us_stocks,
            Instrument::IntlStocks => self.intl_stocks,
            Instrument::UsBonds => self.us_bonds,
            Instrument::IntlBonds => self.intl_bonds,
        }
    }

    pub fn sum(&self) -> f64 {
        self.us_stocks + self.intl_stocks + self.us_bonds + self.intl_bonds
    }
}

/// The three user-facing percentages; the only allocation state that is saved.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioConfig {
    pub stocks_pct: f64,
    pub intl_stocks_pct: f64,
    pub intl_bonds_pct: f64,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        PortfolioConfig {
            stocks_pct: 60.0,
            intl_stocks_pct: 30.0,
            intl_bonds_pct: 20.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReturnPoint {
    pub date: NaiveDate,
    /// `None` when the return is undefined (a sentinel on either side).
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReturnSeries {
    pub points: Vec<ReturnPoint>,
}

impl ReturnSeries {
    pub fn new(points: Vec<ReturnPoint>) -> Self {
        ReturnSeries { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, date: NaiveDate) -> Option<&ReturnPoint> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| &self.points[i])
    }

    /// Defined returns only, in date order.
    pub fn defined(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.points.iter().filter_map(|p| p.value.map(|v| (p.date, v)))
    }

    pub fn defined_values(&self) -> Vec<f64> {
        self.defined().map(|(_, v)| v).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1w")]
    OneWeek,
    #[serde(rename = "ytd")]
    YearToDate,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "3y")]
    ThreeYears,
    #[serde(rename = "5y")]
    FiveYears,
    #[serde(rename = "10y")]
    TenYears,
}

impl Period {
    pub const ALL: [Period; 6] = [
        Period::OneWeek,
        Period::YearToDate,
        Period::OneYear,
        Period::ThreeYears,
        Period::FiveYears,
        Period::TenYears,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Period::OneWeek => "1w",
            Period::YearToDate => "ytd",
            Period::OneYear => "1y",
            Period::ThreeYears => "3y",
            Period::FiveYears => "5y",
            Period::TenYears => "10y",
        }
    }
}

/// Percentage return per period; `None` means unavailable, not zero.
pub type PeriodReturnSet = BTreeMap<Period, Option<f64>>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundPerformance {
    pub first_date: Option<NaiveDate>,
    pub returns: PeriodReturnSet,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceTable {
    pub as_of: NaiveDate,
    pub funds: BTreeMap<Instrument, FundPerformance>,
    pub portfolio: PeriodReturnSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskMetrics {
    pub volatility: f64,
    /// `None` when volatility is zero.
    pub sharpe_ratio: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InterpolationBand {
    pub max: f64,
    pub avg: f64,
    pub min: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProjectionPoint {
    pub year: u32,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FundDetails {
    pub symbol: String,
    pub name: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "yield")]
    pub dividend_yield: Option<f64>,
    pub expense_ratio: Option<f64>,
    pub beta: Option<f64>,
    pub ytd_return: Option<f64>,
    pub one_year_change: Option<f64>,
    pub three_year_average_return: Option<f64>,
    pub five_year_average_return: Option<f64>,
}

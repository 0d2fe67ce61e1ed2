// src/services/price_source.rs
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::AnalyticsResult;
use crate::models::{FundDetails, Instrument, InstrumentSeries};

/// Remote supplier of prices and fund metadata. Retries are the
/// implementation's business.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_max_history(&self, instrument: Instrument) -> AnalyticsResult<InstrumentSeries>;

    /// Daily prices dated on or after `start`.
    async fn fetch_history_since(
        &self,
        instrument: Instrument,
        start: NaiveDate,
    ) -> AnalyticsResult<InstrumentSeries>;

    async fn fetch_latest_details(&self, instrument: Instrument) -> AnalyticsResult<FundDetails>;
}

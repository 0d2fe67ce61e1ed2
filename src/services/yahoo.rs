// src/services/yahoo.rs
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use log::{debug, info, warn};
use reqwest::Client;
use serde_json::Value;

use super::cache::TtlCache;
use super::price_source::PriceSource;
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::models::{sanitize_price, FundDetails, Instrument, InstrumentSeries};

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const SUMMARY_MODULES: &str = "price,summaryDetail,fundProfile,defaultKeyStatistics";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Yahoo Finance price source with injected caches for full histories and
/// fund details.
pub struct YahooClient {
    client: Client,
    history_cache: TtlCache<Instrument, InstrumentSeries>,
    details_cache: TtlCache<Instrument, FundDetails>,
}

fn fetch_error(detail: impl std::fmt::Display) -> AnalyticsError {
    AnalyticsError::Fetch(detail.to_string())
}

impl YahooClient {
    pub fn new(cache_ttl: Duration) -> AnalyticsResult<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(fetch_error)?;
        Ok(YahooClient {
            client,
            history_cache: TtlCache::new(cache_ttl),
            details_cache: TtlCache::new(cache_ttl),
        })
    }

    /// Drops everything cached for `instrument`.
    pub fn invalidate(&self, instrument: Instrument) {
        self.history_cache.invalidate(&instrument);
        self.details_cache.invalidate(&instrument);
    }

    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> AnalyticsResult<Value> {
        info!("Fetching data from URL: {}", url);
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(fetch_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(fetch_error(format!("{} returned {}: {}", url, status, body)));
        }
        response.json::<Value>().await.map_err(fetch_error)
    }

    async fn fetch_chart(
        &self,
        instrument: Instrument,
        query: &[(&str, String)],
    ) -> AnalyticsResult<InstrumentSeries> {
        let url = format!("{}/{}", CHART_URL, instrument.ticker());
        let body = self.get_json(&url, query).await?;
        let series = parse_chart(instrument, &body)?;
        info!("Fetched {} daily prices for {}", series.points.len(), instrument);
        Ok(series)
    }
}

#[async_trait]
impl PriceSource for YahooClient {
    async fn fetch_max_history(&self, instrument: Instrument) -> AnalyticsResult<InstrumentSeries> {
        if let Some(cached) = self.history_cache.get(&instrument) {
            debug!("Serving {} max history from cache", instrument);
            return Ok(cached);
        }
        let query = [
            ("range", "max".to_string()),
            ("interval", "1d".to_string()),
            ("events", "div,split".to_string()),
        ];
        let series = self.fetch_chart(instrument, &query).await?;
        self.history_cache.insert(instrument, series.clone());
        Ok(series)
    }

    async fn fetch_history_since(
        &self,
        instrument: Instrument,
        start: NaiveDate,
    ) -> AnalyticsResult<InstrumentSeries> {
        let period1 = start
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .ok_or_else(|| fetch_error(format!("bad start date {}", start)))?;
        let query = [
            ("period1", period1.to_string()),
            ("period2", Utc::now().timestamp().to_string()),
            ("interval", "1d".to_string()),
            ("events", "div,split".to_string()),
        ];
        let mut series = self.fetch_chart(instrument, &query).await?;
        series.points.retain(|(date, _)| *date >= start);
        Ok(series)
    }

    async fn fetch_latest_details(&self, instrument: Instrument) -> AnalyticsResult<FundDetails> {
        if let Some(cached) = self.details_cache.get(&instrument) {
            debug!("Serving {} details from cache", instrument);
            return Ok(cached);
        }
        let url = format!("{}/{}", SUMMARY_URL, instrument.ticker());
        let body = self
            .get_json(&url, &[("modules", SUMMARY_MODULES.to_string())])
            .await?;
        let details = parse_summary(instrument, &body)?;
        self.details_cache.insert(instrument, details.clone());
        Ok(details)
    }
}

/// Daily adjusted closes from a chart response, falling back to closes.
pub(crate) fn parse_chart(instrument: Instrument, body: &Value) -> AnalyticsResult<InstrumentSeries> {
    if let Some(err) = body.pointer("/chart/error").filter(|e| !e.is_null()) {
        return Err(fetch_error(format!("chart error for {}: {}", instrument, err)));
    }
    let result = body
        .pointer("/chart/result/0")
        .ok_or_else(|| fetch_error(format!("no chart result for {}", instrument)))?;

    let offset = result
        .pointer("/meta/gmtoffset")
        .and_then(Value::as_i64)
        .unwrap_or(0);
    let timestamps: Vec<i64> = result
        .get("timestamp")
        .and_then(Value::as_array)
        .map(|ts| ts.iter().filter_map(Value::as_i64).collect())
        .unwrap_or_default();

    let prices = result
        .pointer("/indicators/adjclose/0/adjclose")
        .or_else(|| {
            warn!("No adjusted close for {}, using close", instrument);
            result.pointer("/indicators/quote/0/close")
        })
        .and_then(Value::as_array)
        .ok_or_else(|| fetch_error(format!("no prices in chart for {}", instrument)))?;

    let mut points: Vec<(NaiveDate, f64)> = timestamps
        .iter()
        .zip(prices)
        .filter_map(|(&ts, price)| {
            let price = sanitize_price(price.as_f64()?)?;
            let date = DateTime::from_timestamp(ts + offset, 0)?.date_naive();
            Some((date, price))
        })
        .collect();
    points.sort_by_key(|(date, _)| *date);
    // Yahoo repeats the live bar on some days; the last one wins.
    points.reverse();
    points.dedup_by_key(|(date, _)| *date);
    points.reverse();

    Ok(InstrumentSeries { instrument, points })
}

fn raw_number(result: &Value, path: &str) -> Option<f64> {
    let node = result.pointer(path)?;
    node.get("raw").unwrap_or(node).as_f64()
}

fn text(result: &Value, path: &str) -> Option<String> {
    result.pointer(path).and_then(Value::as_str).map(str::to_string)
}

pub(crate) fn parse_summary(instrument: Instrument, body: &Value) -> AnalyticsResult<FundDetails> {
    let result = body
        .pointer("/quoteSummary/result/0")
        .ok_or_else(|| fetch_error(format!("no quote summary for {}", instrument)))?;

    Ok(FundDetails {
        symbol: instrument.ticker().to_string(),
        name: text(result, "/price/shortName"),
        category: text(result, "/fundProfile/categoryName"),
        dividend_yield: raw_number(result, "/summaryDetail/yield"),
        expense_ratio: raw_number(
            result,
            "/fundProfile/feesExpensesInvestment/annualReportExpenseRatio",
        ),
        beta: raw_number(result, "/defaultKeyStatistics/beta3Year"),
        ytd_return: raw_number(result, "/defaultKeyStatistics/ytdReturn"),
        one_year_change: raw_number(result, "/defaultKeyStatistics/52WeekChange"),
        three_year_average_return: raw_number(result, "/defaultKeyStatistics/threeYearAverageReturn"),
        five_year_average_return: raw_number(result, "/defaultKeyStatistics/fiveYearAverageReturn"),
    })
}

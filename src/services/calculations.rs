// src/services/calculations.rs
use chrono::{Datelike, Duration, Months, NaiveDate};
use log::{debug, warn};
use std::collections::BTreeMap;

use crate::models::{
    AllocationWeights, FundPerformance, HistoricalTable, Instrument, PerformanceTable, Period,
    PeriodReturnSet, ReturnPoint, ReturnSeries,
};

/// Simple day-over-day returns of a price column.
///
/// The first date has no prior price and is left out. A sentinel on either
/// side of a transition makes that date's return undefined.
pub fn daily_returns(prices: &[(NaiveDate, Option<f64>)]) -> ReturnSeries {
    let points = prices
        .windows(2)
        .map(|pair| {
            let (_, prev) = pair[0];
            let (date, current) = pair[1];
            let value = match (prev, current) {
                (Some(p), Some(c)) if p > 0.0 => Some(c / p - 1.0),
                _ => None,
            };
            ReturnPoint { date, value }
        })
        .collect();
    ReturnSeries::new(points)
}

pub fn instrument_returns(table: &HistoricalTable) -> BTreeMap<Instrument, ReturnSeries> {
    Instrument::ALL
        .into_iter()
        .map(|i| (i, daily_returns(&table.column(i))))
        .collect()
}

/// Weighted daily return of the blended portfolio.
///
/// Only dates present in every contributing series appear. A date where any
/// contributing fund's return is undefined is undefined for the portfolio;
/// zero-weight funds never contribute.
pub fn portfolio_daily_returns(
    per_instrument: &BTreeMap<Instrument, ReturnSeries>,
    weights: &AllocationWeights,
) -> ReturnSeries {
    let mut contributing: Vec<(f64, &ReturnSeries)> = Vec::new();
    for instrument in Instrument::ALL {
        let weight = weights.weight(instrument);
        if weight == 0.0 {
            continue;
        }
        match per_instrument.get(&instrument) {
            Some(series) => contributing.push((weight, series)),
            None => {
                warn!("No return series for {} (weight {})", instrument, weight);
                return ReturnSeries::default();
            }
        }
    }

    let Some(&(_, anchor)) = contributing.first() else {
        return ReturnSeries::default();
    };

    let points = anchor
        .points
        .iter()
        .filter_map(|p| {
            let mut total = 0.0;
            let mut defined = true;
            for &(weight, series) in &contributing {
                match series.get(p.date)?.value {
                    Some(r) => total += weight * r,
                    None => defined = false,
                }
            }
            Some(ReturnPoint {
                date: p.date,
                value: defined.then_some(total),
            })
        })
        .collect();
    ReturnSeries::new(points)
}

/// Running compounded return; undefined dates stay undefined and do not
/// move the running product.
pub fn cumulative_returns(returns: &ReturnSeries) -> ReturnSeries {
    let mut growth = 1.0;
    let points = returns
        .points
        .iter()
        .map(|p| ReturnPoint {
            date: p.date,
            value: p.value.map(|r| {
                growth *= 1.0 + r;
                growth - 1.0
            }),
        })
        .collect();
    ReturnSeries::new(points)
}

/// Start of the lookback window ending at `as_of`.
pub fn period_start(as_of: NaiveDate, period: Period) -> Option<NaiveDate> {
    match period {
        Period::OneWeek => as_of.checked_sub_signed(Duration::days(7)),
        Period::YearToDate => NaiveDate::from_ymd_opt(as_of.year(), 1, 1),
        Period::OneYear => as_of.checked_sub_months(Months::new(12)),
        Period::ThreeYears => as_of.checked_sub_months(Months::new(36)),
        Period::FiveYears => as_of.checked_sub_months(Months::new(60)),
        Period::TenYears => as_of.checked_sub_months(Months::new(120)),
    }
}

/// Percentage change of a level series over `period`.
///
/// Measures from the earliest observation at or after the window start to
/// the last observation at or before `as_of`. `None` when the series does
/// not reach back to the window start.
pub fn period_change(levels: &[(NaiveDate, f64)], as_of: NaiveDate, period: Period) -> Option<f64> {
    let start = period_start(as_of, period)?;
    let &(first_date, _) = levels.first()?;
    if first_date > start {
        debug!(
            "{} window starts {} but data begins {}",
            period.label(),
            start,
            first_date
        );
        return None;
    }
    let &(start_date, start_level) = levels.iter().find(|(d, _)| *d >= start)?;
    let &(end_date, end_level) = levels.iter().rev().find(|(d, _)| *d <= as_of)?;
    if end_date < start_date || start_level <= 0.0 {
        return None;
    }
    Some((end_level / start_level - 1.0) * 100.0)
}

/// Period return of one fund's price column; sentinels are skipped.
pub fn period_return(
    prices: &[(NaiveDate, Option<f64>)],
    as_of: NaiveDate,
    period: Period,
) -> Option<f64> {
    let levels: Vec<(NaiveDate, f64)> = prices
        .iter()
        .filter_map(|&(d, p)| p.map(|p| (d, p)))
        .collect();
    period_change(&levels, as_of, period)
}

/// Period return of a daily return series, compounded through its growth index.
///
/// `base_date` is the date the index starts from at 1.0, i.e. the price date
/// the first defined return is measured against.
pub fn portfolio_period_return(
    returns: &ReturnSeries,
    base_date: Option<NaiveDate>,
    as_of: NaiveDate,
    period: Period,
) -> Option<f64> {
    let mut levels: Vec<(NaiveDate, f64)> = base_date.map(|d| (d, 1.0)).into_iter().collect();
    levels.extend(cumulative_returns(returns).defined().map(|(d, c)| (d, 1.0 + c)));
    period_change(&levels, as_of, period)
}

/// Table date immediately before the first defined portfolio return.
fn growth_base(table: &HistoricalTable, portfolio: &ReturnSeries) -> Option<NaiveDate> {
    let (first, _) = portfolio.defined().next()?;
    table.rows().iter().rev().map(|r| r.date).find(|d| *d < first)
}

fn period_set(f: impl Fn(Period) -> Option<f64>) -> PeriodReturnSet {
    Period::ALL.into_iter().map(|p| (p, f(p))).collect()
}

/// Period returns for every fund and for the blended portfolio.
pub fn performance_table(
    table: &HistoricalTable,
    portfolio: &ReturnSeries,
    as_of: NaiveDate,
) -> PerformanceTable {
    let funds = Instrument::ALL
        .into_iter()
        .map(|instrument| {
            let column = table.column(instrument);
            let perf = FundPerformance {
                first_date: table.first_date_for(instrument),
                returns: period_set(|p| period_return(&column, as_of, p)),
            };
            (instrument, perf)
        })
        .collect();

    let base = growth_base(table, portfolio);
    PerformanceTable {
        as_of,
        funds,
        portfolio: period_set(|p| portfolio_period_return(portfolio, base, as_of, p)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PriceRow;
    use approx::assert_relative_eq;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn daily_returns_skip_first_date() {
        let prices = vec![
            (d(2024, 1, 2), Some(100.0)),
            (d(2024, 1, 3), Some(101.0)),
            (d(2024, 1, 4), Some(99.99)),
        ];
        let r = daily_returns(&prices);
        assert_eq!(r.len(), 2);
        assert_eq!(r.points[0].date, d(2024, 1, 3));
        assert_relative_eq!(r.points[0].value.unwrap(), 0.01, epsilon = 1e-12);
        assert_relative_eq!(r.points[1].value.unwrap(), -0.01, epsilon = 1e-12);
    }

    #[test]
    fn sentinel_makes_return_undefined_on_both_sides() {
        let prices = vec![
            (d(2024, 1, 2), Some(100.0)),
            (d(2024, 1, 3), None),
            (d(2024, 1, 4), Some(102.0)),
            (d(2024, 1, 5), Some(102.0)),
        ];
        let r = daily_returns(&prices);
        assert_eq!(r.points[0].value, None);
        assert_eq!(r.points[1].value, None);
        assert_eq!(r.points[2].value, Some(0.0));
        assert!(r.defined().all(|(_, v)| v.is_finite()));
    }

    #[test]
    fn portfolio_blends_weighted_returns() {
        let mut per = BTreeMap::new();
        per.insert(
            Instrument::UsStocks,
            daily_returns(&[(d(2024, 1, 2), Some(100.0)), (d(2024, 1, 3), Some(110.0))]),
        );
        per.insert(
            Instrument::UsBonds,
            daily_returns(&[(d(2024, 1, 2), Some(50.0)), (d(2024, 1, 3), Some(49.0))]),
        );
        let weights = AllocationWeights {
            us_stocks: 0.6,
            intl_stocks: 0.0,
            us_bonds: 0.4,
            intl_bonds: 0.0,
        };
        let p = portfolio_daily_returns(&per, &weights);
        assert_eq!(p.len(), 1);
        assert_relative_eq!(p.points[0].value.unwrap(), 0.6 * 0.1 + 0.4 * -0.02, epsilon = 1e-12);
    }

    #[test]
    fn zero_weight_gaps_do_not_block_portfolio() {
        let table = HistoricalTable::from_rows(vec![
            PriceRow {
                date: d(2024, 1, 2),
                prices: [Some(100.0), None, Some(50.0), None],
            },
            PriceRow {
                date: d(2024, 1, 3),
                prices: [Some(101.0), None, Some(50.5), None],
            },
        ]);
        let weights = AllocationWeights {
            us_stocks: 0.5,
            intl_stocks: 0.0,
            us_bonds: 0.5,
            intl_bonds: 0.0,
        };
        let p = portfolio_daily_returns(&instrument_returns(&table), &weights);
        assert_relative_eq!(p.points[0].value.unwrap(), 0.01, epsilon = 1e-12);
    }

    #[test]
    fn weighted_gap_makes_portfolio_undefined() {
        let table = HistoricalTable::from_rows(vec![
            PriceRow {
                date: d(2024, 1, 2),
                prices: [Some(100.0), Some(40.0), None, None],
            },
            PriceRow {
                date: d(2024, 1, 3),
                prices: [Some(101.0), None, None, None],
            },
        ]);
        let weights = AllocationWeights {
            us_stocks: 0.5,
            intl_stocks: 0.5,
            us_bonds: 0.0,
            intl_bonds: 0.0,
        };
        let p = portfolio_daily_returns(&instrument_returns(&table), &weights);
        assert_eq!(p.points[0].value, None);
    }

    #[test]
    fn cumulative_compounds_and_leaves_input_alone() {
        let r = ReturnSeries::new(vec![
            ReturnPoint { date: d(2024, 1, 2), value: Some(0.01) },
            ReturnPoint { date: d(2024, 1, 3), value: None },
            ReturnPoint { date: d(2024, 1, 4), value: Some(0.005) },
            ReturnPoint { date: d(2024, 1, 5), value: Some(-0.002) },
        ]);
        let before = r.clone();
        let c = cumulative_returns(&r);
        assert_eq!(r, before);
        assert_relative_eq!(c.points[0].value.unwrap(), 0.01, epsilon = 1e-12);
        assert_eq!(c.points[1].value, None);
        assert_relative_eq!(c.points[2].value.unwrap(), 1.01 * 1.005 - 1.0, epsilon = 1e-12);
        assert_relative_eq!(c.points[3].value.unwrap(), 1.01 * 1.005 * 0.998 - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn period_return_uses_bracketing_observations() {
        let prices = vec![
            (d(2023, 1, 3), Some(80.0)),
            (d(2023, 6, 1), Some(90.0)),
            (d(2023, 12, 29), Some(95.0)),
            (d(2024, 1, 2), Some(100.0)),
            (d(2024, 5, 31), Some(110.0)),
            (d(2024, 6, 3), Some(120.0)),
        ];
        let as_of = d(2024, 6, 3);
        // window starts 2023-06-03, first observation on or after is 2023-12-29
        assert_relative_eq!(
            period_return(&prices, as_of, Period::OneYear).unwrap(),
            (120.0 / 95.0 - 1.0) * 100.0,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            period_return(&prices, as_of, Period::YearToDate).unwrap(),
            20.0,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            period_return(&prices, as_of, Period::OneWeek).unwrap(),
            (120.0 / 110.0 - 1.0) * 100.0,
            epsilon = 1e-9
        );
        assert_eq!(period_return(&prices, as_of, Period::ThreeYears), None);
    }

    #[test]
    fn period_return_is_unavailable_not_zero_for_short_history() {
        let prices = vec![(d(2024, 3, 1), Some(10.0)), (d(2024, 6, 3), Some(10.0))];
        assert_eq!(period_return(&prices, d(2024, 6, 3), Period::OneYear), None);
        assert_eq!(
            period_return(&prices, d(2024, 6, 3), Period::YearToDate),
            None
        );
    }

    #[test]
    fn portfolio_period_return_compounds_daily_returns() {
        let r = ReturnSeries::new(vec![
            ReturnPoint { date: d(2024, 5, 24), value: Some(0.0) },
            ReturnPoint { date: d(2024, 5, 28), value: Some(0.1) },
            ReturnPoint { date: d(2024, 5, 29), value: None },
            ReturnPoint { date: d(2024, 5, 30), value: Some(0.1) },
        ]);
        let week = portfolio_period_return(&r, None, d(2024, 5, 31), Period::OneWeek).unwrap();
        assert_relative_eq!(week, (1.1 * 1.1 - 1.0) * 100.0, epsilon = 1e-9);
    }

    #[test]
    fn performance_table_reports_first_dates() {
        let table = HistoricalTable::from_rows(vec![
            PriceRow {
                date: d(2024, 1, 2),
                prices: [Some(100.0), None, Some(50.0), Some(20.0)],
            },
            PriceRow {
                date: d(2024, 1, 9),
                prices: [Some(102.0), Some(40.0), Some(50.0), Some(20.0)],
            },
        ]);
        let weights = AllocationWeights {
            us_stocks: 1.0,
            intl_stocks: 0.0,
            us_bonds: 0.0,
            intl_bonds: 0.0,
        };
        let portfolio = portfolio_daily_returns(&instrument_returns(&table), &weights);
        let perf = performance_table(&table, &portfolio, d(2024, 1, 9));
        assert_eq!(
            perf.funds[&Instrument::IntlStocks].first_date,
            Some(d(2024, 1, 9))
        );
        let vti_week = perf.funds[&Instrument::UsStocks].returns[&Period::OneWeek];
        assert_relative_eq!(vti_week.unwrap(), 2.0, epsilon = 1e-9);
        assert_eq!(perf.funds[&Instrument::IntlStocks].returns[&Period::OneWeek], None);
        // the growth index starts at the first price date, like the fund's own
        assert_relative_eq!(
            perf.portfolio[&Period::OneWeek].unwrap(),
            vti_week.unwrap(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn portfolio_growth_index_starts_before_first_return() {
        let r = ReturnSeries::new(vec![
            ReturnPoint { date: d(2024, 5, 28), value: Some(0.1) },
            ReturnPoint { date: d(2024, 5, 31), value: Some(0.1) },
        ]);
        assert_eq!(portfolio_period_return(&r, None, d(2024, 5, 31), Period::OneWeek), None);
        let week =
            portfolio_period_return(&r, Some(d(2024, 5, 24)), d(2024, 5, 31), Period::OneWeek).unwrap();
        assert_relative_eq!(week, (1.1 * 1.1 - 1.0) * 100.0, epsilon = 1e-9);
    }
}

// tests/portfolio_properties.rs
use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

use four_fund_planner::models::{HistoricalTable, Instrument, Period, PriceRow};
use four_fund_planner::services::allocation::decompose;
use four_fund_planner::services::calculations::{
    instrument_returns, performance_table, portfolio_daily_returns,
};
use four_fund_planner::services::risk::sharpe_ratio;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 2).unwrap()
}

/// Builds a table from per-row prices; a `None` cell is a missing price.
fn table_from(prices: &[[Option<f64>; 4]]) -> HistoricalTable {
    HistoricalTable::from_rows(
        prices
            .iter()
            .enumerate()
            .map(|(i, p)| PriceRow {
                date: start() + Duration::days(i as i64),
                prices: *p,
            })
            .collect(),
    )
}

fn price_rows() -> impl Strategy<Value = Vec<[Option<f64>; 4]>> {
    let cell = prop_oneof![
        1 => Just(None::<f64>),
        6 => (1.0f64..500.0).prop_map(Some),
    ];
    prop::collection::vec(prop::array::uniform4(cell), 2..60)
}

fn complete_rows() -> impl Strategy<Value = Vec<[Option<f64>; 4]>> {
    prop::collection::vec(prop::array::uniform4((1.0f64..500.0).prop_map(Some)), 2..60)
}

/// Both unavailable, or equal to within 1e-9 relative to the larger magnitude.
fn same_period_return(portfolio: Option<f64>, fund: Option<f64>) -> bool {
    match (portfolio, fund) {
        (None, None) => true,
        (Some(p), Some(f)) => (p - f).abs() <= 1e-9 * p.abs().max(f.abs()).max(1.0),
        _ => false,
    }
}

fn assert_portfolio_row_matches_vti(table: &HistoricalTable) -> Result<(), TestCaseError> {
    let weights = decompose(100.0, 0.0, 35.0).unwrap();
    let portfolio = portfolio_daily_returns(&instrument_returns(table), &weights);
    let as_of = table.last_date().unwrap();
    let perf = performance_table(table, &portfolio, as_of);
    let vti = &perf.funds[&Instrument::UsStocks].returns;
    for period in Period::ALL {
        prop_assert!(
            same_period_return(perf.portfolio[&period], vti[&period]),
            "{}: portfolio {:?} vs VTI {:?}",
            period.label(),
            perf.portfolio[&period],
            vti[&period]
        );
    }
    Ok(())
}

proptest! {
    #[test]
    fn all_in_us_stocks_period_returns_match_vti(rows in complete_rows()) {
        assert_portfolio_row_matches_vti(&table_from(&rows))?;
    }

    #[test]
    fn all_in_us_stocks_mirrors_vti(rows in price_rows(), intl_bonds in 0.0f64..=100.0) {
        let table = table_from(&rows);
        let per_fund = instrument_returns(&table);
        let weights = decompose(100.0, 0.0, intl_bonds).unwrap();
        let portfolio = portfolio_daily_returns(&per_fund, &weights);

        let vti = &per_fund[&Instrument::UsStocks];
        prop_assert_eq!(portfolio.len(), vti.len());
        for (p, v) in portfolio.points.iter().zip(&vti.points) {
            prop_assert_eq!(p.date, v.date);
            prop_assert_eq!(p.value, v.value);
        }
    }

    #[test]
    fn portfolio_returns_are_never_infinite(
        rows in price_rows(),
        stocks in 0.0f64..=100.0,
        intl_stocks in 0.0f64..=100.0,
        intl_bonds in 0.0f64..=100.0,
    ) {
        let table = table_from(&rows);
        let weights = decompose(stocks, intl_stocks, intl_bonds).unwrap();
        let portfolio = portfolio_daily_returns(&instrument_returns(&table), &weights);
        for p in &portfolio.points {
            if let Some(v) = p.value {
                prop_assert!(v.is_finite());
            }
        }
        if let Ok(Some(sharpe)) = sharpe_ratio(&portfolio, 0.0) {
            prop_assert!(sharpe.is_finite());
        }
    }
}

#[test]
fn missing_price_makes_single_fund_portfolio_undefined() {
    let table = table_from(&[
        [Some(100.0), Some(50.0), Some(80.0), Some(40.0)],
        [None, Some(51.0), Some(80.5), Some(40.1)],
        [Some(102.0), Some(52.0), Some(81.0), Some(40.2)],
    ]);
    let per_fund = instrument_returns(&table);
    let weights = decompose(100.0, 0.0, 0.0).unwrap();
    let portfolio = portfolio_daily_returns(&per_fund, &weights);

    assert_eq!(portfolio.len(), 2);
    assert!(portfolio.points.iter().all(|p| p.value.is_none()));

    // the same sentinel is invisible to an allocation with no US stocks
    let bonds_only = decompose(0.0, 50.0, 40.0).unwrap();
    let bonds = portfolio_daily_returns(&per_fund, &bonds_only);
    assert!(bonds.points.iter().all(|p| p.value.is_some()));
}

#[test]
fn all_in_us_stocks_period_returns_match_vti_over_years() {
    let rows: Vec<[Option<f64>; 4]> = (0..1200)
        .map(|i| {
            let t = i as f64;
            [
                Some(100.0 * 1.0004f64.powi(i) * (1.0 + 0.02 * (t / 7.0).sin())),
                Some(60.0 + 5.0 * (t / 30.0).cos()),
                Some(80.0 - 0.001 * t),
                Some(50.0 + 0.002 * t),
            ]
        })
        .collect();
    let table = table_from(&rows);
    assert_portfolio_row_matches_vti(&table).unwrap();

    let weights = decompose(100.0, 0.0, 0.0).unwrap();
    let portfolio = portfolio_daily_returns(&instrument_returns(&table), &weights);
    let perf = performance_table(&table, &portfolio, table.last_date().unwrap());
    assert!(perf.portfolio[&Period::ThreeYears].is_some());
    assert!(perf.portfolio[&Period::FiveYears].is_none());
}

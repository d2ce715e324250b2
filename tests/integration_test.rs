//! Integration tests for the simulation pipeline.
//!
//! Tests cover:
//! - Worked end-to-end examples with hand-computed capital
//! - No look-ahead over a staggered multi-instrument market
//! - The built-in strategies on small known markets
//! - Repeatability of runs over the same market
//! - Universe loading through a mock data port

mod common;

use approx::assert_relative_eq;
use chrono::NaiveDate;
use common::*;
use std::cell::RefCell;
use std::rc::Rc;
use stocksim::cli::{simulate, RunPlan};
use stocksim::domain::error::StocksimError;
use stocksim::domain::ledger::Ledger;
use stocksim::domain::market::MarketView;
use stocksim::domain::position::Side;
use stocksim::domain::simulator::Simulator;
use stocksim::domain::strategy::{
    InterDayEven, NoTrade, SinglePick, Strategy, StrategyKind, StrategyOptions,
};
use stocksim::ports::data_port::DateRange;

/// Buys a fixed lot at the first close and sells it at the next open.
struct ScriptedRoundTrip {
    instrument: &'static str,
    quantity: i64,
    day: usize,
}

impl Strategy for ScriptedRoundTrip {
    fn name(&self) -> &str {
        "scripted"
    }

    fn on_day(
        &mut self,
        view: &MarketView<'_>,
        ledger: &mut Ledger,
        date: NaiveDate,
        _options: &StrategyOptions,
    ) -> Result<(), StocksimError> {
        if let Some(bar) = view.today(self.instrument) {
            match self.day {
                0 => {
                    ledger.buy(self.instrument, date, bar.close, Some(self.quantity))?;
                }
                1 => {
                    ledger.sell(self.instrument, date, bar.open, None)?;
                }
                _ => {}
            }
            self.day += 1;
        }
        Ok(())
    }
}

mod end_to_end {
    use super::*;

    #[test]
    fn no_op_strategy_keeps_starting_cash() {
        let market = market(vec![
            make_bar("ADS.DE", "2014-01-02", 100.0, 110.0),
            make_bar("ADS.DE", "2014-01-03", 108.0, 120.0),
        ]);
        let result = Simulator::new(&market)
            .run(
                &mut NoTrade,
                &ledger_config(10_000.0, 0.0, 0.26375),
                &StrategyOptions::default(),
            )
            .unwrap();

        let capital: Vec<f64> = result.capital_curve.iter().map(|p| p.capital).collect();
        assert_eq!(capital, vec![10_000.0, 10_000.0]);
        assert_eq!(result.capital_curve[0].date, date(2014, 1, 2));
        assert_eq!(result.capital_curve[1].date, date(2014, 1, 3));
        assert!(result.ledger.fills().is_empty());
    }

    #[test]
    fn fee_and_tax_on_a_single_round_trip() {
        let market = market(vec![
            make_bar("ADS.DE", "2014-01-02", 95.0, 100.0),
            make_bar("ADS.DE", "2014-01-03", 110.0, 112.0),
        ]);
        let mut strategy = ScriptedRoundTrip {
            instrument: "ADS.DE",
            quantity: 5,
            day: 0,
        };
        let result = Simulator::new(&market)
            .run(
                &mut strategy,
                &ledger_config(1000.0, 1.0, 0.25),
                &StrategyOptions::default(),
            )
            .unwrap();

        assert_relative_eq!(result.capital_curve[0].capital, 499.0);
        assert_relative_eq!(result.capital_curve[1].capital, 1035.5);
        assert_relative_eq!(result.taxes_paid(), 12.5);
        assert_relative_eq!(result.fees_paid(), 2.0);
        assert!(result.ledger.is_flat());
        let dates: Vec<_> = result.ledger.fills().iter().map(|f| f.date).collect();
        assert_eq!(dates, vec![date(2014, 1, 2), date(2014, 1, 3)]);
    }

    #[test]
    fn held_positions_are_liquidated_after_the_last_day() {
        let market = market(vec![
            make_bar("ADS.DE", "2014-01-02", 95.0, 100.0),
            make_bar("ADS.DE", "2014-01-03", 101.0, 104.0),
            make_bar("ADS.DE", "2014-01-06", 103.0, 120.0),
        ]);
        // Only ever buys; the simulator sells the lot at the final close.
        let mut hold_only = HoldOnly(ScriptedRoundTrip {
            instrument: "ADS.DE",
            quantity: 5,
            day: 0,
        });
        let result = Simulator::new(&market)
            .run(
                &mut hold_only,
                &ledger_config(1000.0, 0.0, 0.5),
                &StrategyOptions::default(),
            )
            .unwrap();

        let capital: Vec<f64> = result.capital_curve.iter().map(|p| p.capital).collect();
        // Cash only, never marked to market, until the final overwrite:
        // 500 + 5 * 120 - 0.5 * 20 * 5.
        assert_eq!(capital, vec![500.0, 500.0, 1050.0]);
        assert!(result.ledger.is_flat());
    }

    struct HoldOnly(ScriptedRoundTrip);

    impl Strategy for HoldOnly {
        fn name(&self) -> &str {
            "hold_only"
        }

        fn on_day(
            &mut self,
            view: &MarketView<'_>,
            ledger: &mut Ledger,
            date: NaiveDate,
            options: &StrategyOptions,
        ) -> Result<(), StocksimError> {
            if self.0.day == 0 {
                self.0.on_day(view, ledger, date, options)?;
            }
            Ok(())
        }
    }

    #[test]
    fn missing_final_close_fails_the_run() {
        let market = market(vec![
            make_bar("ADS.DE", "2014-01-02", 95.0, 100.0),
            make_bar("BMW.DE", "2014-01-03", 50.0, 51.0),
        ]);
        let mut strategy = HoldOnly(ScriptedRoundTrip {
            instrument: "ADS.DE",
            quantity: 1,
            day: 0,
        });
        let err = Simulator::new(&market)
            .run(
                &mut strategy,
                &ledger_config(1000.0, 0.0, 0.0),
                &StrategyOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, StocksimError::MissingPrice { ref instrument } if instrument == "ADS.DE"));
    }
}

mod look_ahead {
    use super::*;

    /// Records, per call, the date and the newest bar date reachable through the view.
    struct Recorder {
        seen: Rc<RefCell<Vec<(NaiveDate, NaiveDate, usize)>>>,
        probe_future: bool,
    }

    impl Strategy for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn on_day(
            &mut self,
            view: &MarketView<'_>,
            _ledger: &mut Ledger,
            date: NaiveDate,
            _options: &StrategyOptions,
        ) -> Result<(), StocksimError> {
            assert_eq!(view.cutoff(), date);
            let newest_row = view.rows().map(|b| b.date).max().unwrap_or(date);
            let newest_history = view
                .instruments()
                .into_iter()
                .filter_map(|i| view.history(i).last().map(|b| b.date))
                .max()
                .unwrap_or(date);
            if self.probe_future {
                let tomorrow = date.succ_opt().unwrap();
                for instrument in ["ADS.DE", "BMW.DE", "SAP.DE"] {
                    assert!(view.bar(instrument, tomorrow).is_none());
                }
            }
            self.seen.borrow_mut().push((
                date,
                newest_row.max(newest_history),
                view.instruments().len(),
            ));
            Ok(())
        }
    }

    fn staggered_market() -> stocksim::domain::market::MarketData {
        let mut bars = generate_bars("ADS.DE", "2014-01-01", 10, 100.0);
        bars.extend(generate_bars("BMW.DE", "2014-01-04", 4, 50.0));
        bars.extend(generate_bars("SAP.DE", "2014-01-08", 6, 70.0));
        market(bars)
    }

    #[test]
    fn strategy_never_sees_future_bars() {
        let market = staggered_market();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut recorder = Recorder {
            seen: Rc::clone(&seen),
            probe_future: true,
        };
        Simulator::new(&market)
            .run(
                &mut recorder,
                &ledger_config(1000.0, 0.0, 0.0),
                &StrategyOptions::default(),
            )
            .unwrap();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 13);
        for &(date, newest, _) in seen.iter() {
            assert!(newest <= date, "saw {newest} on {date}");
        }
    }

    #[test]
    fn instruments_appear_as_their_history_starts() {
        let market = staggered_market();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut recorder = Recorder {
            seen: Rc::clone(&seen),
            probe_future: false,
        };
        Simulator::new(&market)
            .run(
                &mut recorder,
                &ledger_config(1000.0, 0.0, 0.0),
                &StrategyOptions::default(),
            )
            .unwrap();

        let counts: Vec<usize> = seen.borrow().iter().map(|&(_, _, n)| n).collect();
        // BMW joins on the 4th, SAP on the 8th and stays visible after ADS ends.
        assert_eq!(counts, vec![1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 3, 3]);
    }

    #[test]
    fn dates_come_in_ascending_order_without_gaps_in_the_union() {
        let market = staggered_market();
        let dates = Simulator::new(&market).dates().to_vec();
        assert_eq!(dates.first(), Some(&date(2014, 1, 1)));
        assert_eq!(dates.last(), Some(&date(2014, 1, 13)));
        assert!(dates.windows(2).all(|w| w[0] < w[1]));
    }
}

mod strategies {
    use super::*;

    fn two_instrument_market() -> stocksim::domain::market::MarketData {
        market(vec![
            make_bar("ADS.DE", "2014-01-02", 99.0, 100.0),
            make_bar("ADS.DE", "2014-01-03", 102.0, 101.0),
            make_bar("BMW.DE", "2014-01-02", 49.0, 50.0),
            make_bar("BMW.DE", "2014-01-03", 51.0, 50.0),
        ])
    }

    #[test]
    fn even_split_round_trips_every_instrument() {
        let market = two_instrument_market();
        let result = Simulator::new(&market)
            .run(
                &mut InterDayEven,
                &ledger_config(1000.0, 0.0, 0.0),
                &StrategyOptions::default(),
            )
            .unwrap();

        // Budget 500 each: 5 ADS bought at 100 sold at 102, 10 BMW at 50 sold at 51.
        assert_relative_eq!(result.capital_curve[0].capital, 1000.0);
        assert_relative_eq!(result.capital_curve[1].capital, 1020.0);
        let bought: Vec<(String, i64)> = result
            .ledger
            .fills()
            .iter()
            .filter(|f| f.side == Side::Buy)
            .map(|f| (f.instrument.clone(), f.quantity))
            .collect();
        assert_eq!(
            bought,
            vec![("ADS.DE".to_string(), 5), ("BMW.DE".to_string(), 10)]
        );
    }

    #[test]
    fn even_split_pays_tax_on_gains() {
        let market = two_instrument_market();
        let result = Simulator::new(&market)
            .run(
                &mut InterDayEven,
                &ledger_config(1000.0, 0.0, 0.25),
                &StrategyOptions::default(),
            )
            .unwrap();
        assert_relative_eq!(result.final_capital(), 1015.0);
        assert_relative_eq!(result.taxes_paid(), 5.0);
    }

    #[test]
    fn even_split_fee_reduces_budget() {
        let market = two_instrument_market();
        let result = Simulator::new(&market)
            .run(
                &mut InterDayEven,
                &ledger_config(1000.0, 1.0, 0.0),
                &StrategyOptions::default(),
            )
            .unwrap();
        // Budget 499: 4 ADS and 9 BMW, four fees in total.
        assert_relative_eq!(result.final_capital(), 1000.0 + 4.0 * 2.0 + 9.0 * 1.0 - 4.0);
    }

    fn gapping_market() -> stocksim::domain::market::MarketData {
        let mut bars = Vec::new();
        for day in 2..=5 {
            let d = format!("2014-01-0{day}");
            let (down_open, up_open) = if day == 2 { (10.0, 10.0) } else { (9.0, 11.0) };
            bars.push(make_bar("AAA.DE", &d, down_open, 10.0));
            bars.push(make_bar("ZZZ.DE", &d, up_open, 10.0));
        }
        market(bars)
    }

    #[test]
    fn greedy_follows_the_best_gap_record() {
        let market = gapping_market();
        let mut greedy = SinglePick::greedy();
        let result = Simulator::new(&market)
            .run(
                &mut greedy,
                &ledger_config(1000.0, 0.0, 0.0),
                &StrategyOptions::default(),
            )
            .unwrap();

        let bought: Vec<&str> = result
            .ledger
            .fills()
            .iter()
            .filter(|f| f.side == Side::Buy)
            .map(|f| f.instrument.as_str())
            .collect();
        // Day 3 has no scored move yet, so the tie goes to AAA.DE.
        assert_eq!(bought, vec!["AAA.DE", "ZZZ.DE", "ZZZ.DE"]);
        assert_eq!(result.capital_curve.len(), 4);
    }

    #[test]
    fn random_pick_is_reproducible_for_a_seed() {
        let market = gapping_market();
        let sim = Simulator::new(&market);
        let run = |seed: u64| {
            let mut strategy = SinglePick::random(seed);
            sim.run(
                &mut strategy,
                &ledger_config(1000.0, 0.0, 0.0),
                &StrategyOptions::default(),
            )
            .unwrap()
        };

        let first = run(7);
        let second = run(7);
        assert_eq!(first.capital_curve, second.capital_curve);
        assert_eq!(first.ledger.fills(), second.ledger.fills());
        // One round trip per tradable day.
        assert_eq!(first.ledger.fills().len(), 6);
    }
}

mod repeatability {
    use super::*;

    #[test]
    fn repeated_runs_produce_identical_results() {
        let mut bars = generate_bars("ADS.DE", "2014-01-01", 30, 100.0);
        bars.extend(generate_bars("BMW.DE", "2014-01-05", 20, 60.0));
        let market = market(bars);
        let sim = Simulator::new(&market);
        let config = ledger_config(10_000.0, 1.0, 0.26375);
        let options = StrategyOptions::default();

        for kind in StrategyKind::ALL {
            let a = sim.run(kind.build(&options).as_mut(), &config, &options).unwrap();
            let b = sim.run(kind.build(&options).as_mut(), &config, &options).unwrap();
            assert_eq!(a.capital_curve, b.capital_curve, "{kind} diverged");
        }
    }

    #[test]
    fn compare_matches_individual_runs() {
        let market = market(generate_bars("ADS.DE", "2014-01-01", 15, 100.0));
        let sim = Simulator::new(&market);
        let config = ledger_config(5_000.0, 0.0, 0.0);
        let options = StrategyOptions::default();

        let compared = sim.compare(&StrategyKind::ALL, &config, &options).unwrap();
        for (kind, result) in &compared {
            let alone = sim.run(kind.build(&options).as_mut(), &config, &options).unwrap();
            assert_eq!(result.capital_curve, alone.capital_curve);
        }
    }
}

mod pipeline {
    use super::*;

    fn plan(instruments: &[&str], range: DateRange) -> RunPlan {
        RunPlan {
            instruments: instruments.iter().map(|s| s.to_string()).collect(),
            range,
            ledger: ledger_config(10_000.0, 0.0, 0.0),
            options: StrategyOptions::default(),
        }
    }

    #[test]
    fn full_pipeline_with_mock_data_port() {
        let port = MockDataPort::new()
            .with_bars("ADS.DE", generate_bars("ADS.DE", "2014-01-01", 10, 100.0))
            .with_bars("BMW.DE", generate_bars("BMW.DE", "2014-01-01", 10, 50.0));

        let results = simulate(
            &port,
            &plan(&["ADS.DE", "BMW.DE"], DateRange::default()),
            &[StrategyKind::InterDayEven],
        )
        .unwrap();

        assert_eq!(results.len(), 1);
        let (kind, result) = &results[0];
        assert_eq!(*kind, StrategyKind::InterDayEven);
        assert_eq!(result.capital_curve.len(), 10);
        // Every open gaps half a point above the previous close.
        assert!(result.final_capital() > 10_000.0);
        assert!(result.ledger.is_flat());
    }

    #[test]
    fn date_range_limits_the_timeline() {
        let port =
            MockDataPort::new().with_bars("ADS.DE", generate_bars("ADS.DE", "2014-01-01", 10, 100.0));
        let range = DateRange {
            start: Some(date(2014, 1, 3)),
            end: Some(date(2014, 1, 6)),
        };

        let results = simulate(&port, &plan(&["ADS.DE"], range), &[StrategyKind::NoTrade]).unwrap();
        let dates: Vec<NaiveDate> = results[0].1.capital_curve.iter().map(|p| p.date).collect();
        assert_eq!(
            dates,
            vec![date(2014, 1, 3), date(2014, 1, 4), date(2014, 1, 5), date(2014, 1, 6)]
        );
    }

    #[test]
    fn failing_instruments_are_skipped() {
        let port = MockDataPort::new()
            .with_bars("ADS.DE", generate_bars("ADS.DE", "2014-01-01", 5, 100.0))
            .with_error("BMW.DE", "corrupt file");

        let results = simulate(
            &port,
            &plan(&["ADS.DE", "BMW.DE", "SAP.DE"], DateRange::default()),
            &[StrategyKind::InterDayGreedy],
        )
        .unwrap();
        assert_eq!(results[0].1.capital_curve.len(), 5);
        assert!(
            results[0]
                .1
                .ledger
                .fills()
                .iter()
                .all(|f| f.instrument == "ADS.DE")
        );
    }

    #[test]
    fn nothing_loadable_is_an_error() {
        let port = MockDataPort::new().with_error("BMW.DE", "corrupt file");
        let err = simulate(
            &port,
            &plan(&["BMW.DE"], DateRange::default()),
            &[StrategyKind::NoTrade],
        )
        .unwrap_err();
        assert!(matches!(err, StocksimError::NoData { .. }));
    }
}

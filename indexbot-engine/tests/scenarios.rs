use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use indexbot_data::Tick;
use indexbot_engine::{ActionKind, Engine, EngineConfig};
use indexbot_execution::PaperBrokerAdapter;
use indexbot_instrument::calendar::FixedClock;
use indexbot_instrument::{InstrumentRef, Root, Side};
use indexbot_journal::{InMemoryTradeJournal, Mode};
use rust_decimal_macros::dec;
use std::sync::Arc;

fn wide_open_window() -> (NaiveTime, NaiveTime) {
    (NaiveTime::from_hms_opt(0, 0, 0).unwrap(), NaiveTime::from_hms_opt(23, 59, 59).unwrap())
}

fn tick(secs: i64, price: rust_decimal::Decimal) -> Tick {
    Tick::new(Utc.timestamp_opt(secs, 0).unwrap(), price)
}

/// The SuperTrend's first-ever emitted direction is always Down (the
/// freshly-initialized upper band sits above the bar's own close), so the
/// first flip always opens a PE. The upper band then stays pinned at that
/// level until price actually trades through it, so a sharp rally (not a
/// slow grind) is what is needed to flip the indicator back to Up and close
/// the PE via the Reversal trigger, even though neither the stop nor the
/// target were touched.
#[tokio::test]
async fn flip_to_down_opens_a_put_then_a_rally_reverses_it_out() {
    let (entry_open, entry_close) = wide_open_window();
    let config = EngineConfig {
        interval_seconds: 60,
        supertrend_period: 3,
        supertrend_multiplier: dec!(1),
        session_open_ist: entry_open,
        session_close_ist: entry_close,
        entry_open_ist: entry_open,
        entry_close_ist: entry_close,
        ..EngineConfig::default()
    };

    let instrument = InstrumentRef::for_root(Root::Nifty);
    let clock = Arc::new(FixedClock(Utc.timestamp_opt(0, 0).unwrap()));
    let broker = Arc::new(PaperBrokerAdapter::new(clock.clone(), instrument.clone()));
    let expiry = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
    broker.set_next_expiry(expiry);
    // candle close=104 -> ATM strike 100, PE (see doc comment above).
    broker.set_option_price(&format!("PAPER:{}:{}:{}:{}", Root::Nifty, expiry, dec!(100), Side::Put), dec!(50));

    let journal = Arc::new(InMemoryTradeJournal::new());
    let mut engine = Engine::new(
        "nifty-intraday-1".to_string(),
        Mode::Paper,
        instrument,
        config,
        clock,
        broker,
        journal.clone(),
    );
    engine.start();

    let ticks = [
        // candle0 close=100
        tick(0, dec!(97)),
        tick(10, dec!(103)),
        tick(20, dec!(100)),
        // candle1 close=102 (closes candle0)
        tick(60, dec!(99)),
        tick(70, dec!(105)),
        tick(80, dec!(102)),
        // candle2 close=104 (closes candle1 -> first direction emitted, entry fires)
        tick(120, dec!(101)),
        tick(130, dec!(107)),
        tick(140, dec!(104)),
        // candle3 close=150 (closes candle2; a sharp rally clears the
        // pinned upper band and flips the indicator back to Up)
        tick(180, dec!(147)),
        tick(190, dec!(153)),
        tick(200, dec!(150)),
        // closes candle3 -> reversal fires here
        tick(240, dec!(150)),
    ];

    for t in ticks {
        engine.on_index_tick(t).await.unwrap();
    }

    let snapshot = engine.snapshot();
    assert!(snapshot.position.is_none(), "the rally should have reversed the PE out");
    let last_action = snapshot.last_action.expect("an exit should have been recorded");
    assert_eq!(last_action.kind, ActionKind::Exit);
    assert_eq!(last_action.reason.as_deref(), Some("Reversal"));
}

/// Force Flat is an unconditional wall-clock cutoff: it fires even though
/// nothing about the position's own risk state has changed.
#[tokio::test]
async fn force_flat_closes_the_open_position_at_the_cutoff_even_mid_trend() {
    let (entry_open, entry_close) = wide_open_window();
    let config = EngineConfig {
        interval_seconds: 60,
        supertrend_period: 1,
        supertrend_multiplier: dec!(1),
        session_open_ist: entry_open,
        session_close_ist: entry_close,
        entry_open_ist: entry_open,
        entry_close_ist: entry_close,
        force_flat_ist: NaiveTime::from_hms_opt(5, 31, 30).unwrap(),
        ..EngineConfig::default()
    };

    let instrument = InstrumentRef::for_root(Root::Nifty);
    let clock = Arc::new(FixedClock(Utc.timestamp_opt(0, 0).unwrap()));
    let broker = Arc::new(PaperBrokerAdapter::new(clock.clone(), instrument.clone()));
    let expiry = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
    broker.set_next_expiry(expiry);
    broker.set_option_price(&format!("PAPER:{}:{}:{}:{}", Root::Nifty, expiry, dec!(100), Side::Put), dec!(40));

    let journal = Arc::new(InMemoryTradeJournal::new());
    let mut engine = Engine::new(
        "nifty-intraday-2".to_string(),
        Mode::Paper,
        instrument,
        config,
        clock,
        broker,
        journal,
    );
    engine.start();

    // candle0 close=100 (period=1, so the direction is emitted and the
    // entry fires the instant this candle closes).
    engine.on_index_tick(tick(0, dec!(97))).await.unwrap();
    engine.on_index_tick(tick(10, dec!(103))).await.unwrap();
    engine.on_index_tick(tick(20, dec!(100))).await.unwrap();
    engine.on_index_tick(tick(60, dec!(99))).await.unwrap();

    assert!(engine.snapshot().position.is_some(), "entry should have fired on candle0's close");

    // 1970-01-01T00:01:40Z is 05:31:40 IST, past the 05:31:30 cutoff, and
    // still inside the candle opened by the tick(60) above so this tick
    // folds into it rather than closing it - the force flat trigger must
    // still fire even though no candle closed on this tick.
    engine.on_index_tick(tick(100, dec!(99))).await.unwrap();

    let snapshot = engine.snapshot();
    assert!(snapshot.position.is_none(), "force flat must close the position regardless of trend");
    let last_action = snapshot.last_action.expect("an exit should have been recorded");
    assert_eq!(last_action.reason.as_deref(), Some("Force Squareoff"));
}

#[tokio::test]
async fn manual_squareoff_closes_an_open_position_on_the_next_index_tick() {
    let (entry_open, entry_close) = wide_open_window();
    let config = EngineConfig {
        interval_seconds: 60,
        supertrend_period: 1,
        supertrend_multiplier: dec!(1),
        session_open_ist: entry_open,
        session_close_ist: entry_close,
        entry_open_ist: entry_open,
        entry_close_ist: entry_close,
        ..EngineConfig::default()
    };

    let instrument = InstrumentRef::for_root(Root::Nifty);
    let clock = Arc::new(FixedClock(Utc.timestamp_opt(0, 0).unwrap()));
    let broker = Arc::new(PaperBrokerAdapter::new(clock.clone(), instrument.clone()));
    let expiry = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
    broker.set_next_expiry(expiry);
    broker.set_option_price(&format!("PAPER:{}:{}:{}:{}", Root::Nifty, expiry, dec!(100), Side::Put), dec!(40));

    let journal = Arc::new(InMemoryTradeJournal::new());
    let mut engine = Engine::new(
        "nifty-intraday-3".to_string(),
        Mode::Paper,
        instrument,
        config,
        clock,
        broker,
        journal,
    );
    engine.start();

    engine.on_index_tick(tick(0, dec!(97))).await.unwrap();
    engine.on_index_tick(tick(10, dec!(103))).await.unwrap();
    engine.on_index_tick(tick(20, dec!(100))).await.unwrap();
    engine.on_index_tick(tick(60, dec!(99))).await.unwrap();
    assert!(engine.snapshot().position.is_some());

    engine.request_squareoff();
    engine.on_index_tick(tick(70, dec!(99))).await.unwrap();

    let snapshot = engine.snapshot();
    assert!(snapshot.position.is_none());
    assert_eq!(snapshot.last_action.unwrap().reason.as_deref(), Some("Manual Squareoff"));
}

/// A manual squareoff request and a candle-close reversal can both become
/// true for the very same index tick. The candle fold (and its reversal
/// check) runs before the manual-squareoff branch within one
/// `on_index_tick` call, so the reversal exit fires first, clears the
/// position, and the manual request is simply dropped on the floor rather
/// than racing it into a second SELL.
#[tokio::test]
async fn reversal_and_manual_squareoff_in_the_same_cycle_place_exactly_one_sell() {
    let (entry_open, entry_close) = wide_open_window();
    let config = EngineConfig {
        interval_seconds: 60,
        supertrend_period: 3,
        supertrend_multiplier: dec!(1),
        session_open_ist: entry_open,
        session_close_ist: entry_close,
        entry_open_ist: entry_open,
        entry_close_ist: entry_close,
        ..EngineConfig::default()
    };

    let instrument = InstrumentRef::for_root(Root::Nifty);
    let clock = Arc::new(FixedClock(Utc.timestamp_opt(0, 0).unwrap()));
    let broker = Arc::new(PaperBrokerAdapter::new(clock.clone(), instrument.clone()));
    let expiry = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
    broker.set_next_expiry(expiry);
    broker.set_option_price(&format!("PAPER:{}:{}:{}:{}", Root::Nifty, expiry, dec!(100), Side::Put), dec!(50));

    let journal = Arc::new(InMemoryTradeJournal::new());
    let mut engine = Engine::new(
        "nifty-intraday-4".to_string(),
        Mode::Paper,
        instrument,
        config,
        clock,
        broker.clone(),
        journal,
    );
    engine.start();

    // Same candle sequence as the rally-reversal scenario above: candle2's
    // close opens the PE, candle3's close (a sharp rally) flips the
    // indicator back to Up and would reverse it out on its own.
    let ticks_before_reversal = [
        tick(0, dec!(97)),
        tick(10, dec!(103)),
        tick(20, dec!(100)),
        tick(60, dec!(99)),
        tick(70, dec!(105)),
        tick(80, dec!(102)),
        tick(120, dec!(101)),
        tick(130, dec!(107)),
        tick(140, dec!(104)),
        tick(180, dec!(147)),
        tick(190, dec!(153)),
        tick(200, dec!(150)),
    ];
    for t in ticks_before_reversal {
        engine.on_index_tick(t).await.unwrap();
    }
    assert!(engine.snapshot().position.is_some(), "entry should have fired on candle2's close");

    // Request a manual squareoff, then deliver the single tick that both
    // closes candle3 (triggering the reversal) and would, if checked first,
    // have triggered the manual squareoff independently.
    engine.request_squareoff();
    engine.on_index_tick(tick(240, dec!(150))).await.unwrap();

    let snapshot = engine.snapshot();
    assert!(snapshot.position.is_none(), "the reversal should have closed the position");
    assert_eq!(snapshot.last_action.unwrap().reason.as_deref(), Some("Reversal"));
    assert_eq!(broker.sell_order_count(), 1, "exactly one SELL must have been placed");
}

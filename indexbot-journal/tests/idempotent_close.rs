use chrono::{TimeZone, Utc};
use indexbot_instrument::{Root, Side};
use indexbot_journal::{InMemoryTradeJournal, Mode, TradeClose, TradeJournal, TradeRecord};
use indexbot_risk::ExitReason;
use rust_decimal_macros::dec;

#[tokio::test]
async fn replaying_write_close_never_changes_the_realized_pnl() {
    let journal = InMemoryTradeJournal::new();
    let record = TradeRecord::opened(
        "trade-42".to_string(),
        Utc.timestamp_opt(0, 0).unwrap(),
        Side::Put,
        dec!(22100),
        chrono::NaiveDate::from_ymd_opt(2026, 8, 6).unwrap(),
        dec!(95),
        50,
        Mode::Paper,
        Root::Nifty,
    );
    journal.write_open(record).await.unwrap();

    let realized = TradeRecord::realized_pnl(dec!(95), dec!(101), 50);
    let close = TradeClose::new(Utc.timestamp_opt(300, 0).unwrap(), dec!(101), realized, ExitReason::Target);

    for _ in 0..3 {
        journal.write_close("trade-42", close.clone()).await.unwrap();
    }

    let row = journal.read("trade-42").await.unwrap().unwrap();
    assert_eq!(row.close.unwrap().realized_pnl, dec!(300));
}

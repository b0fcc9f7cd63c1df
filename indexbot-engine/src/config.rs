use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

/// Immutable-while-running configuration for one strategy instance
/// (spec.md §3). Hot-swappable only while stopped, or while a Position is
/// CLOSED, except for the risk-limit fields [`EngineConfig::apply_patch`]
/// allows to be tightened live.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub interval_seconds: i64,
    pub supertrend_period: usize,
    pub supertrend_multiplier: Decimal,
    pub use_macd: bool,
    pub macd_params: Option<MacdParams>,
    pub initial_stop_points: Decimal,
    pub max_loss_per_trade_rupees: Decimal,
    pub target_points: Decimal,
    pub trail_start_points: Decimal,
    pub trail_step_points: Decimal,
    pub daily_max_loss_rupees: Decimal,
    pub max_trades_per_day: u32,
    pub risk_per_trade_rupees: Decimal,
    pub configured_lots: u32,
    pub min_gap_candles_between_trades: u32,
    pub min_hold_before_reversal: Duration,
    pub session_open_ist: NaiveTime,
    pub entry_open_ist: NaiveTime,
    pub entry_close_ist: NaiveTime,
    pub force_flat_ist: NaiveTime,
    pub session_close_ist: NaiveTime,
    pub order_fill_timeout: Duration,
    pub order_poll_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 300,
            supertrend_period: 10,
            supertrend_multiplier: Decimal::from(3),
            use_macd: false,
            macd_params: None,
            initial_stop_points: Decimal::from(20),
            max_loss_per_trade_rupees: Decimal::ZERO,
            target_points: Decimal::ZERO,
            trail_start_points: Decimal::ZERO,
            trail_step_points: Decimal::ZERO,
            daily_max_loss_rupees: Decimal::from(5000),
            max_trades_per_day: 4,
            risk_per_trade_rupees: Decimal::ZERO,
            configured_lots: 1,
            min_gap_candles_between_trades: 1,
            min_hold_before_reversal: Duration::from_secs(0),
            session_open_ist: NaiveTime::from_hms_opt(9, 15, 0).unwrap(),
            entry_open_ist: NaiveTime::from_hms_opt(9, 25, 0).unwrap(),
            entry_close_ist: NaiveTime::from_hms_opt(15, 10, 0).unwrap(),
            force_flat_ist: NaiveTime::from_hms_opt(15, 25, 0).unwrap(),
            session_close_ist: NaiveTime::from_hms_opt(15, 30, 0).unwrap(),
            order_fill_timeout: Duration::from_secs(10),
            order_poll_interval: Duration::from_millis(500),
        }
    }
}

/// A sparse set of field updates for [`EngineConfig::apply_patch`]. Every
/// field left `None` is unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigPatch {
    pub daily_max_loss_rupees: Option<Decimal>,
    pub max_loss_per_trade_rupees: Option<Decimal>,
    pub initial_stop_points: Option<Decimal>,
    pub target_points: Option<Decimal>,
    pub trail_start_points: Option<Decimal>,
    pub trail_step_points: Option<Decimal>,
    pub interval_seconds: Option<i64>,
    pub supertrend_period: Option<usize>,
    pub supertrend_multiplier: Option<Decimal>,
    pub use_macd: Option<bool>,
    pub risk_per_trade_rupees: Option<Decimal>,
    pub configured_lots: Option<u32>,
    pub max_trades_per_day: Option<u32>,
    pub min_gap_candles_between_trades: Option<u32>,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("field '{field}' may only be loosened while no Position is open")]
    NotRuntimeSafe { field: &'static str },
    #[error("field '{field}' may only be tightened while a Position is open, got {old} -> {new}")]
    NotATightening {
        field: &'static str,
        old: Decimal,
        new: Decimal,
    },
}

impl EngineConfig {
    /// Risk-limit fields may be tightened (never loosened) while a Position
    /// is open; every other field requires the Position to be CLOSED
    /// (spec.md §6 updateConfig).
    pub fn apply_patch(&mut self, patch: ConfigPatch, position_is_closed: bool) -> Result<(), ConfigError> {
        macro_rules! tighten_only {
            ($field:ident, $name:literal) => {
                if let Some(new) = patch.$field {
                    if !position_is_closed && new > self.$field {
                        return Err(ConfigError::NotATightening {
                            field: $name,
                            old: self.$field,
                            new,
                        });
                    }
                    self.$field = new;
                }
            };
        }
        macro_rules! requires_closed {
            ($field:ident, $name:literal, $value:expr) => {
                if let Some(new) = $value {
                    if !position_is_closed {
                        return Err(ConfigError::NotRuntimeSafe { field: $name });
                    }
                    self.$field = new;
                }
            };
        }

        tighten_only!(daily_max_loss_rupees, "daily_max_loss_rupees");
        tighten_only!(max_loss_per_trade_rupees, "max_loss_per_trade_rupees");
        tighten_only!(initial_stop_points, "initial_stop_points");
        tighten_only!(target_points, "target_points");
        tighten_only!(trail_start_points, "trail_start_points");
        tighten_only!(trail_step_points, "trail_step_points");

        requires_closed!(interval_seconds, "interval_seconds", patch.interval_seconds);
        requires_closed!(supertrend_period, "supertrend_period", patch.supertrend_period);
        requires_closed!(supertrend_multiplier, "supertrend_multiplier", patch.supertrend_multiplier);
        requires_closed!(use_macd, "use_macd", patch.use_macd);
        requires_closed!(risk_per_trade_rupees, "risk_per_trade_rupees", patch.risk_per_trade_rupees);
        requires_closed!(configured_lots, "configured_lots", patch.configured_lots);
        requires_closed!(max_trades_per_day, "max_trades_per_day", patch.max_trades_per_day);
        requires_closed!(
            min_gap_candles_between_trades,
            "min_gap_candles_between_trades",
            patch.min_gap_candles_between_trades
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn tightening_a_risk_limit_is_allowed_while_position_open() {
        let mut config = EngineConfig::default();
        let patch = ConfigPatch {
            daily_max_loss_rupees: Some(dec!(3000)),
            ..Default::default()
        };
        config.apply_patch(patch, false).unwrap();
        assert_eq!(config.daily_max_loss_rupees, dec!(3000));
    }

    #[test]
    fn loosening_a_risk_limit_is_rejected_while_position_open() {
        let mut config = EngineConfig::default();
        let patch = ConfigPatch {
            daily_max_loss_rupees: Some(dec!(10_000)),
            ..Default::default()
        };
        let err = config.apply_patch(patch, false).unwrap_err();
        assert!(matches!(err, ConfigError::NotATightening { .. }));
    }

    #[test]
    fn sizing_fields_require_position_closed() {
        let mut config = EngineConfig::default();
        let patch = ConfigPatch {
            configured_lots: Some(2),
            ..Default::default()
        };
        assert!(config.apply_patch(patch.clone(), false).is_err());
        config.apply_patch(patch, true).unwrap();
        assert_eq!(config.configured_lots, 2);
    }
}

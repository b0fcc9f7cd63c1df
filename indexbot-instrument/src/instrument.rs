use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Underlying index an instance of the engine trades.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
pub enum Root {
    Nifty,
    BankNifty,
    FinNifty,
    Sensex,
}

impl Root {
    /// Contracts per lot. Fixed per root for the lifetime of a session.
    pub fn lot_size(&self) -> u32 {
        match self {
            Root::Nifty => 50,
            Root::BankNifty => 15,
            Root::FinNifty => 40,
            Root::Sensex => 10,
        }
    }

    /// Strike spacing used to round a spot price to the nearest ATM strike.
    pub fn strike_step(&self) -> Decimal {
        match self {
            Root::Nifty | Root::FinNifty => Decimal::from(50),
            Root::BankNifty | Root::Sensex => Decimal::from(100),
        }
    }
}

impl Display for Root {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Root::Nifty => "NIFTY",
            Root::BankNifty => "BANKNIFTY",
            Root::FinNifty => "FINNIFTY",
            Root::Sensex => "SENSEX",
        };
        write!(f, "{name}")
    }
}

/// Immutable-per-session reference data for the underlying index being traded.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct InstrumentRef {
    pub root: Root,
    pub lot_size: u32,
    pub strike_step: Decimal,
}

impl InstrumentRef {
    /// Construct an `InstrumentRef` with the canonical lot size and strike step
    /// for `root`. Use [`InstrumentRef::new`] directly only when a root's
    /// contract spec has been overridden by the exchange for the session.
    pub fn for_root(root: Root) -> Self {
        Self {
            lot_size: root.lot_size(),
            strike_step: root.strike_step(),
            root,
        }
    }

    /// Round `spot` to the nearest ATM strike for this instrument.
    pub fn atm_strike(&self, spot: Decimal) -> Decimal {
        round_to_step(spot, self.strike_step)
    }
}

/// Round `value` to the nearest multiple of `step` (half-up).
pub fn round_to_step(value: Decimal, step: Decimal) -> Decimal {
    if step.is_zero() {
        return value;
    }
    (value / step).round() * step
}

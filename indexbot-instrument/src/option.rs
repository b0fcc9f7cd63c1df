use crate::instrument::Root;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Option right - call or put.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    #[serde(alias = "CE")]
    Call,
    #[serde(alias = "PE")]
    Put,
}

impl Display for Side {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", match self {
            Side::Call => "CE",
            Side::Put => "PE",
        })
    }
}

/// A single resolved option contract. Immutable once the broker has resolved
/// and returned a `broker_security_id` for it.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct OptionRef {
    pub root: Root,
    pub expiry_date: NaiveDate,
    pub strike: Decimal,
    pub side: Side,
    pub broker_security_id: String,
}

impl Display for OptionRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.root, self.expiry_date, self.strike, self.side
        )
    }
}

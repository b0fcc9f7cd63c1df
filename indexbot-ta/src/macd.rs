use crate::average::ExponentialMovingAverage;
use crate::supertrend::Direction;
use rust_decimal::Decimal;

/// Confirmation sign used to gate entries when `useMacd` is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdConfirmation {
    Confirmed,
    NotConfirmed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdOutput {
    pub macd_line: Decimal,
    pub signal_line: Decimal,
}

impl MacdOutput {
    fn histogram(&self) -> Decimal {
        self.macd_line - self.signal_line
    }

    /// Confirms a SuperTrend candidate entry only when the histogram's
    /// sign matches the candidate direction (Up => positive, Down => negative).
    pub fn confirms(&self, candidate: Direction) -> MacdConfirmation {
        let histogram = self.histogram();
        let matches = match candidate {
            Direction::Up => histogram.is_sign_positive() && !histogram.is_zero(),
            Direction::Down => histogram.is_sign_negative(),
        };
        if matches {
            MacdConfirmation::Confirmed
        } else {
            MacdConfirmation::NotConfirmed
        }
    }
}

/// MACD(fast, slow, signal) on closing price, standard EMA construction.
#[derive(Debug, Clone)]
pub struct Macd {
    fast: ExponentialMovingAverage,
    slow: ExponentialMovingAverage,
    signal: ExponentialMovingAverage,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        assert!(fast < slow, "fast period must be shorter than slow period");
        Self {
            fast: ExponentialMovingAverage::new(fast),
            slow: ExponentialMovingAverage::new(slow),
            signal: ExponentialMovingAverage::new(signal),
        }
    }

    pub fn on_closed_candle(&mut self, close: Decimal) -> MacdOutput {
        let fast = self.fast.update(close);
        let slow = self.slow.update(close);
        let macd_line = fast - slow;
        let signal_line = self.signal.update(macd_line);
        MacdOutput {
            macd_line,
            signal_line,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn confirms_only_when_histogram_sign_matches_candidate() {
        let output = MacdOutput {
            macd_line: dec!(5),
            signal_line: dec!(2),
        };
        assert_eq!(output.confirms(Direction::Up), MacdConfirmation::Confirmed);
        assert_eq!(output.confirms(Direction::Down), MacdConfirmation::NotConfirmed);
    }

    #[test]
    fn rising_prices_drive_macd_line_positive() {
        let mut macd = Macd::new(3, 6, 3);
        let mut last = MacdOutput {
            macd_line: Decimal::ZERO,
            signal_line: Decimal::ZERO,
        };
        for price in [100, 101, 103, 106, 110, 115, 121] {
            last = macd.on_closed_candle(Decimal::from(price));
        }
        assert!(last.macd_line > Decimal::ZERO);
    }
}

use rust_decimal::Decimal;
use std::collections::VecDeque;

/// Simple moving average over the last `period` values.
#[derive(Debug, Clone)]
pub struct SimpleMovingAverage {
    period: usize,
    values: VecDeque<Decimal>,
    sum: Decimal,
}

impl SimpleMovingAverage {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "period must be positive");
        Self {
            period,
            values: VecDeque::with_capacity(period),
            sum: Decimal::ZERO,
        }
    }

    pub fn update(&mut self, value: Decimal) -> Decimal {
        self.values.push_back(value);
        self.sum += value;
        if self.values.len() > self.period {
            if let Some(old) = self.values.pop_front() {
                self.sum -= old;
            }
        }
        self.average()
    }

    pub fn average(&self) -> Decimal {
        if self.values.is_empty() {
            Decimal::ZERO
        } else {
            self.sum / Decimal::from(self.values.len() as u64)
        }
    }

    pub fn is_warmed_up(&self) -> bool {
        self.values.len() >= self.period
    }
}

/// Exponential moving average, seeded by the first observed value.
#[derive(Debug, Clone)]
pub struct ExponentialMovingAverage {
    multiplier: Decimal,
    value: Option<Decimal>,
}

impl ExponentialMovingAverage {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "period must be positive");
        let multiplier = Decimal::from(2u64) / Decimal::from(period as u64 + 1);
        Self {
            multiplier,
            value: None,
        }
    }

    pub fn update(&mut self, price: Decimal) -> Decimal {
        let next = match self.value {
            Some(prev) => (price - prev) * self.multiplier + prev,
            None => price,
        };
        self.value = Some(next);
        next
    }

    pub fn value(&self) -> Option<Decimal> {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn sma_drops_oldest_once_period_is_full() {
        let mut sma = SimpleMovingAverage::new(3);
        sma.update(dec!(10));
        sma.update(dec!(20));
        assert!(!sma.is_warmed_up());
        assert_eq!(sma.update(dec!(30)), dec!(20));
        assert!(sma.is_warmed_up());
        assert_eq!(sma.update(dec!(60)), dec!(110) / dec!(3));
    }

    #[test]
    fn ema_seeds_from_first_value() {
        let mut ema = ExponentialMovingAverage::new(2);
        assert_eq!(ema.update(dec!(10)), dec!(10));
        let second = ema.update(dec!(20));
        assert!(second > dec!(10) && second < dec!(20));
    }
}

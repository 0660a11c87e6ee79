//! Synthetic daily price series
//!
//! Produces a 31-point series (30 days ago through today) around a fixed
//! base price with uniform noise and a linear upward drift.

use chrono::{Days, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Price every series is centred on before drift
pub const BASE_PRICE: f64 = 250.0;
/// Days of history before today
pub const LOOKBACK_DAYS: u32 = 30;
/// Noise is drawn from `[-NOISE, NOISE)`
pub const NOISE: f64 = 10.0;
/// Drift added per day closer to today
pub const DRIFT_PER_DAY: f64 = 2.0;

#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("series needs at least two points, got {0}")]
    TooShort(usize),
    #[error("non-finite value {value} at {time}")]
    NonFinite { time: NaiveDate, value: f64 },
    #[error("previous close is zero, change percent is undefined")]
    ZeroPreviousValue,
    #[error("date {0} is too early for the lookback window")]
    DateOutOfRange(NaiveDate),
}

/// One daily close
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Calendar date, serialized as `YYYY-MM-DD`
    pub time: NaiveDate,
    pub value: f64,
}

/// Chart payload: points oldest first plus the headline numbers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    pub ticker: String,
    pub data: Vec<PricePoint>,
    pub current_price: f64,
    pub change: f64,
    pub change_percent: f64,
}

impl ChartSeries {
    /// Build a series and derive price, change and change percent from the
    /// last two points
    pub fn from_points(ticker: impl Into<String>, data: Vec<PricePoint>) -> Result<Self, SeriesError> {
        if let Some(bad) = data.iter().find(|p| !p.value.is_finite()) {
            return Err(SeriesError::NonFinite {
                time: bad.time,
                value: bad.value,
            });
        }

        let [.., previous, last] = data.as_slice() else {
            return Err(SeriesError::TooShort(data.len()));
        };

        if previous.value == 0.0 {
            return Err(SeriesError::ZeroPreviousValue);
        }

        let current_price = last.value;
        let change = current_price - previous.value;
        let change_percent = change / previous.value * 100.0;

        Ok(Self {
            ticker: ticker.into(),
            data,
            current_price,
            change,
            change_percent,
        })
    }

    pub fn is_positive(&self) -> bool {
        self.change >= 0.0
    }

    /// `$123.45`
    pub fn price_label(&self) -> String {
        format!("${:.2}", self.current_price)
    }

    /// `+1.23 (+0.50%)` or `-1.23 (-0.50%)`
    pub fn change_label(&self) -> String {
        let sign = if self.is_positive() { "+" } else { "" };
        format!(
            "{sign}{:.2} ({sign}{:.2}%)",
            self.change, self.change_percent
        )
    }
}

/// Seedable generator for synthetic series
pub struct SeriesGenerator<R: Rng = StdRng> {
    rng: R,
    base_price: f64,
}

impl SeriesGenerator<StdRng> {
    /// Generator drawing fresh randomness from the OS
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Reproducible generator
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> SeriesGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            base_price: BASE_PRICE,
        }
    }

    pub fn with_base_price(mut self, base_price: f64) -> Self {
        self.base_price = base_price;
        self
    }

    /// Generate the 31 daily points ending at `today`
    pub fn points(&mut self, today: NaiveDate) -> Result<Vec<PricePoint>, SeriesError> {
        (0..=LOOKBACK_DAYS)
            .rev()
            .map(|days_ago| {
                let time = today
                    .checked_sub_days(Days::new(u64::from(days_ago)))
                    .ok_or(SeriesError::DateOutOfRange(today))?;
                let noise = self.rng.gen_range(-NOISE..NOISE);
                let drift = DRIFT_PER_DAY * f64::from(LOOKBACK_DAYS - days_ago);
                Ok(PricePoint {
                    time,
                    value: round2(self.base_price + noise + drift),
                })
            })
            .collect()
    }

    /// Generate a full chart payload for `ticker`
    pub fn generate(&mut self, ticker: &str, today: NaiveDate) -> Result<ChartSeries, SeriesError> {
        let points = self.points(today)?;
        ChartSeries::from_points(ticker, points)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

//! Exchange-rate map validation.
//!
//! Rates are quoted as units of currency per one unit of [`BASE_CURRENCY`].

use std::collections::BTreeMap;
use std::fmt::Display;

pub const BASE_CURRENCY: &str = "USD";

/// Fewest entries (base included) for the map to be usable at all.
pub const MIN_RATE_COUNT: usize = 10;

/// Inclusive plausible range per currency, in units per USD.
pub const RATE_BOUNDS: &[(&str, f64, f64)] = &[
    ("EUR", 0.50, 1.50),
    ("GBP", 0.40, 1.30),
    ("JPY", 70.0, 250.0),
    ("CAD", 0.90, 2.00),
    ("AUD", 0.90, 2.20),
    ("CNY", 4.0, 10.0),
    ("CHF", 0.50, 1.50),
    ("HKD", 5.0, 10.0),
    ("SGD", 0.80, 2.00),
    ("SEK", 5.0, 16.0),
    ("KRW", 700.0, 2000.0),
    ("NOK", 5.0, 16.0),
    ("NZD", 0.90, 2.50),
    ("INR", 50.0, 130.0),
    ("MXN", 10.0, 30.0),
    ("TWD", 20.0, 45.0),
    ("ZAR", 10.0, 30.0),
    ("BRL", 3.0, 8.0),
    ("DKK", 4.0, 10.0),
    ("PLN", 2.5, 6.0),
    ("THB", 20.0, 50.0),
    ("IDR", 10000.0, 22000.0),
    ("HUF", 200.0, 550.0),
    ("CZK", 15.0, 35.0),
    ("ILS", 2.5, 5.5),
    ("CLP", 500.0, 1400.0),
    ("PHP", 35.0, 75.0),
    ("AED", 3.0, 4.5),
    ("COP", 2500.0, 6000.0),
    ("SAR", 3.0, 4.5),
    ("MYR", 3.0, 7.0),
    ("RON", 3.0, 7.0),
    ("MAD", 7.0, 14.0),
];

/// Currencies whose absence is worth a warning.
pub const MAJOR_CURRENCIES: &[&str] = &["EUR", "GBP", "JPY", "CNY", "CHF", "CAD", "MAD"];

pub fn rate_bounds(code: &str) -> Option<(f64, f64)> {
    RATE_BOUNDS
        .iter()
        .find(|(bounded, _, _)| *bounded == code)
        .map(|(_, low, high)| (*low, *high))
}

/// Whole-map failures. Individual out-of-bounds entries are not rejections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateRejection {
    InvalidAnchor,
    InsufficientCurrencies(usize),
}

impl Display for RateRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RateRejection::InvalidAnchor => write!(f, "invalid anchor"),
            RateRejection::InsufficientCurrencies(count) => {
                write!(f, "insufficient currencies ({count})")
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateAudit {
    /// Cleaned map; empty whenever `rejection` is set.
    pub rates: BTreeMap<String, f64>,
    pub rejection: Option<RateRejection>,
    pub out_of_bounds: Vec<String>,
    pub missing_majors: Vec<String>,
}

impl RateAudit {
    fn rejected(rejection: RateRejection) -> Self {
        Self {
            rejection: Some(rejection),
            ..Self::default()
        }
    }

    pub fn is_rejected(&self) -> bool {
        self.rejection.is_some()
    }
}

pub fn audit_rates(raw: BTreeMap<String, f64>) -> RateAudit {
    if raw.get(BASE_CURRENCY) != Some(&1.0) {
        return RateAudit::rejected(RateRejection::InvalidAnchor);
    }
    if raw.len() < MIN_RATE_COUNT {
        return RateAudit::rejected(RateRejection::InsufficientCurrencies(raw.len()));
    }

    let mut out_of_bounds = Vec::new();
    let rates: BTreeMap<String, f64> = raw
        .into_iter()
        .filter(|(code, rate)| match rate_bounds(code) {
            Some((low, high)) if !(low..=high).contains(rate) => {
                out_of_bounds.push(code.clone());
                false
            }
            _ => true,
        })
        .collect();

    let missing_majors = MAJOR_CURRENCIES
        .iter()
        .filter(|code| !rates.contains_key(**code))
        .map(|code| code.to_string())
        .collect();

    RateAudit {
        rates,
        rejection: None,
        out_of_bounds,
        missing_majors,
    }
}

//! Offline sources used when neither the network nor the cache has usable data.

use crate::core::market::{MarketItem, MarketSnapshot};
use anyhow::{Context, Result};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::PathBuf;

const EMBEDDED_SNAPSHOT: &[u8] = include_bytes!("../../assets/market_data.json");

/// Publication time stamped on the synthetic snapshot.
pub const SYNTHETIC_LAST_UPDATE: &str = "2026-02-01T00:00:00+00:00";

/// Where the read-only snapshot shipped with the application lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundledSnapshot {
    Embedded,
    File(PathBuf),
}

impl BundledSnapshot {
    pub fn from_config(path: Option<&str>) -> Self {
        path.map_or(BundledSnapshot::Embedded, |p| {
            BundledSnapshot::File(PathBuf::from(p))
        })
    }

    pub fn read(&self) -> Result<Cow<'static, [u8]>> {
        match self {
            BundledSnapshot::Embedded => Ok(Cow::Borrowed(EMBEDDED_SNAPSHOT)),
            BundledSnapshot::File(path) => std::fs::read(path)
                .map(Cow::Owned)
                .with_context(|| format!("Failed to read bundled snapshot: {}", path.display())),
        }
    }

    pub fn load(&self) -> Result<MarketSnapshot> {
        let raw = self.read()?;
        MarketSnapshot::from_slice(&raw).context("Failed to decode bundled snapshot")
    }
}

fn quote(ticker: &str, name: &str, price: f64, currency: Option<&str>, unit: Option<&str>) -> MarketItem {
    MarketItem {
        ticker: ticker.to_string(),
        price,
        trend: 0.0,
        name: name.to_string(),
        currency: currency.map(str::to_string),
        unit: unit.map(str::to_string),
    }
}

/// Reference values the process can always construct, even fully offline.
pub fn synthetic_snapshot() -> MarketSnapshot {
    let rates: BTreeMap<String, f64> = [
        ("USD", 1.0),
        ("EUR", 0.92),
        ("GBP", 0.79),
        ("JPY", 150.0),
        ("CAD", 1.36),
        ("AUD", 1.53),
        ("CNY", 7.2),
        ("CHF", 0.88),
        ("HKD", 7.8),
        ("SGD", 1.34),
        ("INR", 83.0),
        ("MAD", 10.0),
    ]
    .into_iter()
    .map(|(code, rate)| (code.to_string(), rate))
    .collect();

    MarketSnapshot {
        last_update: SYNTHETIC_LAST_UPDATE.to_string(),
        currencies: vec![
            quote("EURUSD=X", "EUR / USD", 1.08, None, None),
            quote("USDJPY=X", "USD / JPY", 150.0, None, None),
            quote("USDMAD=X", "USD / MAD", 10.0, None, None),
        ],
        energy: vec![
            quote("BZ=F", "Brent Crude", 80.0, Some("USD"), Some("USD/bbl")),
            quote("NG=F", "Natural Gas", 2.5, Some("USD"), Some("USD/MMBtu")),
        ],
        metals: vec![
            quote("GC=F", "Gold", 2000.0, Some("USD"), Some("USD/oz")),
            quote("HG=F", "Copper", 4.0, Some("USD"), Some("USD/lb")),
            quote("ALI=F", "Aluminium", 2300.0, Some("USD"), Some("USD/t")),
        ],
        indices: vec![quote("^GSPC", "S&P 500", 5000.0, None, Some("pts"))],
        agriculture: vec![quote("SB=F", "Sugar #11", 20.0, None, Some("¢/lb"))],
        rates,
        total_items: Some(10),
        exchanger_audit: None,
    }
}

//! Market snapshot data model

use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt::Display;

/// The five item lists carried by every snapshot, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Category {
    Currencies,
    Energy,
    Metals,
    Indices,
    Agriculture,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Currencies,
        Category::Energy,
        Category::Metals,
        Category::Indices,
        Category::Agriculture,
    ];
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Category::Currencies => "currencies",
                Category::Energy => "energy",
                Category::Metals => "metals",
                Category::Indices => "indices",
                Category::Agriculture => "agriculture",
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketItem {
    pub ticker: String,
    #[serde(deserialize_with = "nan_if_null")]
    pub price: f64,
    /// Day-over-day change in percent.
    #[serde(deserialize_with = "nan_if_null")]
    pub trend: f64,
    pub name: String,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
}

/// Missing values become NaN so the item audit drops them individually.
fn nan_if_null<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

const NON_FINITE_TOKENS: [&[u8]; 3] = [b"-Infinity", b"Infinity", b"NaN"];

/// Rewrites the bare `NaN`/`Infinity`/`-Infinity` literals some JSON encoders
/// emit into `null`. String contents are left untouched.
fn replace_non_finite(raw: &[u8]) -> Cow<'_, [u8]> {
    let mut rewritten: Option<Vec<u8>> = None;
    let mut in_string = false;
    let mut escaped = false;
    let mut i = 0;

    while i < raw.len() {
        let byte = raw[i];
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
        } else if byte == b'"' {
            in_string = true;
        } else if let Some(token) = NON_FINITE_TOKENS
            .iter()
            .find(|token| raw[i..].starts_with(token))
        {
            let out = rewritten.get_or_insert_with(|| raw[..i].to_vec());
            out.extend_from_slice(b"null");
            i += token.len();
            continue;
        }

        if let Some(out) = rewritten.as_mut() {
            out.push(byte);
        }
        i += 1;
    }

    rewritten.map_or(Cow::Borrowed(raw), Cow::Owned)
}

/// A rate the publisher itself dropped for being outside its bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedRate {
    pub code: String,
    pub rate: f64,
    #[serde(default)]
    pub bounds: Vec<f64>,
}

/// Publisher-side diagnostics attached to a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExchangerAudit {
    #[serde(default)]
    pub fetch_failed: Vec<String>,
    #[serde(default)]
    pub bounds_rejected: Vec<RejectedRate>,
}

/// One complete market data document. Every collection is optional on the
/// wire so that older and newer publisher schemas still decode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub last_update: String,
    #[serde(default)]
    pub currencies: Vec<MarketItem>,
    #[serde(default)]
    pub energy: Vec<MarketItem>,
    #[serde(default)]
    pub metals: Vec<MarketItem>,
    #[serde(default)]
    pub indices: Vec<MarketItem>,
    #[serde(default)]
    pub agriculture: Vec<MarketItem>,
    #[serde(default)]
    pub rates: BTreeMap<String, f64>,
    #[serde(default, rename = "totalItems", skip_serializing_if = "Option::is_none")]
    pub total_items: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchanger_audit: Option<ExchangerAudit>,
}

impl MarketSnapshot {
    pub fn from_slice(raw: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(&replace_non_finite(raw))
    }

    pub fn items(&self, category: Category) -> &[MarketItem] {
        match category {
            Category::Currencies => &self.currencies,
            Category::Energy => &self.energy,
            Category::Metals => &self.metals,
            Category::Indices => &self.indices,
            Category::Agriculture => &self.agriculture,
        }
    }

    pub fn items_mut(&mut self, category: Category) -> &mut Vec<MarketItem> {
        match category {
            Category::Currencies => &mut self.currencies,
            Category::Energy => &mut self.energy,
            Category::Metals => &mut self.metals,
            Category::Indices => &mut self.indices,
            Category::Agriculture => &mut self.agriculture,
        }
    }

    pub fn populated_categories(&self) -> usize {
        Category::ALL
            .iter()
            .filter(|category| !self.items(**category).is_empty())
            .count()
    }

    pub fn item_count(&self) -> usize {
        Category::ALL
            .iter()
            .map(|category| self.items(*category).len())
            .sum()
    }
}

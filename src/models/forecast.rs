use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::NaiveDate;
use garde::Validate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Defaults applied during normalization when a parameter is missing.
pub const DEFAULT_DAYS: u32 = 7;
pub const DEFAULT_MIN_RATING: f64 = 4.0;
pub const DEFAULT_MAX_PRICE: f64 = 500.0;
pub const DEFAULT_MIN_DISCOUNT: f64 = 5.0;

/// Product category segment understood by the forecast model.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, Display,
)]
pub enum Category {
    #[default]
    A,
    B,
    C,
}

/// Geographic sales region covered by the forecast model.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, Display,
)]
pub enum Region {
    #[default]
    North,
    South,
    East,
    West,
}

/// A required parameter was missing or unusable. Raised before any
/// network traffic and never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

/// Raw forecast parameters as supplied by a caller (form-shaped, every
/// field optional). Run [`ForecastParams::normalize`] to obtain a request
/// that is guaranteed in-range.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForecastParams {
    pub product_id: Option<String>,
    pub days: Option<f64>,
    pub category: Option<String>,
    pub region: Option<String>,
    pub min_rating: Option<f64>,
    pub max_price: Option<f64>,
    pub min_discount: Option<f64>,
}

impl ForecastParams {
    /// Parameters for a product with every other field left to defaults.
    pub fn for_product(product_id: impl Into<String>) -> Self {
        Self {
            product_id: Some(product_id.into()),
            ..Self::default()
        }
    }

    /// Normalize into a [`ForecastRequest`].
    ///
    /// `product_id` is required (trimmed, non-empty); everything else is
    /// clamped into range or replaced by its default. Out-of-range values
    /// clamp rather than fall back, so `days = 0` becomes 1, not 7.
    pub fn normalize(&self) -> Result<ForecastRequest, ValidationError> {
        let product_id = self.product_id.as_deref().map(str::trim).unwrap_or("");
        if product_id.is_empty() {
            return Err(ValidationError("Product ID is required".to_string()));
        }

        Ok(ForecastRequest {
            product_id: product_id.to_string(),
            days: normalize_days(self.days),
            category: parse_or_default(self.category.as_deref()),
            region: parse_or_default(self.region.as_deref()),
            min_rating: clamp_or(self.min_rating, DEFAULT_MIN_RATING, 1.0, 5.0),
            max_price: match self.max_price {
                Some(price) if price.is_finite() => price.max(0.0),
                _ => DEFAULT_MAX_PRICE,
            },
            min_discount: clamp_or(self.min_discount, DEFAULT_MIN_DISCOUNT, 0.0, 50.0),
        })
    }
}

fn normalize_days(days: Option<f64>) -> u32 {
    match days {
        Some(d) if d.is_finite() => d.round().clamp(1.0, 30.0) as u32,
        _ => DEFAULT_DAYS,
    }
}

fn clamp_or(value: Option<f64>, default: f64, min: f64, max: f64) -> f64 {
    match value {
        Some(v) if v.is_finite() => v.clamp(min, max),
        _ => default,
    }
}

fn parse_or_default<T: FromStr + Default>(value: Option<&str>) -> T {
    value.and_then(|s| T::from_str(s).ok()).unwrap_or_default()
}

/// Normalized forecast request sent as the POST body. Every field is
/// present and within the ranges the garde rules state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ForecastRequest {
    #[garde(length(min = 1))]
    pub product_id: String,

    #[garde(range(min = 1, max = 30))]
    pub days: u32,

    #[garde(skip)]
    pub category: Category,

    #[garde(skip)]
    pub region: Region,

    #[garde(range(min = 1.0, max = 5.0))]
    pub min_rating: f64,

    #[garde(range(min = 0.0))]
    pub max_price: f64,

    #[garde(range(min = 0.0, max = 50.0))]
    pub min_discount: f64,
}

impl From<&ForecastRequest> for ForecastParams {
    fn from(request: &ForecastRequest) -> Self {
        Self {
            product_id: Some(request.product_id.clone()),
            days: Some(f64::from(request.days)),
            category: Some(request.category.to_string()),
            region: Some(request.region.to_string()),
            min_rating: Some(request.min_rating),
            max_price: Some(request.max_price),
            min_discount: Some(request.min_discount),
        }
    }
}

/// One forecasted day of demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub demand: f64,
}

/// Forecast result as returned by the model service.
///
/// The upstream schema is loose; the stock-control KPIs are optional and
/// any field this struct does not name is preserved in `extra` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResponse {
    #[serde(rename = "Reorder Point", default, skip_serializing_if = "Option::is_none")]
    pub reorder_point: Option<f64>,

    #[serde(rename = "Safety Stock", default, skip_serializing_if = "Option::is_none")]
    pub safety_stock: Option<f64>,

    #[serde(rename = "Minimum Level", default, skip_serializing_if = "Option::is_none")]
    pub minimum_level: Option<f64>,

    #[serde(rename = "Maximum Level", default, skip_serializing_if = "Option::is_none")]
    pub maximum_level: Option<f64>,

    #[serde(rename = "Forecast", default, skip_serializing_if = "Vec::is_empty")]
    pub forecast: Vec<ForecastPoint>,

    #[serde(rename = "Warnings", default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

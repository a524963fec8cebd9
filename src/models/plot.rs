use std::collections::BTreeMap;

use base64::Engine;
use serde::{Deserialize, Serialize};

const DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Plot result as returned by the model service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotResponse {
    pub plot_data: PlotData,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Base64-encoded PNG payload, optionally already carrying a data-URL scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotData {
    pub image: String,
}

#[derive(Debug, thiserror::Error)]
pub enum PlotImageError {
    #[error("plot payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("plot payload is not a PNG image")]
    NotPng,
}

impl PlotResponse {
    /// Decode the payload into raw PNG bytes.
    ///
    /// Strips the data-URL scheme when present, then verifies the decoded
    /// bytes actually are a PNG before handing them out.
    pub fn png_bytes(&self) -> Result<Vec<u8>, PlotImageError> {
        let encoded = match self.plot_data.image.split_once(',') {
            Some((_, payload)) => payload,
            None => self.plot_data.image.as_str(),
        };

        let bytes = base64::engine::general_purpose::STANDARD.decode(encoded)?;

        match image::guess_format(&bytes) {
            Ok(image::ImageFormat::Png) => Ok(bytes),
            _ => Err(PlotImageError::NotPng),
        }
    }

    /// The payload as a browser-renderable data URL.
    pub fn data_url(&self) -> String {
        let image = &self.plot_data.image;
        if image.starts_with("data:") {
            image.clone()
        } else {
            format!("{DATA_URL_PREFIX}{image}")
        }
    }
}

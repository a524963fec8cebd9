use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the forecast API.
    #[serde(default = "default_base_url")]
    pub api_base_url: String,

    /// Whole-request timeout applied to forecast and plot calls, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub api_timeout_ms: u64,

    /// Shorter per-request timeout used only by the health probe, in milliseconds.
    #[serde(default = "default_health_timeout_ms")]
    pub health_timeout_ms: u64,

    /// Retry budget for forecast generation.
    #[serde(default = "default_forecast_retries")]
    pub forecast_retries: u32,

    /// Retry budget for plot retrieval (plot generation is more expensive upstream).
    #[serde(default = "default_plot_retries")]
    pub plot_retries: u32,

    /// Initial backoff delay between retry attempts, in milliseconds.
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

fn default_base_url() -> String {
    "https://model-ai-inventory.onrender.com".to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_health_timeout_ms() -> u64 {
    5_000
}

fn default_forecast_retries() -> u32 {
    2
}

fn default_plot_retries() -> u32 {
    1
}

fn default_retry_base_delay_ms() -> u64 {
    1_000
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_base_url(),
            api_timeout_ms: default_timeout_ms(),
            health_timeout_ms: default_health_timeout_ms(),
            forecast_retries: default_forecast_retries(),
            plot_retries: default_plot_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_upstream_service() {
        let config = ApiConfig::default();
        assert_eq!(config.api_base_url, "https://model-ai-inventory.onrender.com");
        assert_eq!(config.api_timeout_ms, 30_000);
        assert_eq!(config.health_timeout_ms, 5_000);
        assert_eq!(config.forecast_retries, 2);
        assert_eq!(config.plot_retries, 1);
        assert_eq!(config.retry_base_delay_ms, 1_000);
    }
}

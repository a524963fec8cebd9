//! Resilient client for the inventory demand-forecast model service.
//!
//! Wraps the service's three routes (forecast generation, plot retrieval,
//! health) behind typed calls with uniform error classification and
//! exponential-backoff retry for transient failures.

use std::time::Duration;

use chrono::Utc;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use uuid::Uuid;

use super::retry::{with_backoff, RetryConfig, TransientPolicy};
use crate::config::ApiConfig;
use crate::models::forecast::{ForecastParams, ForecastRequest, ForecastResponse, ValidationError};
use crate::models::plot::PlotResponse;

/// User-facing messages, in classification priority order.
const MSG_NETWORK: &str =
    "Unable to connect to the server. Please check your internet connection.";
const MSG_SERVER: &str = "Server is temporarily unavailable. Please try again later.";
const MSG_TIMEOUT: &str = "Request timed out. The server may be busy, please try again.";
const MSG_GENERIC: &str = "An unexpected error occurred. Please try again.";

/// Classified failure of a forecast API call.
#[derive(Debug, thiserror::Error)]
pub enum ForecastApiError {
    /// Required input missing. Raised before any network traffic.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No response reached the server.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a 5xx status.
    #[error("server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    /// The server rejected the request with a 4xx status.
    #[error("client error (HTTP {status}): {message}")]
    Client { status: u16, message: String },

    /// The transport gave up waiting for a response.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The round-trip succeeded but the body was empty or unusable.
    #[error("Invalid response format")]
    InvalidResponse,
}

impl ForecastApiError {
    pub fn is_network_error(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Server { .. })
    }

    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Client { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Whether another attempt is likely to succeed. Server errors,
    /// timeouts, and network failures retry; everything else is permanent.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Server { .. } | Self::Timeout(_)
        )
    }

    /// Message suitable for direct display to a user.
    ///
    /// Priority: network, then server, then timeout, then whatever message
    /// the failure itself carries, then a generic fallback.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => MSG_NETWORK.to_string(),
            Self::Server { .. } => MSG_SERVER.to_string(),
            Self::Timeout(_) => MSG_TIMEOUT.to_string(),
            Self::Client { message, .. } => {
                if message.is_empty() {
                    MSG_GENERIC.to_string()
                } else {
                    message.clone()
                }
            }
            Self::Validation(error) => error.to_string(),
            Self::InvalidResponse => self.to_string(),
        }
    }

    /// Classify a transport-level failure (no usable response received).
    fn from_transport(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error.to_string())
        } else {
            Self::Network(error.to_string())
        }
    }
}

/// Error payload some upstream failures carry in the body.
#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Client for the inventory forecast model service.
///
/// Explicitly constructed from [`ApiConfig`] and handed to callers; it
/// carries no process-global state, so tests can point an instance at a
/// mock server.
pub struct ForecastClient {
    http: Client,
    base_url: String,
    health_timeout: Duration,
    forecast_retry: RetryConfig,
    plot_retry: RetryConfig,
}

impl ForecastClient {
    pub fn new(config: &ApiConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .user_agent(concat!(
                "inventory-forecast-client/",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(Duration::from_millis(config.api_timeout_ms))
            .build()?;

        let base_delay = Duration::from_millis(config.retry_base_delay_ms);

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            health_timeout: Duration::from_millis(config.health_timeout_ms),
            forecast_retry: RetryConfig::new(config.forecast_retries, base_delay),
            plot_retry: RetryConfig::new(config.plot_retries, base_delay),
        })
    }

    /// Request a demand forecast, retrying transient failures with the
    /// configured budget.
    pub async fn get_forecast(
        &self,
        params: &ForecastParams,
    ) -> Result<ForecastResponse, ForecastApiError> {
        self.get_forecast_with_retries(params, self.forecast_retry.max_retries)
            .await
    }

    /// [`Self::get_forecast`] with an explicit retry budget for callers
    /// that manage their own.
    pub async fn get_forecast_with_retries(
        &self,
        params: &ForecastParams,
        max_retries: u32,
    ) -> Result<ForecastResponse, ForecastApiError> {
        let request = params.normalize()?;
        let request_id = Uuid::new_v4();

        tracing::debug!(
            request_id = %request_id,
            product_id = %request.product_id,
            days = request.days,
            category = %request.category,
            region = %request.region,
            "requesting demand forecast"
        );

        let config = RetryConfig::new(max_retries, self.forecast_retry.base_delay);
        with_backoff(&config, TransientPolicy, || {
            self.post_forecast(&request, request_id)
        })
        .await
    }

    async fn post_forecast(
        &self,
        request: &ForecastRequest,
        request_id: Uuid,
    ) -> Result<ForecastResponse, ForecastApiError> {
        let response = self
            .http
            .post(format!("{}/forecast", self.base_url))
            .query(&[("_t", Utc::now().timestamp_millis())])
            .json(request)
            .send()
            .await
            .map_err(ForecastApiError::from_transport)?;

        let response = Self::check_status(response, request_id).await?;
        Self::read_json(response).await
    }

    /// Retrieve the rendered forecast plot. Plot generation is the most
    /// expensive upstream call, so the default budget retries only once.
    pub async fn get_plot(&self) -> Result<PlotResponse, ForecastApiError> {
        self.get_plot_with_retries(self.plot_retry.max_retries).await
    }

    pub async fn get_plot_with_retries(
        &self,
        max_retries: u32,
    ) -> Result<PlotResponse, ForecastApiError> {
        let request_id = Uuid::new_v4();
        tracing::debug!(request_id = %request_id, "requesting forecast plot");

        let config = RetryConfig::new(max_retries, self.plot_retry.base_delay);
        with_backoff(&config, TransientPolicy, || self.fetch_plot(request_id)).await
    }

    async fn fetch_plot(&self, request_id: Uuid) -> Result<PlotResponse, ForecastApiError> {
        let response = self
            .http
            .get(format!("{}/plot", self.base_url))
            .query(&[("_t", Utc::now().timestamp_millis())])
            .send()
            .await
            .map_err(ForecastApiError::from_transport)?;

        let response = Self::check_status(response, request_id).await?;
        Self::read_json(response).await
    }

    /// Probe the service's health route. Liveness only: any failure,
    /// including the short probe timeout, reports `false` instead of
    /// erroring.
    pub async fn health_check(&self) -> bool {
        let probe = self
            .http
            .get(format!("{}/health", self.base_url))
            .timeout(self.health_timeout)
            .send()
            .await;

        match probe {
            Ok(response) if response.status() == StatusCode::OK => true,
            Ok(response) => {
                tracing::warn!(status = response.status().as_u16(), "health check failed");
                false
            }
            Err(error) => {
                tracing::warn!(error = %error, "health check failed");
                false
            }
        }
    }

    /// Map a non-success status onto the error taxonomy, pulling the
    /// upstream `message` field out of the body when it carries one.
    async fn check_status(
        response: Response,
        request_id: Uuid,
    ) -> Result<Response, ForecastApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = read_error_message(response, status).await;
        tracing::warn!(
            request_id = %request_id,
            status = status.as_u16(),
            upstream_message = %message,
            "forecast API returned an error status"
        );

        if status.is_server_error() {
            Err(ForecastApiError::Server {
                status: status.as_u16(),
                message,
            })
        } else if status.is_client_error() {
            Err(ForecastApiError::Client {
                status: status.as_u16(),
                message,
            })
        } else {
            // Redirects are followed by the transport; any other status is
            // outside the classification ranges and its body is unusable.
            Err(ForecastApiError::InvalidResponse)
        }
    }

    /// Parse a successful response, requiring a non-empty JSON structure.
    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ForecastApiError> {
        let body: serde_json::Value = response.json().await.map_err(|error| {
            if error.is_decode() {
                ForecastApiError::InvalidResponse
            } else {
                ForecastApiError::from_transport(error)
            }
        })?;

        if body.is_null() || body.as_object().is_some_and(|map| map.is_empty()) {
            return Err(ForecastApiError::InvalidResponse);
        }

        serde_json::from_value(body).map_err(|_| ForecastApiError::InvalidResponse)
    }
}

async fn read_error_message(response: Response, status: StatusCode) -> String {
    match response.json::<ErrorBody>().await {
        Ok(ErrorBody {
            message: Some(message),
        }) if !message.is_empty() => message,
        _ => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
    }
}

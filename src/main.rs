use tracing_subscriber::EnvFilter;

use inventory_forecast_client::config::ApiConfig;
use inventory_forecast_client::models::forecast::ForecastParams;
use inventory_forecast_client::services::analysis::{self, MOVING_AVERAGE_WINDOW};
use inventory_forecast_client::services::forecast::ForecastClient;

const DEFAULT_PRODUCT_ID: &str = "P017";
const PLOT_OUTPUT_PATH: &str = "forecast_plot.png";

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = ApiConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!(base_url = %config.api_base_url, "Initializing forecast client");
    let client = ForecastClient::new(&config).expect("Failed to initialize forecast client");

    if !client.health_check().await {
        tracing::warn!("Forecast API health check failed, requests may not succeed");
    }

    let product_id = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_PRODUCT_ID.to_string());

    let params = ForecastParams::for_product(product_id.clone());

    match client.get_forecast(&params).await {
        Ok(response) => {
            tracing::info!(
                product_id = %product_id,
                reorder_point = response.reorder_point,
                safety_stock = response.safety_stock,
                minimum_level = response.minimum_level,
                maximum_level = response.maximum_level,
                forecast_days = response.forecast.len(),
                "Forecast received"
            );

            for warning in &response.warnings {
                tracing::warn!(product_id = %product_id, warning = %warning, "Forecast warning");
            }

            for point in analysis::with_moving_average(&response.forecast, MOVING_AVERAGE_WINDOW) {
                tracing::info!(
                    date = %point.date,
                    demand = point.demand,
                    moving_avg = point.moving_avg,
                    "Forecast point"
                );
            }

            for bin in analysis::demand_histogram(&response.forecast) {
                tracing::info!(range = %bin.range, count = bin.count, "Demand distribution");
            }
        }
        Err(error) => {
            tracing::error!(
                product_id = %product_id,
                error = %error,
                user_message = %error.user_message(),
                "Forecast request failed"
            );
            std::process::exit(1);
        }
    }

    match client.get_plot().await {
        Ok(plot) => match plot.png_bytes() {
            Ok(bytes) => {
                std::fs::write(PLOT_OUTPUT_PATH, &bytes).expect("Failed to write plot image");
                tracing::info!(path = PLOT_OUTPUT_PATH, bytes = bytes.len(), "Plot saved");
            }
            Err(error) => {
                tracing::error!(error = %error, "Plot payload could not be decoded");
            }
        },
        Err(error) => {
            tracing::error!(
                error = %error,
                user_message = %error.user_message(),
                "Plot request failed"
            );
        }
    }
}

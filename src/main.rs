mod broadcaster;
mod config;
mod error;
mod formatters;
mod gnss;
mod imu;
mod sensor_loops;
mod ws;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::get;
use axum::Router;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{info, warn};

use broadcaster::Broadcaster;
use config::{Config, GnssSource};
use gnss::{DaemonGnssReader, DaemonGnssReaderConfig, GnssReader, SerialGnssReader, SerialGnssReaderConfig};
use imu::{ImuReader, ImuReaderConfig};
use ws::{ws_handler, AppState};

async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

fn build_cors(origins: &str) -> CorsLayer {
    if origins.trim() == "*" {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }
    let parsed: Vec<HeaderValue> = origins
        .split(',')
        .filter_map(|o| o.trim().parse::<HeaderValue>().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Opens the configured GNSS reader variant. Setup failures are logged; the
/// loop that would have used this reader simply never starts, and the
/// service keeps serving whatever other producers came up.
fn open_gnss_reader(config: &Config) -> Option<GnssReader> {
    match config.gnss_source {
        GnssSource::Serial => {
            let reader_config = SerialGnssReaderConfig {
                port_path: config.gnss_serial_port.clone(),
                baud_rate: config.gnss_serial_baud,
                read_timeout: config.gnss_read_timeout,
            };
            match SerialGnssReader::open(&reader_config) {
                Ok(reader) => Some(GnssReader::Serial(reader)),
                Err(e) => {
                    warn!("failed to open serial gnss reader: {e}");
                    None
                }
            }
        }
        GnssSource::Daemon => {
            let reader_config = DaemonGnssReaderConfig {
                host: config.gnss_daemon_host.clone(),
                port: config.gnss_daemon_port,
                read_timeout: config.gnss_read_timeout,
            };
            match DaemonGnssReader::open(&reader_config) {
                Ok(reader) => Some(GnssReader::Daemon(reader)),
                Err(e) => {
                    warn!("failed to open daemon gnss reader: {e}");
                    None
                }
            }
        }
    }
}

fn open_imu_reader(config: &Config) -> Option<ImuReader> {
    let reader_config = ImuReaderConfig {
        gpio_chip: config.imu_gpio_chip.clone(),
        gpio_line: config.imu_gpio_line,
        spi_bus: config.imu_spi_bus,
        spi_device: config.imu_spi_device,
    };
    match ImuReader::open(&reader_config) {
        Ok(reader) => Some(reader),
        Err(e) => {
            warn!("failed to open imu reader: {e}");
            None
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sensing_telemetry=info,tower_http=warn".into()),
        )
        .init();

    let config = Arc::new(Config::from_env());
    info!(
        "sensing-telemetry v{} starting — gnss source: {:?}",
        env!("CARGO_PKG_VERSION"),
        config.gnss_source
    );

    let broadcaster = Arc::new(Broadcaster::new());
    let stop = Arc::new(AtomicBool::new(false));

    if let Some(imu_reader) = open_imu_reader(&config) {
        let broadcaster = broadcaster.clone();
        let stop = stop.clone();
        let timeout = config.imu_read_timeout;
        std::thread::spawn(move || {
            sensor_loops::run_imu_loop(imu_reader, timeout, broadcaster, stop);
        });
    }

    if let Some(gnss_reader) = open_gnss_reader(&config) {
        let broadcaster = broadcaster.clone();
        let stop = stop.clone();
        std::thread::spawn(move || {
            sensor_loops::run_gnss_loop(gnss_reader, broadcaster, stop);
        });
    }

    let cors = build_cors(&config.cors_origins);
    let state = AppState {
        broadcaster: broadcaster.clone(),
        config: config.clone(),
    };

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(ws_handler))
        .nest_service("/", ServeDir::new(&config.static_dir))
        .layer(cors)
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    info!("listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    layer::SubscriberExt as _,
    util::SubscriberInitExt as _,
};
use transit_server::config::AppConfig;
use transit_server::domain::Bucket;
use transit_server::feed::{FeedClient, FeedStore, RefreshOutcome};
use transit_server::schedule::next_refresh_after;
use transit_server::service::TransitService;
use transit_server::vehicles::{VehicleClient, VehiclePositions};
use transit_server::web::{AppState, create_router};

/// Retry interval while no feed has ever loaded.
const STARTUP_RETRY: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    init_logger();

    let config = AppConfig::from_env();
    info!(
        source = ?config.feed_source,
        refresh_times = ?config.refresh_times,
        refresh_tz = %config.refresh_tz,
        "starting transit server"
    );

    let feed_client = FeedClient::new(config.feed_client()).expect("Failed to create feed client");
    let transit = TransitService::new(FeedStore::new(feed_client), &config.cache);

    let vehicle_client =
        VehicleClient::new(config.vehicle_client()).expect("Failed to create vehicle client");
    let positions = VehiclePositions::new();

    // The server answers 503 until the first load lands
    tokio::spawn(refresh_feed(
        transit.clone(),
        config.refresh_times.clone(),
        config.refresh_tz,
    ));
    tokio::spawn(poll_vehicles(
        transit.clone(),
        vehicle_client,
        positions.clone(),
        config.vehicles_poll,
    ));

    let app = create_router(AppState::new(transit, positions));

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .expect("Failed to bind listen address");
    info!(addr = %config.addr, "listening");
    axum::serve(listener, app).await.expect("Server error");
}

fn init_logger() {
    let default_level = LevelFilter::INFO;
    let rust_log =
        std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_else(|_| default_level.to_string());
    let env_filter = EnvFilter::try_new(rust_log).unwrap_or_else(|e| {
        eprintln!(
            "invalid {}, falling back to level '{}' - {}",
            EnvFilter::DEFAULT_ENV,
            default_level,
            e,
        );
        EnvFilter::new(default_level.to_string())
    });
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(env_filter)
        .init();
}

/// Load the feed now, then at every configured wall-clock time in `zone`.
async fn refresh_feed(transit: TransitService, times: Vec<chrono::NaiveTime>, zone: chrono_tz::Tz) {
    loop {
        // Failures are logged by the store and the old catalog keeps serving
        if let Ok(RefreshOutcome::AlreadyRunning) = transit.refresh().await {
            debug!("scheduled refresh skipped, another one is running");
        }

        let wait = if transit.store().current().await.is_none() {
            STARTUP_RETRY
        } else {
            let now = Utc::now().with_timezone(&zone);
            let next = next_refresh_after(&now, &times);
            info!(%next, "next feed refresh scheduled");
            (next - now).to_std().unwrap_or(Duration::ZERO)
        };
        tokio::time::sleep(wait).await;
    }
}

/// Poll live vehicle positions for every known line.
async fn poll_vehicles(
    transit: TransitService,
    client: VehicleClient,
    positions: VehiclePositions,
    every: Duration,
) {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        interval.tick().await;

        let Ok(lines) = transit.categorized_lines().await else {
            continue;
        };
        if lines.get(Bucket::AllTrams).is_empty() && lines.get(Bucket::AllBuses).is_empty() {
            continue;
        }

        match client.fetch(&lines).await {
            Ok(reports) => {
                let count = positions.update(reports).await;
                debug!(count, "updated vehicle positions");
            }
            Err(e) => warn!(error = %e, "vehicle position poll failed"),
        }
    }
}

use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

use drishti::config::Config;
use drishti::detector::{Detector, HttpDetector, NoOpDetector};
use drishti::domain::push::PgRecipientDirectory;
use drishti::error::ConfigError;
use drishti::pipeline::{Pipeline, ScanSettings};
use drishti::push::{Dispatcher, FcmTransport, ServiceAccountCredentials, ServiceAccountKey};
use drishti::storage::UploadStore;
use drishti::video::FfmpegOpener;
use drishti::{AppState, build_app, logging};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let config = Config::from_env()?;
    tracing::info!(
        sampling_interval = config.sampling_interval.get(),
        targets = ?config.target_classes.iter().collect::<Vec<_>>(),
        "configuration loaded"
    );

    let db = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!().run(&db).await?;
    tracing::info!("database ready");

    let detector: Arc<dyn Detector> = match &config.detector_url {
        Some(url) => Arc::new(HttpDetector::new(
            url,
            config.detector_min_confidence,
            config.detector_timeout,
        )?),
        None => {
            tracing::warn!("DETECTOR_URL is not set; no frame will ever match");
            Arc::new(NoOpDetector::new())
        }
    };

    let key = ServiceAccountKey::from_file(&config.credentials_path)?;
    let credentials = ServiceAccountCredentials::new(key, config.dispatch_timeout)?;
    let project_id = config
        .fcm_project_id
        .clone()
        .or_else(|| credentials.project_id().map(str::to_string))
        .ok_or(ConfigError::Missing {
            name: "FCM_PROJECT_ID",
        })?;
    tracing::info!(%project_id, "push credentials loaded");

    let dispatcher = Dispatcher::new(
        Arc::new(credentials),
        Arc::new(FcmTransport::new(&config.fcm_endpoint, &project_id)),
        config.dispatch_concurrency,
        config.dispatch_timeout,
    );

    let pipeline = Pipeline::new(
        detector,
        Arc::new(PgRecipientDirectory::new(db.clone())),
        dispatcher,
        ScanSettings {
            interval: config.sampling_interval,
            targets: config.target_classes.clone(),
            frame_read_timeout: config.frame_read_timeout,
            alert: config.alert.clone(),
        },
    );

    let state = Arc::new(AppState {
        db,
        pipeline: Arc::new(pipeline),
        opener: Arc::new(FfmpegOpener::default()),
        uploads: UploadStore::new(&config.upload_dir),
    });

    let app = build_app(state, &config.cors_origins, config.max_upload_bytes);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("listening on http://{}", addr);

    drishti::serve(listener, app).await?;
    Ok(())
}

use anyhow::Context;
use fest_api::{app, AppState, Session, SessionDeps};
use fest_core::{AvatarUploader, BookingRepository, CardExporter, DraftRepository, MockAvatarUploader};
use fest_store::app_config::Config;
use fest_store::{FileBookingStore, HttpAvatarUploader, MemoryBookingStore, SvgFileExporter};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fest_api=debug,fest_booking=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting {} booking API on port {}", config.event.name, config.server.port);

    let (bookings, drafts) = if config.storage.ephemeral {
        tracing::warn!("Ephemeral storage: bookings are lost on restart");
        let store = Arc::new(MemoryBookingStore::new());
        let bookings: Arc<dyn BookingRepository> = store.clone();
        let drafts: Arc<dyn DraftRepository> = store;
        (bookings, drafts)
    } else {
        let store = Arc::new(
            FileBookingStore::open(&config.storage.data_dir)
                .await
                .context("Failed to open booking store")?,
        );
        tracing::info!("Storing bookings under {}", config.storage.data_dir.display());
        let bookings: Arc<dyn BookingRepository> = store.clone();
        let drafts: Arc<dyn DraftRepository> = store;
        (bookings, drafts)
    };

    let uploader: Arc<dyn AvatarUploader> = match &config.upload.mock_url {
        Some(url) => {
            tracing::warn!("Avatar uploads are mocked, every photo resolves to {}", url);
            Arc::new(MockAvatarUploader::succeeding(url.clone()))
        }
        None => Arc::new(
            HttpAvatarUploader::new(&config.upload).context("Failed to build upload client")?,
        ),
    };

    let exporter: Arc<dyn CardExporter> = Arc::new(SvgFileExporter::new(&config.storage.export_dir));

    let session = Session::spawn(SessionDeps {
        bookings: bookings.clone(),
        drafts,
        uploader,
        event: config.event.clone(),
        upload_timeout: Duration::from_secs(config.upload.timeout_seconds),
    })
    .await;

    let app_state = AppState {
        session,
        bookings,
        exporter,
    };

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(app_state)).await?;
    Ok(())
}

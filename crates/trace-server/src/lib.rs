//! Service layer around the trace engine: elevation augmentation,
//! dataset persistence, and edit operations. The web routes embedding
//! this crate live elsewhere.

pub mod config;
pub mod elevation;
pub mod persistence;
pub mod service;

pub use config::Config;
pub use elevation::{ElevationError, ProfileClient};
pub use persistence::{init_database, Database};
pub use service::{DatasetService, MarkerUpload, ServiceError};

/// Initialize tracing for binaries embedding the service.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}

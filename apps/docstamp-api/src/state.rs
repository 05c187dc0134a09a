//! Application state for the Docstamp API

use anyhow::{Context, Result};
use docstamp_core::{FsStore, SigningService};

use crate::config::ApiConfig;

pub struct AppState {
    pub config: ApiConfig,
    pub service: SigningService<FsStore>,
}

impl AppState {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let store = FsStore::new(&config.upload_dir)
            .with_context(|| format!("Cannot open upload dir {}", config.upload_dir.display()))?;
        tracing::info!("Storing documents in {}", store.root().display());

        let service = SigningService::with_options(store, config.signing.clone());
        Ok(Self { config, service })
    }
}

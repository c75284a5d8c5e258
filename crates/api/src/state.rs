use std::sync::Arc;

use gallery_config::Settings;
use gallery_services::GalleryService;
use gallery_services::drive::{ImageStore, auth::CredentialProvider, client::DriveClient};

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub gallery: Arc<GalleryService>,
}

impl AppState {
    /// Production state backed by the real Drive client. Fails fast when the
    /// service-account credentials are missing or malformed.
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        let credentials =
            CredentialProvider::new(&settings.drive, settings.cache.token_ttl_secs)?;
        let store: Arc<dyn ImageStore> = Arc::new(DriveClient::new(credentials));
        Ok(Self::with_store(store, settings))
    }

    /// State over an arbitrary store implementation; tests inject fakes here.
    pub fn with_store(store: Arc<dyn ImageStore>, settings: Settings) -> Self {
        let gallery = Arc::new(GalleryService::new(store, &settings.cache));
        Self { settings, gallery }
    }
}

// Application state module
// Process-wide dependencies resolved once at startup

use crate::presign::UploadPresigner;
use crate::store::Store;

use super::types::Config;

/// Application state
///
/// Shared read-only across connection tasks; the store's tables carry their
/// own per-key synchronization.
#[derive(Debug)]
pub struct AppState {
    pub config: Config,
    pub store: Store,
    pub presigner: UploadPresigner,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let store = Store::new(&config.storage.tables);
        let presigner = UploadPresigner::new(
            &config.presign.secret,
            &config.presign.public_base_url,
            config.presign.url_ttl_secs,
        );
        Self {
            config,
            store,
            presigner,
        }
    }
}

use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::db::Store;
use crate::services::{AuthService, ImageStore, SeaOrmAuthService};

/// Process-wide services, built once at startup and handed to the router.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub images: Arc<ImageStore>,

    pub auth: Arc<dyn AuthService>,
}

impl SharedState {
    /// Bootstraps storage: creates the upload directory, applies migrations,
    /// and seeds the administrator when none exists.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let images = Arc::new(ImageStore::new(
            &config.storage.upload_path,
            &config.storage.public_prefix,
        ));
        images
            .ensure_dir()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create upload folder: {e}"))?;
        info!(path = %images.root().display(), "Upload folder ready");

        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let auth = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            config.security.clone(),
        )) as Arc<dyn AuthService>;

        let created = auth
            .ensure_admin(
                &config.admin.default_username,
                &config.admin.default_password,
            )
            .await
            .map_err(|e| anyhow::anyhow!("Failed to seed admin user: {e}"))?;

        if created {
            info!(username = %config.admin.default_username, "Admin user created");
            warn!("Default admin credentials are in use; change them before exposing this server");
        } else {
            info!("Admin user already exists");
        }

        Ok(Self {
            config: Arc::new(config),
            store,
            images,
            auth,
        })
    }
}

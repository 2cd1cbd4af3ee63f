//! One-shot notices carried in the session across a redirect.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::constants::session::FLASH_KEY;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub category: String,
    pub message: String,
}

impl Flash {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            category: "error".to_string(),
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            category: "success".to_string(),
            message: message.into(),
        }
    }
}

pub async fn push(session: &Session, flash: Flash) {
    let mut pending = session
        .get::<Vec<Flash>>(FLASH_KEY)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();
    pending.push(flash);

    if let Err(e) = session.insert(FLASH_KEY, pending).await {
        tracing::warn!(error = %e, "Failed to store flash message");
    }
}

/// Drains pending notices so each is shown once.
pub async fn take(session: &Session) -> Vec<Flash> {
    session
        .remove::<Vec<Flash>>(FLASH_KEY)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

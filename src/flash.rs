//! One-shot notices carried in the session across a redirect.

use actix_session::Session;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

const FLASH_KEY: &str = "_flashes";

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Warning,
    Danger,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub level: Level,
    pub message: String,
}

pub fn push(session: &Session, level: Level, message: impl Into<String>) -> Result<(), AppError> {
    let mut flashes: Vec<Flash> = session.get(FLASH_KEY)?.unwrap_or_default();
    flashes.push(Flash {
        level,
        message: message.into(),
    });
    session.insert(FLASH_KEY, flashes)?;
    Ok(())
}

/// Drains pending flashes; a corrupt entry is dropped rather than failing the page.
pub fn take(session: &Session) -> Vec<Flash> {
    match session.remove_as::<Vec<Flash>>(FLASH_KEY) {
        Some(Ok(flashes)) => flashes,
        Some(Err(raw)) => {
            log::warn!("Discarding unreadable flash messages: {}", raw);
            Vec::new()
        }
        None => Vec::new(),
    }
}

use actix_identity::IdentityExt;
use actix_utils::future::{ready, Ready};
use actix_web::{dev::Payload, FromRequest, HttpRequest};

use crate::{db, errors::AppError, structs::User, AppState};

/// The id of the logged-in user, as stored in the identity cookie.
///
/// Extracting it from an anonymous request fails with [`AppError::Unauthorized`],
/// which renders as a redirect to the login page.
#[derive(Debug, Clone, Copy)]
pub struct SessionUser {
    pub id: i64,
}

impl FromRequest for SessionUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(session_user(req))
    }
}

fn session_user(req: &HttpRequest) -> Result<SessionUser, AppError> {
    let identity = req.get_identity().map_err(|_| AppError::Unauthorized)?;
    let id = identity.id().map_err(|e| {
        log::warn!("Unreadable identity in session: {}", e);
        AppError::Unauthorized
    })?;
    let id = id.parse::<i64>().map_err(|_| {
        log::warn!("Identity is not a user id: {}", id);
        AppError::Unauthorized
    })?;
    Ok(SessionUser { id })
}

impl SessionUser {
    /// Loads the full record; a session for a user that no longer exists counts as logged out.
    pub async fn load(self, state: &AppState) -> Result<User, AppError> {
        let user = db::get_user_by_id(state, self.id).await.map_err(|e| {
            log::error!("Failed to load user {}: {}", self.id, e);
            AppError::DatabaseError(e)
        })?;
        user.ok_or(AppError::Unauthorized)
    }
}

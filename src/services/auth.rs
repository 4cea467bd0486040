// src/services/auth.rs
// DOCUMENTATION: Bearer credential verification
// PURPOSE: Resolve an opaque credential to an authenticated user id

use crate::errors::PlacesError;
use actix_web::http::header;
use actix_web::HttpRequest;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Maps opaque bearer credentials to user ids.
/// DOCUMENTATION: Credential issuance (signup/login, token format, expiry)
/// belongs to the external auth subsystem; that subsystem hands tokens to this
/// guard via `grant`. Every mutating request resolves its identity here before
/// any storage access, and the resolved id is passed down explicitly - there is
/// no ambient logged-in state.
pub struct AuthGuard {
    sessions: RwLock<HashMap<String, Uuid>>,
}

impl AuthGuard {
    pub fn new() -> Self {
        AuthGuard { sessions: RwLock::new(HashMap::new()) }
    }

    /// Associate a credential with a user id. Called from the provisioning
    /// boundary on behalf of the auth subsystem.
    pub async fn grant(&self, token: String, user_id: Uuid) {
        self.sessions.write().await.insert(token, user_id);
    }

    /// Resolve a raw bearer token to a user id.
    pub async fn authenticate(&self, credential: &str) -> Result<Uuid, PlacesError> {
        self.sessions
            .read()
            .await
            .get(credential)
            .copied()
            .ok_or_else(|| {
                log::warn!("Request with unknown credential");
                PlacesError::Unauthorized
            })
    }
}

impl Default for AuthGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the bearer token from the Authorization header.
pub fn bearer_token(req: &HttpRequest) -> Result<String, PlacesError> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.to_string())
        .ok_or_else(|| {
            log::warn!("Request without bearer credential");
            PlacesError::Unauthorized
        })
}

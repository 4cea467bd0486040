// src/handlers/admin.rs
// DOCUMENTATION: Admin handlers for provisioning and statistics
// PURPOSE: The boundary through which the external auth subsystem provisions
// user identities and bearer credentials

use crate::config::Config;
use crate::db::PlaceStore;
use crate::errors::PlacesError;
use crate::services::AuthGuard;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request body for user provisioning
#[derive(Debug, Default, Deserialize)]
pub struct ProvisionUserRequest {
    /// Optional fixed id, e.g. when mirroring an existing account
    pub user_id: Option<Uuid>,
}

/// Response for user provisioning
#[derive(Debug, Serialize)]
pub struct ProvisionedUserResponse {
    pub user_id: Uuid,
    /// Opaque bearer credential for the new user
    pub token: String,
}

/// Response for the stats endpoint
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_places: usize,
    pub total_users: usize,
}

/// POST /admin/users
/// Register a user with the store and issue a bearer credential
///
/// DOCUMENTATION: Stands in for the external auth subsystem's signup path;
/// requires admin authentication via X-Admin-Token header
pub async fn provision_user(
    store: web::Data<PlaceStore>,
    guard: web::Data<AuthGuard>,
    config: web::Data<Config>,
    req: HttpRequest,
    body: Option<web::Json<ProvisionUserRequest>>,
) -> Result<impl Responder, PlacesError> {
    verify_admin_token(&req, &config)?;

    let user_id = body
        .map(|b| b.into_inner())
        .unwrap_or_default()
        .user_id
        .unwrap_or_else(Uuid::new_v4);

    if !store.register_user(user_id).await {
        log::info!("Provisioning issued a new credential for existing user {}", user_id);
    }

    let token = Uuid::new_v4().to_string();
    guard.grant(token.clone(), user_id).await;

    Ok(HttpResponse::Created().json(ProvisionedUserResponse { user_id, token }))
}

/// GET /admin/stats
/// Entity counts for observability
pub async fn stats(
    store: web::Data<PlaceStore>,
    config: web::Data<Config>,
    req: HttpRequest,
) -> Result<impl Responder, PlacesError> {
    verify_admin_token(&req, &config)?;

    Ok(HttpResponse::Ok().json(StatsResponse {
        total_places: store.place_count().await,
        total_users: store.user_count().await,
    }))
}

/// Helper function to verify admin authentication
/// DOCUMENTATION: Checks X-Admin-Token header against configured admin token
fn verify_admin_token(req: &HttpRequest, config: &Config) -> Result<(), PlacesError> {
    let token = req
        .headers()
        .get("X-Admin-Token")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            log::warn!("Admin request without token");
            PlacesError::Unauthorized
        })?;

    if token != config.admin_token {
        log::warn!("Admin request with invalid token");
        return Err(PlacesError::Forbidden);
    }

    Ok(())
}

/// Configuration for admin routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/users", web::post().to(provision_user))
            .route("/stats", web::get().to(stats)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers;
    use actix_web::{http::StatusCode, test, App};
    use std::sync::Arc;

    fn test_config() -> Config {
        Config {
            server_address: "127.0.0.1".into(),
            server_port: 0,
            environment: "test".into(),
            log_level: "debug".into(),
            geocoding_api_key: String::new(),
            admin_token: "secret".into(),
            uploads_dir: "uploads".into(),
        }
    }

    #[actix_rt::test]
    async fn provisioning_requires_the_admin_token() {
        let store = Arc::new(PlaceStore::new());
        let guard = Arc::new(AuthGuard::new());

        let app = test::init_service(
            App::new()
                .app_data(web::Data::from(store.clone()))
                .app_data(web::Data::from(guard.clone()))
                .app_data(web::Data::new(test_config()))
                .configure(handlers::admin_config),
        )
        .await;

        let req = test::TestRequest::post().uri("/admin/users").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::post()
            .uri("/admin/users")
            .insert_header(("X-Admin-Token", "wrong"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::post()
            .uri("/admin/users")
            .insert_header(("X-Admin-Token", "secret"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: serde_json::Value = test::read_body_json(resp).await;
        let user_id: Uuid = body["user_id"].as_str().unwrap().parse().unwrap();

        assert!(store.user_exists(user_id).await);
        let token = body["token"].as_str().unwrap();
        assert_eq!(guard.authenticate(token).await.unwrap(), user_id);
    }
}

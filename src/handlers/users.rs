// src/handlers/users.rs
// DOCUMENTATION: HTTP handlers for user-scoped place queries
// PURPOSE: Expose the owner index as a read endpoint

use crate::db::PlaceStore;
use crate::errors::PlacesError;
use crate::services::PlaceService;
use actix_web::{web, HttpResponse, Responder};
use uuid::Uuid;

/// GET /users/{uid}/places
/// All places created by the given user
pub async fn get_user_places(
    store: web::Data<PlaceStore>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, PlacesError> {
    let places = PlaceService::get_places_by_user(store.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(places))
}

/// Configuration for user routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/users").route("/{uid}/places", web::get().to(get_user_places)));
}

// src/handlers/places.rs
// DOCUMENTATION: HTTP handlers for place operations
// PURPOSE: Parse requests, resolve identity, call services, return responses

use crate::db::PlaceStore;
use crate::errors::PlacesError;
use crate::models::{CreatePlaceRequest, RatePlaceRequest, UpdatePlaceRequest};
use crate::services::{bearer_token, AuthGuard, Geocoder, ImageStore, PlaceService};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use uuid::Uuid;
use validator::Validate;

/// GET /places/{id}
/// Retrieve a place by ID
pub async fn get_place(
    store: web::Data<PlaceStore>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, PlacesError> {
    let place = PlaceService::get_place(store.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(place))
}

/// POST /places
/// Create a new place owned by the authenticated user
pub async fn create_place(
    store: web::Data<PlaceStore>,
    guard: web::Data<AuthGuard>,
    geocoder: web::Data<dyn Geocoder>,
    http_req: HttpRequest,
    req: web::Json<CreatePlaceRequest>,
) -> Result<impl Responder, PlacesError> {
    let requester = guard.authenticate(&bearer_token(&http_req)?).await?;

    // Validate request
    if let Err(e) = req.validate() {
        return Err(PlacesError::ValidationError(e.to_string()));
    }

    let place = PlaceService::create_place(
        store.get_ref(),
        geocoder.get_ref(),
        requester,
        req.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Created().json(place))
}

/// PATCH /places/{id}
/// Replace a place's title and description (owner only)
pub async fn update_place(
    store: web::Data<PlaceStore>,
    guard: web::Data<AuthGuard>,
    http_req: HttpRequest,
    path: web::Path<Uuid>,
    req: web::Json<UpdatePlaceRequest>,
) -> Result<impl Responder, PlacesError> {
    let requester = guard.authenticate(&bearer_token(&http_req)?).await?;

    if let Err(e) = req.validate() {
        return Err(PlacesError::ValidationError(e.to_string()));
    }

    let place = PlaceService::update_place(
        store.get_ref(),
        path.into_inner(),
        requester,
        req.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(place))
}

/// DELETE /places/{id}
/// Delete a place (owner only)
pub async fn delete_place(
    store: web::Data<PlaceStore>,
    guard: web::Data<AuthGuard>,
    images: web::Data<dyn ImageStore>,
    http_req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<impl Responder, PlacesError> {
    let requester = guard.authenticate(&bearer_token(&http_req)?).await?;

    PlaceService::delete_place(
        store.get_ref(),
        images.clone().into_inner(),
        path.into_inner(),
        requester,
    )
    .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// PATCH /places/{id}/rating
/// Record the authenticated user's vote for a place
pub async fn rate_place(
    store: web::Data<PlaceStore>,
    guard: web::Data<AuthGuard>,
    http_req: HttpRequest,
    path: web::Path<Uuid>,
    req: web::Json<RatePlaceRequest>,
) -> Result<impl Responder, PlacesError> {
    let rater = guard.authenticate(&bearer_token(&http_req)?).await?;

    let summary =
        PlaceService::rate_place(store.get_ref(), path.into_inner(), rater, req.rating).await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// Configuration for place routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/places")
            .route("", web::post().to(create_place))
            .route("/{id}", web::get().to(get_place))
            .route("/{id}", web::patch().to(update_place))
            .route("/{id}", web::delete().to(delete_place))
            .route("/{id}/rating", web::patch().to(rate_place)),
    );
}

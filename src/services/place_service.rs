// src/services/place_service.rs
// DOCUMENTATION: Business logic for places
// PURPOSE: Orchestrates geocoder, store, owner index and rating aggregator

use crate::db::{CommitError, PlaceStore};
use crate::errors::PlacesError;
use crate::models::{
    CreatePlaceRequest, Place, PlaceDetailResponse, RatingSummary, UpdatePlaceRequest,
};
use crate::services::{Geocoder, ImageStore, RatingAggregator};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use uuid::Uuid;

/// Retry budget for versioned commits that lost a race. Distinct from the
/// store's own transaction retry: a conflict here just means another writer
/// committed first, so we re-read and recompute.
const CAS_RETRY_LIMIT: u32 = 3;
const CAS_BACKOFF: Duration = Duration::from_millis(10);

pub struct PlaceService;

impl PlaceService {
    /// Get a place by ID. Read-only; answers with the full record including
    /// the rating ledger.
    pub async fn get_place(
        store: &PlaceStore,
        place_id: Uuid,
    ) -> Result<PlaceDetailResponse, PlacesError> {
        let place = store.get(place_id).await?;
        Ok(place.to_detail_response())
    }

    /// All places owned by a user, answered through the reverse index.
    /// Zero places - whether the user is unknown or just owns nothing - is
    /// reported as NotFound.
    pub async fn get_places_by_user(
        store: &PlaceStore,
        user_id: Uuid,
    ) -> Result<Vec<PlaceDetailResponse>, PlacesError> {
        let places = store.find_by_owner(user_id).await;
        if places.is_empty() {
            return Err(PlacesError::NotFound(format!(
                "no places for user {}",
                user_id
            )));
        }
        Ok(places.iter().map(Place::to_detail_response).collect())
    }

    /// Create a new place owned by `owner_id`.
    /// DOCUMENTATION: The address is resolved before anything is written, so a
    /// geocoding failure leaves no partial state; the insert and the owner link
    /// then commit as one transaction in the store.
    pub async fn create_place(
        store: &PlaceStore,
        geocoder: &dyn Geocoder,
        owner_id: Uuid,
        req: CreatePlaceRequest,
    ) -> Result<PlaceDetailResponse, PlacesError> {
        let location = geocoder.resolve(&req.address).await?;

        let place = Place::new(
            req.title,
            req.description,
            req.address,
            location,
            req.image,
            owner_id,
        );
        let created = store.create_with_owner_link(place).await?;
        Ok(created.to_detail_response())
    }

    /// Replace a place's title and description. Only the creator may update.
    pub async fn update_place(
        store: &PlaceStore,
        place_id: Uuid,
        requester_id: Uuid,
        req: UpdatePlaceRequest,
    ) -> Result<PlaceDetailResponse, PlacesError> {
        for attempt in 0..=CAS_RETRY_LIMIT {
            let (place, version) = store.get_versioned(place_id).await?;
            if place.creator_id != requester_id {
                log::warn!(
                    "User {} tried to update place {} owned by {}",
                    requester_id,
                    place_id,
                    place.creator_id
                );
                return Err(PlacesError::Forbidden);
            }

            match store
                .update_content(place_id, version, req.title.clone(), req.description.clone())
                .await
            {
                Ok(updated) => {
                    log::info!("Updated place {}", place_id);
                    return Ok(updated.to_detail_response());
                }
                Err(CommitError::Missing) => {
                    return Err(PlacesError::NotFound(place_id.to_string()))
                }
                Err(CommitError::Conflict) => {
                    log::debug!("Update of place {} lost a race, retrying", place_id);
                    sleep(CAS_BACKOFF * (attempt + 1)).await;
                }
            }
        }

        Err(PlacesError::StorageFailure(format!(
            "update of place {} kept conflicting",
            place_id
        )))
    }

    /// Delete a place and unlink it from its owner.
    /// DOCUMENTATION: The record removal and the owner unlink commit together;
    /// the stored image is released afterwards, best-effort - a failure there
    /// is logged and never propagated, the delete has already succeeded.
    pub async fn delete_place(
        store: &PlaceStore,
        images: Arc<dyn ImageStore>,
        place_id: Uuid,
        requester_id: Uuid,
    ) -> Result<(), PlacesError> {
        let place = store.get(place_id).await?;
        if place.creator_id != requester_id {
            log::warn!(
                "User {} tried to delete place {} owned by {}",
                requester_id,
                place_id,
                place.creator_id
            );
            return Err(PlacesError::Forbidden);
        }

        let removed = store
            .delete_with_owner_unlink(place_id, place.creator_id)
            .await?;

        let image = removed.image;
        tokio::spawn(async move {
            if let Err(e) = images.release(&image).await {
                log::warn!(
                    "Could not release image {} of deleted place {}: {:#}",
                    image,
                    place_id,
                    e
                );
            }
        });

        Ok(())
    }

    /// Record one rater's vote and return the new summary.
    /// DOCUMENTATION: Read-compute-commit on the versioned record. The
    /// aggregator is pure, so losing the commit race just means re-reading the
    /// ledger and applying the vote again - no vote is ever dropped.
    pub async fn rate_place(
        store: &PlaceStore,
        place_id: Uuid,
        rater_id: Uuid,
        value: i32,
    ) -> Result<RatingSummary, PlacesError> {
        if !(1..=5).contains(&value) {
            return Err(PlacesError::InvalidRating(value));
        }

        for attempt in 0..=CAS_RETRY_LIMIT {
            let (place, version) = store.get_versioned(place_id).await?;
            let ledger = RatingAggregator::apply(&place.rating, rater_id, value);

            match store.commit_rating(place_id, version, ledger).await {
                Ok(updated) => {
                    log::info!(
                        "User {} rated place {} with {} (average now {:.1})",
                        rater_id,
                        place_id,
                        value,
                        updated.rating.average
                    );
                    return Ok(updated.rating.summary());
                }
                Err(CommitError::Missing) => {
                    return Err(PlacesError::NotFound(place_id.to_string()))
                }
                Err(CommitError::Conflict) => {
                    log::debug!("Rating of place {} lost a race, retrying", place_id);
                    sleep(CAS_BACKOFF * (attempt + 1)).await;
                }
            }
        }

        Err(PlacesError::StorageFailure(format!(
            "rating of place {} kept conflicting",
            place_id
        )))
    }
}

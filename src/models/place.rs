// src/models/place.rs
// DOCUMENTATION: Core data structures for places
// PURPOSE: Defines all serialization/deserialization models for API and storage

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Geographic coordinates resolved once at creation time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Per-place rating ledger
/// DOCUMENTATION: Two positionally paired sequences plus the derived mean.
/// `rater_ids[i]` cast the vote stored in `rater_ratings[i]`; an id appears at
/// most once and its paired slot always holds that rater's latest vote.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingLedger {
    pub rater_ids: Vec<Uuid>,
    pub rater_ratings: Vec<i32>,
    pub average: f64,
}

impl RatingLedger {
    /// Snapshot of the derived fields exposed to API consumers
    pub fn summary(&self) -> RatingSummary {
        RatingSummary {
            average: self.average,
            count: self.rater_ids.len(),
        }
    }
}

/// Derived rating state returned by the rate operation and embedded in responses
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RatingSummary {
    pub average: f64,
    pub count: usize,
}

/// A complete place record as held by the store
/// DOCUMENTATION: `location` is derived from `address` exactly once at creation
/// and never re-derived; `creator_id` is immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    /// Unique identifier (UUID v4), assigned at creation
    pub id: Uuid,

    /// Place title - required field for all places
    pub title: String,

    /// Detailed description
    pub description: String,

    /// Physical street address as entered by the creator
    pub address: String,

    /// Geocoded coordinates for `address`
    pub location: Coordinates,

    /// Opaque reference to the stored image (path under the uploads root)
    pub image: String,

    /// Owning user; the owner index mirrors this reference
    pub creator_id: Uuid,

    /// Rating ledger, mutated only through the rate operation
    pub rating: RatingLedger,

    /// When record was created
    pub created_at: DateTime<Utc>,

    /// When record was last modified
    pub updated_at: DateTime<Utc>,
}

impl Place {
    /// Build a fresh record for the create operation
    pub fn new(
        title: String,
        description: String,
        address: String,
        location: Coordinates,
        image: String,
        creator_id: Uuid,
    ) -> Self {
        let now = Utc::now();
        Place {
            id: Uuid::new_v4(),
            title,
            description,
            address,
            location,
            image,
            creator_id,
            rating: RatingLedger::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Convert Place to PlaceResponse for API
    /// DOCUMENTATION: Maps the stored record to the core response DTO
    pub fn to_response(&self) -> PlaceResponse {
        PlaceResponse {
            id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            address: self.address.clone(),
            location: self.location,
            image: self.image.clone(),
            creator_id: self.creator_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Full record response including the rating ledger
    /// DOCUMENTATION: Read, create and update all answer with the complete
    /// record; only the rate operation narrows to a bare summary
    pub fn to_detail_response(&self) -> PlaceDetailResponse {
        PlaceDetailResponse {
            place: self.to_response(),
            rating: self.rating.clone(),
        }
    }
}

/// Request DTO for creating a new place
/// DOCUMENTATION: Data transfer object for POST /places
/// Field rules follow the boundary validation of the original write paths
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePlaceRequest {
    /// Place title (required)
    #[validate(length(min = 1, max = 255))]
    pub title: String,

    /// Description, at least a short sentence
    #[validate(length(min = 5))]
    pub description: String,

    /// Address handed to the geocoding adapter
    #[validate(length(min = 1, max = 512))]
    pub address: String,

    /// Stored image reference produced by the upload pipeline
    #[validate(length(min = 1))]
    pub image: String,
}

/// Request DTO for updating an existing place
/// DOCUMENTATION: Data transfer object for PATCH /places/{id}
/// Only title and description are mutable; both are required
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdatePlaceRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,

    #[validate(length(min = 5))]
    pub description: String,
}

/// Request DTO for rating a place
/// DOCUMENTATION: Data transfer object for PATCH /places/{id}/rating
/// The rater identity comes from the authenticated credential, not the body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatePlaceRequest {
    pub rating: i32,
}

/// Core response DTO shared by every place payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub address: String,
    pub location: Coordinates,
    pub image: String,
    pub creator_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Detailed response DTO
/// DOCUMENTATION: Core fields plus the full rating ledger
/// Used by GET/POST/PATCH place endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceDetailResponse {
    #[serde(flatten)]
    pub place: PlaceResponse,
    pub rating: RatingLedger,
}

// src/services/mod.rs
// DOCUMENTATION: Services module organization
// PURPOSE: Re-export service components

pub mod auth;
pub mod geocoding;
pub mod image_store;
pub mod place_service;
pub mod rating;

pub use auth::*;
pub use geocoding::*;
pub use image_store::*;
pub use place_service::*;
pub use rating::*;

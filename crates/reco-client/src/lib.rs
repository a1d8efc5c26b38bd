//! Client for the hosted recommendations web service.
//!
//! This crate provides a Rust client for the recommendation-model API. It
//! handles:
//! - Basic credential construction and the shared HTTP transport
//! - Mapping each operation onto its request template
//! - Decoding the Atom + OData XML response envelope into typed values
//! - Turning non-2xx answers into [`RecoError::Service`]
//!
//! ## Example Usage
//!
//! ```ignore
//! use reco_client::{ImportKind, RecommendationClient};
//! use std::path::Path;
//!
//! let client = RecommendationClient::initialize(&email, &account_key)?;
//! let model_id = client.create_model("demomodel").await?;
//! client.import_file(&model_id, Path::new("Resources/catalog.txt"), ImportKind::Catalog).await?;
//! let build_id = client.build_model(&model_id, "first build").await?;
//! let status = client.get_build_status(&model_id, &build_id).await?;
//! let items = client.get_recommendation(&model_id, &["1", "8"], 5).await?;
//! client.delete_model(&model_id).await?;
//! ```

pub mod client;
pub mod error;
pub mod types;
pub mod uris;
pub mod xml;

// Re-export main types
pub use client::{basic_credential, RecommendationClient};
pub use error::{RecoError, Result};
pub use types::{
    BuildId, BuildParameters, BuildStatus, CatalogItem, ImportKind, ImportReport, ModelId,
    RecommendedItem,
};
pub use uris::DEFAULT_ROOT_URI;
pub use xml::{Element, Envelope, FromRecord};

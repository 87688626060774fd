//! Client side of the NavVis IVION vendor API.

pub mod endpoints;
pub mod types;

pub use endpoints::IvionEndpoints;
pub use types::{LoginPayload, SiteUser, VendorResponse};

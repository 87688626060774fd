pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod ivion;
pub mod middleware;
pub mod router;
pub mod service;
pub mod types;

pub use config::Config;
pub use error::OpenpackError;
pub use router::{AppState, app_router};

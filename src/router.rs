use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    routing::{get, post},
};

use crate::config::Config;
use crate::db::Storage;
use crate::error::OpenpackError;
use crate::handlers::{openpack, sites, users};
use crate::service::openpack::ProxyAccount;
use crate::service::{OpenpackService, SiteService, UserService};

const USER_AGENT: &str = concat!("openpack-gateway/", env!("CARGO_PKG_VERSION"));

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub storage: Storage,
    pub client: reqwest::Client,
}

impl AppState {
    /// Build the state, including the vendor HTTP client with the configured timeout.
    /// Redirects are not followed: a vendor 3xx is reported like any other non-2xx status.
    pub fn new(config: Config, storage: Storage) -> Result<Self, OpenpackError> {
        let timeout = config.vendor_timeout();
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            config: Arc::new(config),
            storage,
            client,
        })
    }

    pub fn users(&self) -> UserService {
        UserService::new(self.storage.clone())
    }

    pub fn sites(&self) -> SiteService {
        SiteService::new(self.storage.clone())
    }

    pub fn openpack(&self) -> OpenpackService {
        OpenpackService::new(
            self.storage.clone(),
            self.client.clone(),
            ProxyAccount::from(self.config.as_ref()),
        )
    }
}

pub fn app_router(state: AppState) -> Router {
    let openpack_routes = Router::new()
        .route("/sites", get(openpack::get_sites))
        .route("/auth", get(openpack::get_token))
        .route("/siteInfo", get(openpack::get_site_info))
        .route("/sitePois", get(openpack::get_site_pois))
        .route("/access", get(openpack::get_signed_url))
        .route("/siteList", get(openpack::get_vendor_sites));

    Router::new()
        .route("/user/signup", post(users::register_user))
        .route("/user/{id}", get(users::get_user))
        .route("/site", post(sites::create_site))
        .route("/site/{id}", get(sites::get_site))
        .route("/site/{id}/credentials", get(sites::get_site_credentials))
        .nest("/openpack", openpack_routes)
        .with_state(state)
}

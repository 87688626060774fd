use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::OpenpackError;

/// Vendor credentials paired with the site they are used against.
#[derive(Debug, Clone)]
pub struct SiteUser {
    pub site_id: Uuid,
    pub user_id: Uuid,
    pub ivion_id: String,
    pub instance_url: String,
    pub ivion_username: String,
    pub ivion_password: String,
}

/// Body of `POST /api/auth/generate_tokens`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoginPayload {
    pub username: String,
    pub password: String,
}

impl From<&SiteUser> for LoginPayload {
    /// The vendor reads the stored password as its username and vice versa,
    /// so the two fields are crossed here.
    fn from(site_user: &SiteUser) -> Self {
        Self {
            username: site_user.ivion_password.clone(),
            password: site_user.ivion_username.clone(),
        }
    }
}

/// A successful vendor answer, passed through to callers as-is.
/// Exactly one of `json` / `text` is set, chosen by the response content type.
#[derive(Debug, Clone, Serialize)]
pub struct VendorResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub json: Option<Value>,
    pub text: Option<String>,
}

impl VendorResponse {
    /// Read a 2xx response. JSON content is parsed, anything else kept as text.
    pub async fn read(resp: reqwest::Response) -> Result<Self, OpenpackError> {
        let status_code = resp.status().as_u16();
        let is_json = resp
            .headers()
            .get(CONTENT_TYPE)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).to_lowercase())
            .is_some_and(|ct| ct.contains("application/json"));
        let headers = resp
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    String::from_utf8_lossy(v.as_bytes()).into_owned(),
                )
            })
            .collect();

        let body = resp.text().await?;
        let (json, text) = if is_json {
            (Some(serde_json::from_str(&body)?), None)
        } else {
            (None, Some(body))
        };

        Ok(Self {
            status_code,
            headers,
            json,
            text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_payload_crosses_stored_credentials() {
        let site_user = SiteUser {
            site_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            ivion_id: "112233".into(),
            instance_url: "https://vendor.example".into(),
            ivion_username: "U".into(),
            ivion_password: "P".into(),
        };
        let payload = LoginPayload::from(&site_user);
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            serde_json::json!({"username": "P", "password": "U"})
        );
    }
}

use reqwest::Client;

use super::error::CastError;
use super::types::CastedLink;
use crate::traits::CastService;

const BASE_URL: &str = "https://cast.debrid.example/api";

/// Casted-links REST client. The auth token rides along as a query
/// parameter, following the upstream's convention.
pub struct CastClient {
    auth_token: String,
    base_url: String,
    http: Client,
}

impl CastClient {
    pub fn new(auth_token: String) -> Self {
        Self::with_base_url(auth_token, BASE_URL.to_string())
    }

    pub fn with_base_url(auth_token: String, base_url: String) -> Self {
        Self {
            auth_token,
            base_url,
            http: Client::new(),
        }
    }

    async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, CastError> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status, "cast API error");
            Err(CastError::Api {
                status,
                message: body,
            })
        }
    }
}

impl CastService for CastClient {
    type Error = CastError;

    async fn list_casted(&self) -> Result<Vec<CastedLink>, CastError> {
        let resp = self
            .http
            .get(format!("{}/links", self.base_url))
            .query(&[("token", &self.auth_token)])
            .send()
            .await?;

        let resp = Self::check_response(resp).await?;
        resp.json()
            .await
            .map_err(|e| CastError::Parse(e.to_string()))
    }

    async fn delete_casted(&self, hash: &str, imdb_id: &str) -> Result<(), CastError> {
        tracing::debug!(hash, imdb_id, "deleting casted link");
        let resp = self
            .http
            .delete(format!("{}/links/{hash}/{imdb_id}", self.base_url))
            .query(&[("token", &self.auth_token)])
            .send()
            .await?;

        Self::check_response(resp).await?;
        Ok(())
    }
}

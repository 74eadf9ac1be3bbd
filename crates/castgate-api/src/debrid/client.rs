use reqwest::Client;

use super::error::DebridError;
use super::types::{AddedTorrent, ApiErrorBody, DownloadItem, TorrentInfo, UnrestrictedLink};
use crate::traits::DebridService;

const BASE_URL: &str = "https://api.real-debrid.com/rest/1.0";

/// Debrid REST client (bearer auth).
pub struct DebridClient {
    access_token: String,
    base_url: String,
    http: Client,
}

impl DebridClient {
    pub fn new(access_token: String) -> Self {
        Self::with_base_url(access_token, BASE_URL.to_string())
    }

    pub fn with_base_url(access_token: String, base_url: String) -> Self {
        Self {
            access_token,
            base_url,
            http: Client::new(),
        }
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    /// Check the HTTP response for errors, decoding the upstream error
    /// body when it is parseable.
    async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, DebridError> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            let (code, message) = match serde_json::from_str::<ApiErrorBody>(&body) {
                Ok(parsed) => (parsed.error_code, parsed.error),
                Err(_) => (None, body),
            };
            tracing::warn!(status, ?code, "debrid API error");
            Err(DebridError::Api {
                status,
                code,
                message,
            })
        }
    }
}

impl DebridService for DebridClient {
    type Error = DebridError;

    async fn add_magnet(&self, magnet: &str) -> Result<AddedTorrent, DebridError> {
        tracing::debug!("adding magnet to debrid account");
        let resp = self
            .http
            .post(format!("{}/torrents/addMagnet", self.base_url))
            .header("Authorization", self.auth_header())
            .form(&[("magnet", magnet)])
            .send()
            .await?;

        let resp = Self::check_response(resp).await?;
        resp.json()
            .await
            .map_err(|e| DebridError::Parse(e.to_string()))
    }

    async fn torrent_info(&self, id: &str) -> Result<TorrentInfo, DebridError> {
        let resp = self
            .http
            .get(format!("{}/torrents/info/{id}", self.base_url))
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        let resp = Self::check_response(resp).await?;
        resp.json()
            .await
            .map_err(|e| DebridError::Parse(e.to_string()))
    }

    async fn select_files(&self, id: &str, files: &str) -> Result<(), DebridError> {
        tracing::debug!(id, files, "selecting torrent files");
        let resp = self
            .http
            .post(format!("{}/torrents/selectFiles/{id}", self.base_url))
            .header("Authorization", self.auth_header())
            .form(&[("files", files)])
            .send()
            .await?;

        Self::check_response(resp).await?;
        Ok(())
    }

    async fn delete_torrent(&self, id: &str) -> Result<(), DebridError> {
        tracing::debug!(id, "deleting torrent job");
        let resp = self
            .http
            .delete(format!("{}/torrents/delete/{id}", self.base_url))
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        Self::check_response(resp).await?;
        Ok(())
    }

    async fn unrestrict(
        &self,
        link: &str,
        ip: Option<&str>,
    ) -> Result<UnrestrictedLink, DebridError> {
        let mut form = vec![("link", link)];
        if let Some(ip) = ip {
            form.push(("ip", ip));
        }

        let resp = self
            .http
            .post(format!("{}/unrestrict/link", self.base_url))
            .header("Authorization", self.auth_header())
            .form(&form)
            .send()
            .await?;

        let resp = Self::check_response(resp).await?;
        resp.json()
            .await
            .map_err(|e| DebridError::Parse(e.to_string()))
    }

    async fn recent_downloads(&self, limit: u32) -> Result<Vec<DownloadItem>, DebridError> {
        let resp = self
            .http
            .get(format!("{}/downloads", self.base_url))
            .header("Authorization", self.auth_header())
            .query(&[("limit", limit.to_string())])
            .send()
            .await?;

        let resp = Self::check_response(resp).await?;
        resp.json()
            .await
            .map_err(|e| DebridError::Parse(e.to_string()))
    }
}

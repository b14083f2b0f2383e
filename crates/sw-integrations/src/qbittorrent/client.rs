use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use sw_core::client::{ClientError, DeleteAck, TorrentClient};
use sw_core::config::{Config, QbittorrentConfig};
use sw_core::types::Task;
use thiserror::Error;
use tracing::{debug, info};

use super::types::TorrentInfo;

#[derive(Debug, Error)]
pub enum QbitError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("login rejected, check the WebUI username and password")]
    LoginFailed,

    #[error("login refused: this IP is banned after too many failed attempts")]
    Banned,

    #[error("qBittorrent API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },
}

pub type Result<T> = std::result::Result<T, QbitError>;

impl From<QbitError> for ClientError {
    fn from(err: QbitError) -> Self {
        match err {
            QbitError::Http(e) if e.is_connect() || e.is_timeout() => {
                ClientError::Connection(e.to_string())
            }
            QbitError::Http(e) if e.is_decode() => ClientError::Decode(e.to_string()),
            QbitError::Http(e) => ClientError::Connection(e.to_string()),
            e @ (QbitError::LoginFailed | QbitError::Banned) => ClientError::Auth(e.to_string()),
            QbitError::Api { status, body } => ClientError::Api { status, body },
        }
    }
}

/// Thin client over the qBittorrent Web API v2.
///
/// The session cookie set by `auth/login` is kept by the inner cookie store,
/// so one instance must be used for the whole run.
#[derive(Debug, Clone)]
pub struct QbitClient {
    http: reqwest::Client,
    base_url: String,
}

impl QbitClient {
    /// Build an unauthenticated client from connection settings.
    pub fn new(config: &QbittorrentConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .danger_accept_invalid_certs(!config.verify_cert)
            .build()?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    /// Build a client, log in with credentials from the environment (when
    /// configured) and log the server versions.
    ///
    /// Without a username the login step is skipped, which works when the
    /// WebUI bypasses authentication for the caller's subnet.
    pub async fn connect(config: &QbittorrentConfig) -> Result<Self> {
        info!(url = %config.url, "connecting to qBittorrent");
        let client = Self::new(config)?;

        if let Some(username) = Config::secret(&config.username_env) {
            let password = Config::secret(&config.password_env).unwrap_or_default();
            client.login(&username, &password).await?;
        } else {
            debug!(env = %config.username_env, "no username configured, skipping login");
        }

        let version = client.app_version().await?;
        let api_version = client.webapi_version().await?;
        info!(version = %version, api_version = %api_version, "connected to qBittorrent");
        Ok(client)
    }

    /// `POST /api/v2/auth/login`.
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let resp = self
            .http
            .post(self.url("auth/login"))
            .header(reqwest::header::REFERER, &self.base_url)
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::FORBIDDEN {
            return Err(QbitError::Banned);
        }
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(QbitError::Api {
                status: status.as_u16(),
                body,
            });
        }
        if body.trim() != "Ok." {
            return Err(QbitError::LoginFailed);
        }
        debug!("qBittorrent login accepted");
        Ok(())
    }

    /// `GET /api/v2/app/version`.
    pub async fn app_version(&self) -> Result<String> {
        self.get_text("app/version").await
    }

    /// `GET /api/v2/app/webapiVersion`.
    pub async fn webapi_version(&self) -> Result<String> {
        self.get_text("app/webapiVersion").await
    }

    /// `GET /api/v2/torrents/info`, optionally filtered to `|`-separated hashes.
    pub async fn torrents(&self, hashes: Option<&str>) -> Result<Vec<TorrentInfo>> {
        let mut req = self.http.get(self.url("torrents/info"));
        if let Some(hashes) = hashes {
            req = req.query(&[("hashes", hashes)]);
        }
        let resp = Self::check(req.send().await?).await?;
        Ok(resp.json().await?)
    }

    /// `POST /api/v2/torrents/delete`.
    pub async fn delete(&self, hashes: &str, delete_files: bool) -> Result<DeleteAck> {
        let resp = self
            .http
            .post(self.url("torrents/delete"))
            .form(&[
                ("hashes", hashes),
                ("deleteFiles", if delete_files { "true" } else { "false" }),
            ])
            .send()
            .await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(DeleteAck::NotFound);
        }
        Self::check(resp).await?;
        Ok(DeleteAck::Deleted)
    }

    async fn get_text(&self, path: &str) -> Result<String> {
        let resp = Self::check(self.http.get(self.url(path)).send().await?).await?;
        Ok(resp.text().await?.trim().to_string())
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(QbitError::Api {
            status: status.as_u16(),
            body,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v2/{}", self.base_url, path)
    }
}

#[async_trait]
impl TorrentClient for QbitClient {
    async fn list_tasks(&self) -> std::result::Result<Vec<Task>, ClientError> {
        let torrents = self.torrents(None).await?;
        debug!(count = torrents.len(), "listed torrents");
        Ok(torrents.into_iter().map(Task::from).collect())
    }

    async fn delete_task(
        &self,
        id: &str,
        delete_files: bool,
    ) -> std::result::Result<DeleteAck, ClientError> {
        Ok(self.delete(id, delete_files).await?)
    }

    async fn task_exists(&self, id: &str) -> std::result::Result<bool, ClientError> {
        let found = self.torrents(Some(id)).await?;
        Ok(found.iter().any(|t| t.hash == id))
    }
}

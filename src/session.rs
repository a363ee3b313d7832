//! Account session module.
//!
//! The session owns the credentials and the HTTP client used to talk
//! to the reporting API. It is created by the commands and lent to
//! the query client, there is no process-wide connection.

use async_trait::async_trait;
use log::{debug, trace};
use reqwest::{header, Client, Method, RequestBuilder, StatusCode};
use std::time::Duration;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::{
    account::config::AccountConfig,
    report::{Error, Result},
};

/// Errors raised while connecting an account session.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("cannot find API token for account {0}")]
    MissingToken(String),
    #[error("cannot use {0} as reporting API base URL")]
    InvalidBaseUrl(Url),
    #[error("cannot build HTTP client")]
    Client(#[source] reqwest::Error),
    #[error("cannot reach reporting API at {0}")]
    Unreachable(String, #[source] reqwest::Error),
    #[error("reporting API rejected the token of account {0} ({1})")]
    Rejected(String, StatusCode),
    #[error("unexpected status {1} while connecting to {0}")]
    UnexpectedStatus(String, StatusCode),
}

/// Authenticated access to the reporting API.
#[async_trait]
pub trait AccountSession: Send + Sync {
    fn is_connected(&self) -> bool;

    async fn connect(&mut self) -> std::result::Result<(), AuthError>;

    /// Builds an authenticated request for the given path segments,
    /// relative to the API base URL.
    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder>;
}

/// Account session backed by a bearer token.
pub struct HttpSession {
    account_name: String,
    base_url: Url,
    token: Option<String>,
    client: Client,
    connected: bool,
}

impl HttpSession {
    pub fn new(account_config: &AccountConfig) -> std::result::Result<Self, AuthError> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(account_config.request_timeout))
            .build()
            .map_err(AuthError::Client)?;

        Ok(Self {
            account_name: account_config.name.clone(),
            base_url: account_config.api_url.clone(),
            token: account_config.token.clone(),
            client,
            connected: false,
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                Error::TransientQueryFailure(format!("cannot use {} as API base", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn build(&self, method: Method, url: Url) -> RequestBuilder {
        let request_id = Uuid::new_v4().to_string();
        trace!("{method} {url} (request id {request_id})");

        let builder = self
            .client
            .request(method, url)
            .header("client-request-id", request_id)
            .header(header::ACCEPT, "application/json");

        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

#[async_trait]
impl AccountSession for HttpSession {
    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn connect(&mut self) -> std::result::Result<(), AuthError> {
        if self.connected {
            debug!("session of account {} already connected", self.account_name);
            return Ok(());
        }

        if self.token.is_none() {
            return Err(AuthError::MissingToken(self.account_name.clone()));
        }

        let url = self
            .url(&["session"])
            .map_err(|_| AuthError::InvalidBaseUrl(self.base_url.clone()))?;
        debug!("connecting account {} to {url}", self.account_name);

        let res = self
            .build(Method::GET, url.clone())
            .send()
            .await
            .map_err(|err| AuthError::Unreachable(url.to_string(), err))?;

        match res.status() {
            status if status.is_success() => {
                self.connected = true;
                Ok(())
            }
            status @ (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => {
                Err(AuthError::Rejected(self.account_name.clone(), status))
            }
            status => Err(AuthError::UnexpectedStatus(url.to_string(), status)),
        }
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        Ok(self.build(method, self.url(segments)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account_config() -> AccountConfig {
        AccountConfig {
            token: Some("secret".into()),
            ..AccountConfig::new("test", "https://reports.localhost/api/v1/".parse().unwrap())
        }
    }

    #[test]
    fn url_encodes_segments() {
        let session = HttpSession::new(&account_config()).unwrap();
        let url = session.url(&["recipients", "team list@localhost"]).unwrap();
        assert_eq!(
            "https://reports.localhost/api/v1/recipients/team%20list@localhost",
            url.as_str()
        );
    }

    #[test]
    fn request_requires_connection() {
        let session = HttpSession::new(&account_config()).unwrap();
        assert!(!session.is_connected());
        assert!(matches!(
            session.request(Method::GET, &["messageTrace"]),
            Err(Error::NotConnected)
        ));
    }

    #[tokio::test]
    async fn connect_without_token() {
        let mut session = HttpSession::new(&AccountConfig {
            token: None,
            ..account_config()
        })
        .unwrap();

        assert!(matches!(
            session.connect().await,
            Err(AuthError::MissingToken(name)) if name == "test"
        ));
    }

    #[tokio::test]
    async fn connect_with_invalid_base_url() {
        let mut session = HttpSession::new(&AccountConfig {
            token: Some("secret".into()),
            ..AccountConfig::new("test", "mailto:reports@localhost".parse().unwrap())
        })
        .unwrap();

        assert!(matches!(
            session.connect().await,
            Err(AuthError::InvalidBaseUrl(url)) if url.as_str() == "mailto:reports@localhost"
        ));
        assert!(!session.is_connected());
    }
}

//! HTTP access to the `/posts` and `/departments` collections.

use async_trait::async_trait;
use reqwest::{Client, Response};
use shared::resource::Resource;
use tracing::debug;
use url::Url;

use crate::{config::ClientSettings, error::ClientError};

#[async_trait]
pub trait ResourceApi<R: Resource>: Send + Sync {
    async fn list(&self) -> Result<Vec<R>, ClientError>;
    async fn create(&self, entity: &R) -> Result<R, ClientError>;
    async fn update(&self, id: R::Id, entity: &R) -> Result<R, ClientError>;
    async fn delete(&self, id: R::Id) -> Result<(), ClientError>;
}

#[derive(Debug, Clone)]
pub struct HttpResourceApi {
    http: Client,
    base_url: Url,
}

impl HttpResourceApi {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .map_err(|source| ClientError::Transport {
                url: settings.api_base_url.clone(),
                source,
            })?;
        Self::with_client(http, &settings.api_base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self, ClientError> {
        let parsed = Url::parse(base_url.trim()).map_err(|source| ClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;
        if parsed.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl {
                url: base_url.to_string(),
                source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
            });
        }
        Ok(Self {
            http,
            base_url: parsed,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // base_url is validated as a base in the constructor
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

fn transport(url: &Url, source: reqwest::Error) -> ClientError {
    ClientError::Transport {
        url: url.to_string(),
        source,
    }
}

/// A body that arrived but is not the expected JSON is a decode error, not a
/// network one.
fn body_error(url: &Url, source: reqwest::Error) -> ClientError {
    if source.is_decode() {
        ClientError::Decode {
            url: url.to_string(),
            source,
        }
    } else {
        transport(url, source)
    }
}

fn check_status(method: &'static str, url: &Url, res: Response) -> Result<Response, ClientError> {
    let status = res.status();
    if status.is_success() {
        Ok(res)
    } else {
        Err(ClientError::Status {
            method,
            url: url.to_string(),
            status,
        })
    }
}

#[async_trait]
impl<R: Resource> ResourceApi<R> for HttpResourceApi {
    async fn list(&self) -> Result<Vec<R>, ClientError> {
        let url = self.endpoint(&[R::PATH]);
        debug!(resource = R::PATH, %url, "fetching collection");
        let res = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|source| transport(&url, source))?;
        let res = check_status("GET", &url, res)?;
        res.json().await.map_err(|source| body_error(&url, source))
    }

    async fn create(&self, entity: &R) -> Result<R, ClientError> {
        let url = self.endpoint(&[R::PATH]);
        debug!(resource = R::PATH, %url, "creating entity");
        let res = self
            .http
            .post(url.clone())
            .json(entity)
            .send()
            .await
            .map_err(|source| transport(&url, source))?;
        let res = check_status("POST", &url, res)?;
        res.json().await.map_err(|source| body_error(&url, source))
    }

    async fn update(&self, id: R::Id, entity: &R) -> Result<R, ClientError> {
        let id = id.to_string();
        let url = self.endpoint(&[R::PATH, id.as_str()]);
        debug!(resource = R::PATH, %url, "updating entity");
        let res = self
            .http
            .put(url.clone())
            .json(entity)
            .send()
            .await
            .map_err(|source| transport(&url, source))?;
        let res = check_status("PUT", &url, res)?;
        res.json().await.map_err(|source| body_error(&url, source))
    }

    async fn delete(&self, id: R::Id) -> Result<(), ClientError> {
        let id = id.to_string();
        let url = self.endpoint(&[R::PATH, id.as_str()]);
        debug!(resource = R::PATH, %url, "deleting entity");
        let res = self
            .http
            .delete(url.clone())
            .send()
            .await
            .map_err(|source| transport(&url, source))?;
        check_status("DELETE", &url, res)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;

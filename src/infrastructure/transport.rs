//! REST transport
//!
//! Paths are relative to the configured endpoint: `wine`, `wine/count`,
//! `wine/4`. Listing parameters travel as ordered query pairs.

use crate::error::{CrudError, Result};
use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

pub trait Transport {
    fn get(&self, path: &str, params: &[(String, String)]) -> Result<Value>;

    fn post(&self, path: &str, body: &Value) -> Result<Value>;

    fn put(&self, path: &str, body: &Value) -> Result<Value>;

    fn delete(&self, path: &str) -> Result<()>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn get(&self, path: &str, params: &[(String, String)]) -> Result<Value> {
        (**self).get(path, params)
    }

    fn post(&self, path: &str, body: &Value) -> Result<Value> {
        (**self).post(path, body)
    }

    fn put(&self, path: &str, body: &Value) -> Result<Value> {
        (**self).put(path, body)
    }

    fn delete(&self, path: &str) -> Result<()> {
        (**self).delete(path)
    }
}

/// Blocking HTTP client over a base URL. No retries.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base: String,
    client: Client,
}

impl HttpTransport {
    pub fn new(base: &str, timeout_secs: Option<u64>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(HttpTransport {
            base: base.trim_end_matches('/').to_string(),
            client: builder.build()?,
        })
    }

    /// Absolute URL for `path`. Absolute `http(s)://` paths are used as is.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    fn check(path: &str, response: Response) -> Result<Response> {
        if response.status() == StatusCode::NOT_FOUND {
            let (resource, id) = path.rsplit_once('/').unwrap_or((path, ""));
            return Err(CrudError::RecordNotFound {
                resource: resource.to_string(),
                id: id.to_string(),
            });
        }
        Ok(response.error_for_status()?)
    }

    fn body(response: Response) -> Result<Value> {
        let text = response.text()?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

impl Transport for HttpTransport {
    fn get(&self, path: &str, params: &[(String, String)]) -> Result<Value> {
        let url = self.url(path);
        log::debug!("GET {} {:?}", url, params);
        let response = self.client.get(&url).query(params).send()?;
        Self::body(Self::check(path, response)?)
    }

    fn post(&self, path: &str, body: &Value) -> Result<Value> {
        let url = self.url(path);
        log::debug!("POST {}", url);
        let response = self.client.post(&url).json(body).send()?;
        Self::body(Self::check(path, response)?)
    }

    fn put(&self, path: &str, body: &Value) -> Result<Value> {
        let url = self.url(path);
        log::debug!("PUT {}", url);
        let response = self.client.put(&url).json(body).send()?;
        Self::body(Self::check(path, response)?)
    }

    fn delete(&self, path: &str) -> Result<()> {
        let url = self.url(path);
        log::debug!("DELETE {}", url);
        let response = self.client.delete(&url).send()?;
        Self::check(path, response)?;
        Ok(())
    }
}

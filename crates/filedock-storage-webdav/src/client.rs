use chrono::{DateTime, Utc};
use filedock_storage_core::ByteReader;
use futures::TryStreamExt;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use tokio_util::io::StreamReader;
use tracing::{debug, instrument};

use crate::error::WebDavError;
use crate::paths::collection_chain;
use crate::propfind::{parse_stat, STAT_REQUEST};

/// Authoritative metadata of a remote resource.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteStat {
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    pub is_collection: bool,
}

/// Authenticated client for one WebDAV endpoint.
///
/// Holds connection parameters only; every call is an independent request
/// with Basic authentication, so one instance can be shared freely.
pub struct WebDavClient {
    http: Client,
    base_url: Url,
    username: String,
    password: String,
}

impl WebDavClient {
    pub fn new(url: &str, username: &str, password: &str) -> Result<Self, WebDavError> {
        let base_url =
            Url::parse(url).map_err(|e| WebDavError::InvalidUrl(format!("{}: {}", url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(WebDavError::InvalidUrl(url.to_string()));
        }
        Ok(Self {
            http: Client::new(),
            base_url,
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn has_password(&self, password: &str) -> bool {
        self.password == password
    }

    /// Absolute URL of a remote path; each segment is percent-encoded.
    fn url_for(&self, path: &str) -> String {
        let encoded: Vec<String> = path
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        let encoded = encoded.join("/");
        let base = self.base_url.as_str().trim_end_matches('/');
        if encoded.starts_with('/') {
            format!("{}{}", base, encoded)
        } else {
            format!("{}/{}", base, encoded)
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.url_for(path))
            .basic_auth(&self.username, Some(&self.password))
    }

    fn dav_method(name: &str) -> Result<Method, WebDavError> {
        Method::from_bytes(name.as_bytes())
            .map_err(|e| WebDavError::InvalidResponse(format!("bad method {}: {}", name, e)))
    }

    fn ensure_success(
        response: Response,
        method: &str,
        path: &str,
    ) -> Result<Response, WebDavError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(WebDavError::Status {
                method: method.to_string(),
                path: path.to_string(),
                status,
            })
        }
    }

    /// MKCOL a single collection.
    async fn mkcol(&self, path: &str) -> Result<(), WebDavError> {
        let response = self.request(Self::dav_method("MKCOL")?, path).send().await?;
        Self::ensure_success(response, "MKCOL", path)?;
        debug!("Created remote collection {}", path);
        Ok(())
    }

    /// Create a collection. With `recursive`, missing parents are created first
    /// and parents that already exist are skipped; the outcome for `path`
    /// itself is returned unchanged so callers can classify it.
    #[instrument(skip(self), level = "debug")]
    pub async fn create_directory(&self, path: &str, recursive: bool) -> Result<(), WebDavError> {
        let targets = if recursive {
            collection_chain(path)
        } else {
            vec![path.to_string()]
        };
        let last = targets.len().saturating_sub(1);

        for (index, target) in targets.iter().enumerate() {
            match self.mkcol(target).await {
                Ok(()) => {}
                Err(e) if index < last && e.is_collection_exists() => {
                    debug!("Remote collection {} already exists", target);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// PUT `content` at `path`.
    ///
    /// Without `overwrite`, the write is conditional on the resource not existing.
    #[instrument(skip(self, content), level = "debug", fields(content_len = content.len()))]
    pub async fn put_file_contents(
        &self,
        path: &str,
        content: Vec<u8>,
        mimetype: &str,
        overwrite: bool,
    ) -> Result<(), WebDavError> {
        let mut request = self.request(Method::PUT, path).body(content);
        if let Ok(value) = HeaderValue::from_str(mimetype) {
            request = request.header(CONTENT_TYPE, value);
        }
        if !overwrite {
            request = request.header("If-None-Match", "*");
        }

        let response = request.send().await?;
        Self::ensure_success(response, "PUT", path)?;
        debug!("Wrote remote file {}", path);
        Ok(())
    }

    /// PROPFIND (Depth 0) for size, modification time and resource type.
    #[instrument(skip(self), level = "debug")]
    pub async fn stat(&self, path: &str) -> Result<RemoteStat, WebDavError> {
        let response = self
            .request(Self::dav_method("PROPFIND")?, path)
            .header("Depth", "0")
            .header(CONTENT_TYPE, "application/xml; charset=utf-8")
            .body(STAT_REQUEST)
            .send()
            .await?;
        let response = Self::ensure_success(response, "PROPFIND", path)?;
        let body = response.text().await?;
        let props = parse_stat(&body)?;

        let last_modified = props.last_modified.unwrap_or_else(|| {
            debug!("No getlastmodified for {}, using current time", path);
            Utc::now()
        });
        Ok(RemoteStat {
            size: props.size.unwrap_or(0),
            last_modified,
            is_collection: props.is_collection,
        })
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn delete_file(&self, path: &str) -> Result<(), WebDavError> {
        let response = self.request(Method::DELETE, path).send().await?;
        Self::ensure_success(response, "DELETE", path)?;
        debug!("Deleted remote file {}", path);
        Ok(())
    }

    /// GET `path` as a reader. The body is not consumed until the reader is polled.
    #[instrument(skip(self), level = "debug")]
    pub async fn read_stream(&self, path: &str) -> Result<ByteReader, WebDavError> {
        let response = self.request(Method::GET, path).send().await?;
        let response = Self::ensure_success(response, "GET", path)?;
        let stream = response.bytes_stream().map_err(std::io::Error::other);
        Ok(Box::new(StreamReader::new(Box::pin(stream))))
    }

    /// Direct download URL with the credentials embedded as userinfo.
    pub fn download_link(&self, path: &str) -> Result<String, WebDavError> {
        let raw = self.url_for(path);
        let mut url =
            Url::parse(&raw).map_err(|e| WebDavError::InvalidUrl(format!("{}: {}", raw, e)))?;
        url.set_username(&self.username)
            .map_err(|_| WebDavError::InvalidUrl(raw.clone()))?;
        url.set_password(Some(&self.password))
            .map_err(|_| WebDavError::InvalidUrl(raw.clone()))?;
        Ok(url.into())
    }
}

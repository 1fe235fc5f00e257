//! REST dispatcher
//!
//! Binds the rate-limit middleware to a transport, assembles requests from
//! routes, maps statuses to typed errors, and transparently retries 429
//! (the middleware has already arranged the wait by then).

use crate::error::{ApiError, RestError};
use crate::http::HttpClient;
use crate::limiter::{RateLimiter, Transport};
use crate::request::{RequestContext, RequestOptions, RestRequest};
use crate::route::Route;
use bytes::Bytes;
use cord_common::API_VERSION;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

/// Header carrying the audit-log reason for moderation endpoints
pub const AUDIT_REASON_HEADER: &str = "X-Audit-Log-Reason";

/// The REST dispatcher
pub struct Rest {
    limiter: RateLimiter,
    base_url: Url,
}

impl Rest {
    /// Dispatcher against the default API base
    pub fn new(token: &str) -> Result<Self, RestError> {
        Self::with_base(token, cord_common::DEFAULT_API_BASE)
    }

    /// Dispatcher against a custom API base (tests, proxies)
    pub fn with_base(token: &str, base: &str) -> Result<Self, RestError> {
        let transport = Arc::new(HttpClient::new(token)?);
        Self::with_transport(transport, base)
    }

    /// Dispatcher over an arbitrary transport
    pub fn with_transport(transport: Arc<dyn Transport>, base: &str) -> Result<Self, RestError> {
        Ok(Self {
            limiter: RateLimiter::new(transport),
            base_url: Url::parse(base)?,
        })
    }

    /// Issue a request and decode the JSON body
    ///
    /// Returns `None` for the no-content statuses (204, 304).
    pub async fn request(
        &self,
        route: Route,
        options: RequestOptions,
    ) -> Result<Option<Value>, RestError> {
        match self.dispatch(&route, &options).await? {
            Some(body) if !body.is_empty() => Ok(Some(serde_json::from_slice(&body)?)),
            _ => Ok(None),
        }
    }

    /// Issue a request and return the raw response bytes undecoded
    pub async fn request_bytes(
        &self,
        route: Route,
        options: RequestOptions,
    ) -> Result<Bytes, RestError> {
        Ok(self.dispatch(&route, &options).await?.unwrap_or_default())
    }

    /// Issue a request and deserialize the body into a concrete type
    pub async fn fire<T: DeserializeOwned>(
        &self,
        route: Route,
        options: RequestOptions,
    ) -> Result<T, RestError> {
        let body = self.dispatch(&route, &options).await?.unwrap_or_default();
        if body.is_empty() {
            // no-content decodes as JSON null (covers `()` and `Option<T>`)
            Ok(serde_json::from_slice(b"null")?)
        } else {
            Ok(serde_json::from_slice(&body)?)
        }
    }

    async fn dispatch(
        &self,
        route: &Route,
        options: &RequestOptions,
    ) -> Result<Option<Bytes>, RestError> {
        let ctx = RequestContext::new(route.rate_limit_key());

        loop {
            let request = self.build_request(route, options, &ctx)?;
            let response = self.limiter.perform(request).await?;
            let status = response.status.as_u16();

            match status {
                204 | 304 => return Ok(None),
                200..=299 => return Ok(Some(response.body)),
                429 => {
                    // the middleware observed retry-after; the next pass
                    // sleeps before touching the transport
                    tracing::debug!(
                        trace = %ctx.trace,
                        key = %ctx.rl_key,
                        "rate limited, retrying"
                    );
                    continue;
                }
                400 => {
                    return Err(RestError::BadRequest {
                        error: ApiError::from_body(&response.body),
                        trace: ctx.trace,
                    })
                }
                401 => {
                    return Err(RestError::Unauthorized {
                        error: ApiError::from_body(&response.body),
                        trace: ctx.trace,
                    })
                }
                403 => {
                    return Err(RestError::Forbidden {
                        error: ApiError::from_body(&response.body),
                        trace: ctx.trace,
                    })
                }
                404 => {
                    return Err(RestError::NotFound {
                        error: ApiError::from_body(&response.body),
                        trace: ctx.trace,
                    })
                }
                405 => {
                    return Err(RestError::MethodNotAllowed {
                        error: ApiError::from_body(&response.body),
                        trace: ctx.trace,
                    })
                }
                500..=599 => {
                    return Err(RestError::Server {
                        status,
                        trace: ctx.trace,
                    })
                }
                _ => {
                    return Err(RestError::UnexpectedStatus {
                        status,
                        trace: ctx.trace,
                    })
                }
            }
        }
    }

    fn build_request(
        &self,
        route: &Route,
        options: &RequestOptions,
        ctx: &RequestContext,
    ) -> Result<RestRequest, RestError> {
        let path = route.formatted_path()?;

        let mut url = self.base_url.clone();
        let full_path = format!("{}/v{}{}", url.path().trim_end_matches('/'), API_VERSION, path);
        url.set_path(&full_path);
        if !options.query.is_empty() {
            url.query_pairs_mut().extend_pairs(
                options.query.iter().map(|(k, v)| (k.as_str(), v.as_str())),
            );
        }

        let mut headers = HeaderMap::new();
        if let Some(reason) = &options.reason {
            let value = HeaderValue::from_str(reason).map_err(|_| {
                RestError::InvalidRequest("audit reason is not a valid header value".into())
            })?;
            headers.insert(AUDIT_REASON_HEADER, value);
        }

        Ok(RestRequest {
            method: route.method().clone(),
            url,
            headers,
            body: options.body.clone(),
            ctx: ctx.clone(),
        })
    }
}

impl std::fmt::Debug for Rest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rest")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

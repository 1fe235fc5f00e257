//! # cord-rest
//!
//! The REST half of the cord client: routes with rate-limit keys, the
//! server-driven bucket table, the serializing rate-limit middleware, and
//! the dispatcher that binds them to an HTTP transport.
//!
//! ## Example
//!
//! ```ignore
//! use cord_rest::{Rest, RequestOptions, Route};
//! use reqwest::Method;
//!
//! let rest = Rest::new("my-token")?;
//! let route = Route::new(Method::GET, "/channels/%{channel_id}")
//!     .param("channel_id", 1234u64);
//! let channel = rest.request(route, RequestOptions::new()).await?;
//! ```

pub mod bucket;
pub mod dispatcher;
pub mod error;
pub mod http;
pub mod limiter;
pub mod request;
pub mod route;

pub use bucket::{Bucket, BucketTable, GLOBAL_BUCKET_ID};
pub use dispatcher::Rest;
pub use error::{ApiError, RestError, RestResult, RouteError};
pub use http::HttpClient;
pub use limiter::{RateLimiter, Transport};
pub use request::{
    FileUpload, Multipart, RequestBody, RequestContext, RequestOptions, RestRequest, RestResponse,
};
pub use route::Route;

// the verb type routes are built from
pub use reqwest::Method;

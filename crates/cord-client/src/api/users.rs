//! User endpoints

use cord_common::Snowflake;
use cord_rest::{RequestOptions, Rest, RestError, Route};
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::Arc;

/// User endpoint group
pub struct UsersApi<'a> {
    rest: &'a Arc<Rest>,
}

impl<'a> UsersApi<'a> {
    #[must_use]
    pub fn new(rest: &'a Arc<Rest>) -> Self {
        Self { rest }
    }

    /// `GET /users/@me`
    pub async fn me(&self) -> Result<Value, RestError> {
        self.rest
            .fire(Route::new(Method::GET, "/users/@me"), RequestOptions::new())
            .await
    }

    /// `GET /users/{user_id}`
    pub async fn get(&self, user_id: Snowflake) -> Result<Value, RestError> {
        self.rest
            .fire(
                Route::new(Method::GET, "/users/%{user_id}").param("user_id", user_id),
                RequestOptions::new(),
            )
            .await
    }

    /// `POST /users/@me/channels` (open a DM)
    pub async fn create_dm(&self, recipient_id: Snowflake) -> Result<Value, RestError> {
        self.rest
            .fire(
                Route::new(Method::POST, "/users/@me/channels"),
                RequestOptions::new().json(json!({ "recipient_id": recipient_id })),
            )
            .await
    }
}

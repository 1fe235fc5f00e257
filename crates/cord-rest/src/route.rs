//! REST routes and rate-limit keys
//!
//! A route is `(verb, path template, params)`. Templates keep their
//! `%{name}` placeholders for identity purposes; only `formatted_path`
//! substitutes them. The rate-limit key uses the template verbatim so two
//! requests collapse into one key exactly when verb, template, and major
//! parameter agree.

use crate::error::RouteError;
use reqwest::Method;
use std::collections::BTreeMap;

/// Major parameters, in priority order; the first one present on a route
/// partitions its bucket
pub const MAJOR_PARAMS: [&str; 3] = ["guild_id", "channel_id", "webhook_id"];

/// A REST endpoint identity
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Route {
    method: Method,
    template: String,
    params: BTreeMap<String, String>,
}

impl Route {
    /// Create a route from a verb and a `%{name}`-templated path
    #[must_use]
    pub fn new(method: Method, template: impl Into<String>) -> Self {
        Self {
            method,
            template: template.into(),
            params: BTreeMap::new(),
        }
    }

    /// Bind a placeholder value
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(name.into(), value.to_string());
        self
    }

    /// HTTP verb
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Unsubstituted path template
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Bound placeholder values
    #[must_use]
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// Value of the route's major parameter, if one is bound
    #[must_use]
    pub fn major_param(&self) -> Option<&str> {
        MAJOR_PARAMS
            .iter()
            .find_map(|name| self.params.get(*name).map(String::as_str))
    }

    /// The key under which the middleware coordinates requests sharing a
    /// quota: `"<lowercase verb>:<template>:<major_or_empty>"`
    #[must_use]
    pub fn rate_limit_key(&self) -> String {
        format!(
            "{}:{}:{}",
            self.method.as_str().to_ascii_lowercase(),
            self.template,
            self.major_param().unwrap_or("")
        )
    }

    /// The template with every placeholder substituted
    pub fn formatted_path(&self) -> Result<String, RouteError> {
        let mut out = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();

        while let Some(start) = rest.find("%{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after.find('}').ok_or_else(|| {
                RouteError::MalformedTemplate(self.template.clone())
            })?;
            let name = &after[..end];
            if name.is_empty() {
                return Err(RouteError::MalformedTemplate(self.template.clone()));
            }
            let value = self
                .params
                .get(name)
                .ok_or_else(|| RouteError::MissingParam(name.to_string()))?;
            out.push_str(value);
            rest = &after[end + 1..];
        }

        out.push_str(rest);
        Ok(out)
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.template)
    }
}

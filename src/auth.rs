//! Route-level authorization. Attached per router; rejects with 401 before the handler runs.

use crate::config::AuthConfig;
use crate::error::{AppError, ConfigError};
use crate::state::AppState;
use axum::{
    extract::Request,
    http::{HeaderMap, HeaderName},
    middleware::{self, Next},
    response::IntoResponse,
    Router,
};
use std::collections::HashSet;
use std::sync::Arc;

pub trait Authorizer: Send + Sync + 'static {
    fn authorize(&self, headers: &HeaderMap) -> bool;
}

impl<F> Authorizer for F
where
    F: Fn(&HeaderMap) -> bool + Send + Sync + 'static,
{
    fn authorize(&self, headers: &HeaderMap) -> bool {
        self(headers)
    }
}

/// Accepts a request when a header carries one of a fixed set of tokens,
/// with or without a `Bearer ` prefix.
#[derive(Clone, Debug)]
pub struct HeaderTokenAuth {
    header: HeaderName,
    tokens: HashSet<String>,
}

impl HeaderTokenAuth {
    pub fn new<I, T>(header: &str, tokens: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let header = HeaderName::from_bytes(header.trim().as_bytes())
            .map_err(|_| ConfigError::InvalidIdentifier(header.to_string()))?;
        Ok(HeaderTokenAuth {
            header,
            tokens: tokens.into_iter().map(Into::into).collect(),
        })
    }

    pub fn bearer<I, T>(tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        HeaderTokenAuth {
            header: axum::http::header::AUTHORIZATION,
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self, ConfigError> {
        Self::new(&config.header, config.tokens.iter().cloned())
    }
}

impl Authorizer for HeaderTokenAuth {
    fn authorize(&self, headers: &HeaderMap) -> bool {
        let Some(raw) = headers.get(&self.header).and_then(|v| v.to_str().ok()) else {
            return false;
        };
        let raw = raw.trim();
        let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
        !token.is_empty() && self.tokens.contains(token)
    }
}

/// Wrap every route already on `router`. Routes added later are not covered.
pub fn require(router: Router<AppState>, authorizer: Arc<dyn Authorizer>) -> Router<AppState> {
    router.route_layer(middleware::from_fn(move |req: Request, next: Next| {
        let authorizer = authorizer.clone();
        async move {
            if authorizer.authorize(req.headers()) {
                next.run(req).await
            } else {
                tracing::debug!(path = %req.uri().path(), "unauthorized");
                AppError::Unauthorized.into_response()
            }
        }
    }))
}

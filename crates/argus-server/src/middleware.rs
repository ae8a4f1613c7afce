use std::{
    collections::BTreeSet,
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use uuid::Uuid;

const API_KEYS_VAR: &str = "ARGUS_API_KEYS";
const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation id carried in request extensions and echoed to the caller.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Bearer keys accepted by the protected routes.
#[derive(Debug, Clone)]
pub struct AuthState {
    api_keys: Arc<Vec<String>>,
    pub enabled: bool,
}

impl AuthState {
    /// Reads comma-separated keys from `ARGUS_API_KEYS`.
    ///
    /// With no keys, auth is switched off in development and startup fails
    /// everywhere else.
    pub fn from_env(is_development: bool) -> anyhow::Result<Self> {
        let raw = std::env::var(API_KEYS_VAR).unwrap_or_default();
        Self::from_keys(&raw, is_development)
    }

    /// [`Self::from_env`] over an explicit list.
    pub fn from_keys(raw: &str, is_development: bool) -> anyhow::Result<Self> {
        let keys: BTreeSet<&str> = raw
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .collect();

        match (keys.is_empty(), is_development) {
            (true, true) => {
                tracing::warn!("{API_KEYS_VAR} is empty; API auth is off for development");
                Ok(Self {
                    api_keys: Arc::new(Vec::new()),
                    enabled: false,
                })
            }
            (true, false) => anyhow::bail!("{API_KEYS_VAR} must list at least one bearer key"),
            (false, _) => Ok(Self {
                api_keys: Arc::new(keys.into_iter().map(str::to_owned).collect()),
                enabled: true,
            }),
        }
    }

    fn allows(&self, token: &str) -> bool {
        self.api_keys
            .iter()
            .any(|key| bool::from(key.as_bytes().ct_eq(token.as_bytes())))
    }
}

#[derive(Debug)]
struct RateLimitWindow {
    opened: Instant,
    served: usize,
}

/// Fixed-window limiter shared by every protected route.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    current: Arc<Mutex<RateLimitWindow>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            current: Arc::new(Mutex::new(RateLimitWindow {
                opened: Instant::now(),
                served: 0,
            })),
        }
    }

    /// Counts one request against the current window. Returns `false` once
    /// the window is full; a new window opens after `window` has elapsed.
    async fn admit(&self) -> bool {
        let mut current = self.current.lock().await;
        if current.opened.elapsed() >= self.window {
            *current = RateLimitWindow {
                opened: Instant::now(),
                served: 0,
            };
        }
        if current.served >= self.max_requests {
            return false;
        }
        current.served += 1;
        true
    }
}

fn rejection(status: StatusCode, code: &'static str, message: &'static str) -> Response {
    let body = serde_json::json!({ "error": { "code": code, "message": message } });
    (status, Json(body)).into_response()
}

/// Tags every request with a [`RequestId`], reusing the caller's
/// `x-request-id` when one is sent, and echoes it on the response.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = match req.headers().get(REQUEST_ID_HEADER).map(HeaderValue::to_str) {
        Some(Ok(existing)) => existing.to_owned(),
        _ => Uuid::new_v4().to_string(),
    };
    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        res.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    res
}

/// Rejects requests without a configured bearer key. A no-op when auth is
/// disabled.
pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    req: Request,
    next: Next,
) -> Response {
    let token = extract_bearer_token(req.headers().get(AUTHORIZATION));
    let authorized = !auth.enabled || token.is_some_and(|t| auth.allows(t));
    if !authorized {
        return rejection(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "missing or invalid bearer token",
        );
    }
    next.run(req).await
}

pub async fn enforce_rate_limit(
    State(limiter): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    if !limiter.admit().await {
        return rejection(
            StatusCode::TOO_MANY_REQUESTS,
            "rate_limited",
            "rate limit exceeded",
        );
    }
    next.run(req).await
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|s| !s.trim().is_empty())
}

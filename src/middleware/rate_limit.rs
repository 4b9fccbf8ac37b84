use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

pub const GENERATION_WINDOW: Duration = Duration::from_secs(60);

/// Clients whose windows have gone quiet are forgotten once this many are tracked.
const MAX_TRACKED_CLIENTS: usize = 10_000;

/// Sliding-window limiter for the question-generation routes. Every client
/// gets its own log of recent request times; a limit of zero disables it.
#[derive(Clone, Debug)]
pub struct GenerationLimiter {
    limit: usize,
    window: Duration,
    clients: Arc<Mutex<HashMap<String, VecDeque<Instant>>>>,
}

impl GenerationLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit: limit as usize,
            window,
            clients: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn per_minute(limit: u32) -> Self {
        Self::new(limit, GENERATION_WINDOW)
    }

    pub fn is_enabled(&self) -> bool {
        self.limit > 0
    }

    /// Records a request for `client` at `now`, or returns how long the
    /// client has to wait before the oldest request leaves the window.
    pub fn check_at(&self, client: &str, now: Instant) -> Result<(), Duration> {
        if !self.is_enabled() {
            return Ok(());
        }

        let mut clients = match self.clients.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if clients.len() >= MAX_TRACKED_CLIENTS && !clients.contains_key(client) {
            let window = self.window;
            clients.retain(|_, log| {
                log.back()
                    .is_some_and(|last| now.saturating_duration_since(*last) < window)
            });
        }

        let log = clients.entry(client.to_string()).or_default();
        while log
            .front()
            .is_some_and(|first| now.saturating_duration_since(*first) >= self.window)
        {
            log.pop_front();
        }

        if log.len() >= self.limit {
            let oldest = log.front().copied().unwrap_or(now);
            return Err(self.window.saturating_sub(now.saturating_duration_since(oldest)));
        }
        log.push_back(now);
        Ok(())
    }

    pub fn check(&self, client: &str) -> Result<(), Duration> {
        self.check_at(client, Instant::now())
    }
}

/// First `X-Forwarded-For` hop, then the peer address, then a shared bucket.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn limit_generation(
    State(limiter): State<GenerationLimiter>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_key(req.headers(), peer);

    if let Err(wait) = limiter.check(&client) {
        let retry_after = wait.as_secs().max(1);
        tracing::warn!(
            client = %client,
            "Generation limit reached on {}, retry in {}s",
            req.uri().path(),
            retry_after
        );
        return (
            StatusCode::TOO_MANY_REQUESTS,
            [(header::RETRY_AFTER, retry_after.to_string())],
            Json(json!({ "error": "Too many quiz requests, try again later" })),
        )
            .into_response();
    }
    next.run(req).await
}

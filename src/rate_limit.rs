//! Fixed-window rate limiting for the contact endpoint.
//!
//! The window algorithm itself is the pure [`step`] function. Stores plug in
//! behind the [`CounterStore`] trait: a Redis-compatible REST store shares
//! state across instances, and an in-process map covers single-instance
//! deployments. Store failures are never surfaced to request handling; the
//! limiter silently degrades to per-instance tracking.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::config::Config;

/// Prune threshold for the in-memory map.
const MAX_TRACKED_KEYS: usize = 1024;

/// Error talking to a counter store. Always recoverable; callers fall back.
#[derive(Debug)]
pub struct StoreError(pub String);

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for StoreError {}

/// Per-key window state. Serialized as JSON into the external store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WindowState {
    pub count: u32,
    pub reset_at_ms: i64,
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Limited { retry_after_secs: u64 },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed)
    }
}

/// One fixed-window transition: given the stored window (if any) and the
/// current time, produce the next window state and the decision.
///
/// Callers persist the returned state only when the request was allowed; a
/// denied request leaves the stored counter untouched.
pub fn step(
    prev: Option<WindowState>,
    now_ms: i64,
    max: u32,
    window: Duration,
) -> (WindowState, RateDecision) {
    match prev {
        Some(state) if now_ms < state.reset_at_ms => {
            if state.count >= max {
                let remaining_ms = state.reset_at_ms - now_ms;
                let retry_after_secs = ((remaining_ms as u64) + 999) / 1000;
                (
                    state,
                    RateDecision::Limited {
                        retry_after_secs: retry_after_secs.max(1),
                    },
                )
            } else {
                (
                    WindowState {
                        count: state.count + 1,
                        reset_at_ms: state.reset_at_ms,
                    },
                    RateDecision::Allowed,
                )
            }
        }
        // No window yet, or the stored one expired: start fresh.
        _ => (
            WindowState {
                count: 1,
                reset_at_ms: now_ms + window.as_millis() as i64,
            },
            RateDecision::Allowed,
        ),
    }
}

/// A swappable backing store for fixed-window counters.
#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn check(&self, key: &str, max: u32, window: Duration)
        -> Result<RateDecision, StoreError>;
}

/// In-process store. The read-check-increment sequence runs under one lock,
/// so concurrent requests cannot let more than `max` through per window.
pub struct MemoryStore {
    windows: Mutex<HashMap<String, WindowState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub async fn hit(&self, key: &str, max: u32, window: Duration) -> RateDecision {
        let mut windows = self.windows.lock().await;
        let now_ms = Utc::now().timestamp_millis();

        if windows.len() > MAX_TRACKED_KEYS {
            windows.retain(|_, state| state.reset_at_ms > now_ms);
        }

        let (next, decision) = step(windows.get(key).copied(), now_ms, max, window);
        if decision.is_allowed() {
            windows.insert(key.to_string(), next);
        }
        decision
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn check(
        &self,
        key: &str,
        max: u32,
        window: Duration,
    ) -> Result<RateDecision, StoreError> {
        Ok(self.hit(key, max, window).await)
    }
}

/// Client for a Redis-compatible REST key-value store (commands POSTed as
/// JSON arrays, responses as `{"result": ...}`).
pub struct RestKvStore {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl RestKvStore {
    pub fn new(base_url: String, token: String) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| StoreError(format!("Failed to create KV client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    async fn command(&self, command: &[String]) -> Result<Value, StoreError> {
        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.token)
            .json(&command)
            .send()
            .await
            .map_err(|e| StoreError(format!("KV request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(StoreError(format!(
                "KV store returned {}",
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| StoreError(format!("Failed to parse KV response: {}", e)))?;

        if let Some(error) = body.get("error").and_then(Value::as_str) {
            return Err(StoreError(format!("KV store error: {}", error)));
        }

        Ok(body.get("result").cloned().unwrap_or(Value::Null))
    }

    async fn get_window(&self, key: &str) -> Result<Option<WindowState>, StoreError> {
        let result = self
            .command(&["GET".to_string(), key.to_string()])
            .await?;

        match result.as_str() {
            None => Ok(None),
            Some(raw) => match serde_json::from_str::<WindowState>(raw) {
                Ok(state) => Ok(Some(state)),
                Err(e) => {
                    // Corrupt entries reset the window rather than blocking traffic
                    tracing::warn!("Discarding unreadable window state for {}: {}", key, e);
                    Ok(None)
                }
            },
        }
    }

    async fn set_window(
        &self,
        key: &str,
        state: &WindowState,
        ttl_secs: u64,
    ) -> Result<(), StoreError> {
        let value = serde_json::to_string(state)
            .map_err(|e| StoreError(format!("Failed to serialize window state: {}", e)))?;

        self.command(&[
            "SET".to_string(),
            key.to_string(),
            value,
            "EX".to_string(),
            ttl_secs.to_string(),
        ])
        .await
        .map(|_| ())
    }
}

#[async_trait]
impl CounterStore for RestKvStore {
    async fn check(
        &self,
        key: &str,
        max: u32,
        window: Duration,
    ) -> Result<RateDecision, StoreError> {
        let now_ms = Utc::now().timestamp_millis();
        let prev = self.get_window(key).await?;
        let (next, decision) = step(prev, now_ms, max, window);

        if decision.is_allowed() {
            // TTL covers the remainder of the window
            let ttl_secs = ((((next.reset_at_ms - now_ms) as u64) + 999) / 1000).max(1);
            self.set_window(key, &next, ttl_secs).await?;
        }

        Ok(decision)
    }
}

/// Facade owned by the application state: shared store first when configured,
/// silent fallback to per-instance tracking on any store failure.
pub struct RateLimiter {
    remote: Option<Box<dyn CounterStore>>,
    local: MemoryStore,
    max: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max: u32, window: Duration) -> Self {
        Self {
            remote: None,
            local: MemoryStore::new(),
            max,
            window,
        }
    }

    pub fn with_remote(mut self, store: Box<dyn CounterStore>) -> Self {
        self.remote = Some(store);
        self
    }

    pub fn from_config(config: &Config) -> Self {
        let window = Duration::from_secs(config.contact_rate_limit_window_secs);
        let mut limiter = Self::new(config.contact_rate_limit_max, window);

        if let (Some(url), Some(token)) = (&config.kv_rest_url, &config.kv_rest_token) {
            match RestKvStore::new(url.clone(), token.clone()) {
                Ok(store) => {
                    tracing::info!("Shared rate-limit store initialized: {}", url);
                    limiter = limiter.with_remote(Box::new(store));
                }
                Err(e) => {
                    tracing::error!("Failed to initialize KV store client: {}", e);
                }
            }
        }

        limiter
    }

    pub async fn check(&self, key: &str) -> RateDecision {
        if let Some(remote) = &self.remote {
            match remote.check(key, self.max, self.window).await {
                Ok(decision) => return decision,
                Err(e) => {
                    tracing::warn!(
                        "Rate-limit store unavailable, using in-memory tracking: {}",
                        e
                    );
                }
            }
        }
        self.local.hit(key, self.max, self.window).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(600);

    #[test]
    fn test_step_opens_a_fresh_window() {
        let (state, decision) = step(None, 1_000, 5, WINDOW);
        assert!(decision.is_allowed());
        assert_eq!(state.count, 1);
        assert_eq!(state.reset_at_ms, 1_000 + 600_000);
    }

    #[test]
    fn test_step_denies_at_max_and_keeps_counter() {
        let full = WindowState {
            count: 5,
            reset_at_ms: 601_000,
        };
        let (state, decision) = step(Some(full), 1_000, 5, WINDOW);
        assert!(!decision.is_allowed());
        assert_eq!(state.count, 5);
        match decision {
            RateDecision::Limited { retry_after_secs } => assert_eq!(retry_after_secs, 600),
            RateDecision::Allowed => panic!("expected limit"),
        }
    }

    #[test]
    fn test_step_restarts_after_expiry() {
        let stale = WindowState {
            count: 5,
            reset_at_ms: 500,
        };
        let (state, decision) = step(Some(stale), 1_000, 5, WINDOW);
        assert!(decision.is_allowed());
        assert_eq!(state.count, 1);
    }

    #[tokio::test]
    async fn test_memory_store_enforces_window() {
        let store = MemoryStore::new();
        for _ in 0..5 {
            assert!(store.hit("ip:a", 5, WINDOW).await.is_allowed());
        }
        assert!(!store.hit("ip:a", 5, WINDOW).await.is_allowed());
        // Other keys are unaffected
        assert!(store.hit("ip:b", 5, WINDOW).await.is_allowed());
    }

    #[tokio::test]
    async fn test_memory_store_window_resets() {
        let store = MemoryStore::new();
        let window = Duration::from_millis(80);
        assert!(store.hit("ip:a", 1, window).await.is_allowed());
        assert!(!store.hit("ip:a", 1, window).await.is_allowed());

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(store.hit("ip:a", 1, window).await.is_allowed());
    }

    #[tokio::test]
    async fn test_limiter_without_remote_uses_local_tracking() {
        let limiter = RateLimiter::new(2, WINDOW);
        assert!(limiter.check("ip:a").await.is_allowed());
        assert!(limiter.check("ip:a").await.is_allowed());
        assert!(!limiter.check("ip:a").await.is_allowed());
    }
}

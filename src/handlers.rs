use crate::config::Config;
use crate::dispatch::{self, ChatService, EmailService};
use crate::errors::AppError;
use crate::models::{BookingConfig, ContactResponse, Inquiry};
use crate::rate_limit::{RateDecision, RateLimiter};
use crate::spam::SpamScanner;
use crate::validation::{self, MIN_TTS_SECONDS};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

/// Generic rejection shown for any schema violation; field detail stays in
/// the server log.
const VALIDATION_MESSAGE: &str = "Please double-check your details and try again.";
/// Honest rejection for suspiciously fast submits, so real users with
/// autofill can simply retry.
const TOO_FAST_MESSAGE: &str =
    "That was quick! Please take a moment to review your message and submit again.";
const RATE_LIMIT_MESSAGE: &str = "Too many requests. Please try again in a few minutes.";

/// Shared application state injected into handlers.
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Fixed-window limiter for the contact endpoint.
    pub rate_limiter: RateLimiter,
    /// Email dispatcher (optional, config-gated).
    pub email: Option<EmailService>,
    /// Chat dispatcher (optional, config-gated).
    pub chat: Option<ChatService>,
    /// Compiled content spam patterns.
    pub spam: SpamScanner,
}

impl AppState {
    /// Build the full state from configuration, initializing each optional
    /// integration and logging whether it is active.
    pub fn from_config(config: Config) -> Self {
        let email = match (&config.email_api_key, &config.contact_email) {
            (Some(api_key), Some(to)) => {
                match EmailService::new(
                    config.email_api_base.clone(),
                    api_key.clone(),
                    config.email_from.clone(),
                    to.clone(),
                ) {
                    Ok(service) => {
                        tracing::info!("Email dispatcher initialized -> {}", to);
                        Some(service)
                    }
                    Err(e) => {
                        tracing::error!("Failed to initialize email dispatcher: {}", e);
                        None
                    }
                }
            }
            _ => None,
        };

        let chat = match &config.chat_webhook_url {
            Some(url) => match ChatService::new(url.clone()) {
                Ok(service) => {
                    tracing::info!("Chat dispatcher initialized");
                    Some(service)
                }
                Err(e) => {
                    tracing::error!("Failed to initialize chat dispatcher: {}", e);
                    None
                }
            },
            None => None,
        };

        let rate_limiter = RateLimiter::from_config(&config);

        Self {
            config,
            rate_limiter,
            email,
            chat,
            spam: SpamScanner::new(),
        }
    }
}

/// The governed API routes, without state or middleware applied.
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/contact", post(submit_contact))
        .route("/api/config/booking", get(booking_config))
}

/// The complete route set with state applied and no middleware, as used by
/// the integration tests. `main` layers rate limiting, tracing, CORS and the
/// body limit on top.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(api_router())
        .with_state(state)
}

/// Health check endpoint.
///
/// Returns the service status, name, and version.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is healthy"))
)]
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "intake-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /api/config/booking
///
/// Tells the static frontend whether the booking page should render the
/// scheduler iframe embed or the plain contact form.
#[utoipa::path(
    get,
    path = "/api/config/booking",
    responses((status = 200, description = "Booking page configuration", body = BookingConfig))
)]
pub async fn booking_config(State(state): State<Arc<AppState>>) -> Json<BookingConfig> {
    let config = match &state.config.scheduler_embed_url {
        Some(url) => BookingConfig {
            mode: "embed".to_string(),
            embed_url: Some(url.clone()),
        },
        None => BookingConfig {
            mode: "form".to_string(),
            embed_url: None,
        },
    };
    Json(config)
}

/// POST /api/contact
///
/// Contact-form intake pipeline. Orchestration is strictly linear:
/// 1. Parse JSON body.
/// 2. Attribute the client (proxy headers, user agent).
/// 3. Rate-limit per client IP.
/// 4. Honeypot short-circuit on the raw body.
/// 5. Legacy minimal-payload short-circuit.
/// 6. Legacy field-name remap.
/// 7. Full schema validation.
/// 8. Metadata enrichment.
/// 9. Post-validation anti-spam checks.
/// 10. Concurrent dispatch to the configured channels.
/// 11. Success response, independent of dispatch outcomes.
///
/// Spam detections answer with the normal success body so automated senders
/// get no signal to iterate on.
#[utoipa::path(
    post,
    path = "/api/contact",
    request_body = crate::models::ContactSubmission,
    responses(
        (status = 200, description = "Inquiry accepted", body = ContactResponse),
        (status = 400, description = "Malformed or rejected submission", body = crate::errors::ErrorBody),
        (status = 429, description = "Rate limit exceeded", body = crate::errors::ErrorBody),
        (status = 500, description = "Unexpected failure", body = crate::errors::ErrorBody),
    )
)]
pub async fn submit_contact(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ContactResponse>, AppError> {
    // 1. Parse
    let raw: Value = serde_json::from_slice(&body).map_err(|e| {
        tracing::debug!("Unparseable contact payload: {}", e);
        AppError::BadRequest("Invalid JSON body".to_string())
    })?;

    // 2. Client attribution
    let client_ip = client_ip(&headers);
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    // 3. Rate limit
    let limit_key = format!("contact:{}", client_ip);
    if let RateDecision::Limited { retry_after_secs } = state.rate_limiter.check(&limit_key).await
    {
        tracing::info!(
            "Rate limit exceeded for {} (retry in {}s)",
            client_ip,
            retry_after_secs
        );
        return Err(AppError::RateLimited(RATE_LIMIT_MESSAGE.to_string()));
    }

    // 4. Honeypot on the raw body: malformed bot payloads short-circuit
    // before any schema work
    if raw
        .get("hp")
        .and_then(Value::as_str)
        .is_some_and(|hp| !hp.trim().is_empty())
    {
        tracing::info!("Honeypot tripped from {}; accepting without dispatch", client_ip);
        return Ok(Json(ContactResponse::accepted()));
    }

    // 5. Legacy minimal clients are acknowledged without dispatch. Kept
    // bug-for-bug compatible with the original form handler; the warn below
    // keeps these leads visible in the log.
    if validation::is_legacy_minimal(&raw) {
        let legacy = validation::validate_legacy_minimal(&raw).map_err(|errors| {
            log_field_errors(&client_ip, &errors);
            AppError::BadRequest(VALIDATION_MESSAGE.to_string())
        })?;
        tracing::warn!(
            "Legacy contact payload from {} <{}> accepted without dispatch",
            legacy.name,
            legacy.email
        );
        return Ok(Json(ContactResponse::accepted()));
    }

    // 6. Remap older field names onto the current schema
    let raw = if validation::needs_legacy_remap(&raw) {
        tracing::debug!("Remapping legacy field names from {}", client_ip);
        validation::remap_legacy(&raw)
    } else {
        raw
    };

    // 7. Full schema validation
    let submission = validation::validate(&raw).map_err(|errors| {
        log_field_errors(&client_ip, &errors);
        AppError::BadRequest(VALIDATION_MESSAGE.to_string())
    })?;

    // 8. Metadata enrichment
    let inquiry = Inquiry::new(submission, client_ip.clone(), user_agent);

    // 9. Post-validation anti-spam checks
    if !inquiry.submission.honeypot.trim().is_empty() {
        tracing::info!(
            "Honeypot set in validated payload from {}; accepting without dispatch",
            client_ip
        );
        return Ok(Json(ContactResponse::accepted()));
    }
    if inquiry.submission.time_to_submit < MIN_TTS_SECONDS {
        tracing::info!(
            "Submission from {} too fast ({}s)",
            client_ip,
            inquiry.submission.time_to_submit
        );
        return Err(AppError::BadRequest(TOO_FAST_MESSAGE.to_string()));
    }
    if let Some(rule) = state.spam.scan(&inquiry.submission) {
        tracing::info!(
            "Content spam ({}) from {}; accepting without dispatch",
            rule,
            client_ip
        );
        return Ok(Json(ContactResponse::accepted()));
    }

    // 10. Fan out to the configured channels and wait for both to settle
    let summary = dispatch::dispatch(state.email.as_ref(), state.chat.as_ref(), &inquiry).await;
    tracing::info!(
        "Inquiry {} from <{}> processed (email: {}, chat: {})",
        inquiry.short_ref(),
        inquiry.submission.email,
        summary.email.as_str(),
        summary.chat.as_str()
    );

    // 11. Success regardless of dispatch outcomes
    Ok(Json(ContactResponse::accepted()))
}

/// Client IP attribution from proxy headers, with a fallback default.
fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|ip| !ip.is_empty())
        })
        .unwrap_or("unknown")
        .to_string()
}

fn log_field_errors(client_ip: &str, errors: &[validation::FieldError]) {
    let detail: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    tracing::info!(
        "Contact validation failed from {}: {}",
        client_ip,
        detail.join("; ")
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_ip_prefers_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        assert_eq!(client_ip(&headers), "203.0.113.9");
    }

    #[test]
    fn test_client_ip_falls_back_to_real_ip_then_unknown() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        assert_eq!(client_ip(&headers), "10.0.0.2");

        assert_eq!(client_ip(&HeaderMap::new()), "unknown");
    }
}

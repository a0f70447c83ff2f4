#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// API key for the transactional email provider. Email dispatch is
    /// disabled when this or `contact_email` is absent.
    pub email_api_key: Option<String>,
    /// Destination address for inquiry notifications.
    pub contact_email: Option<String>,
    /// Sender identity for outgoing notification mail.
    pub email_from: String,
    /// Base URL of the email provider API. Overridable so tests can point it
    /// at a mock server.
    pub email_api_base: String,
    /// Incoming-webhook URL for chat notifications. Chat dispatch is disabled
    /// when absent.
    pub chat_webhook_url: Option<String>,
    /// REST endpoint of the shared rate-limit key-value store.
    pub kv_rest_url: Option<String>,
    /// Bearer token for the key-value store.
    pub kv_rest_token: Option<String>,
    /// Scheduler embed URL; switches the booking page from the simple form to
    /// an iframe embed.
    pub scheduler_embed_url: Option<String>,
    /// Max contact submissions per client IP within one window.
    pub contact_rate_limit_max: u32,
    /// Fixed-window length in seconds for the contact endpoint.
    pub contact_rate_limit_window_secs: u64,
}

const DEFAULT_EMAIL_API_BASE: &str = "https://api.resend.com";
const DEFAULT_EMAIL_FROM: &str = "Contact Form <onboarding@resend.dev>";

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            email_api_key: optional_var("RESEND_API_KEY"),
            contact_email: optional_var("CONTACT_EMAIL"),
            email_from: optional_var("EMAIL_FROM")
                .unwrap_or_else(|| DEFAULT_EMAIL_FROM.to_string()),
            email_api_base: match optional_var("EMAIL_API_BASE") {
                Some(raw) => check_url("EMAIL_API_BASE", &raw)?,
                None => DEFAULT_EMAIL_API_BASE.to_string(),
            },
            chat_webhook_url: optional_url("SLACK_WEBHOOK_URL")?,
            kv_rest_url: optional_url("KV_REST_URL")?,
            kv_rest_token: optional_var("KV_REST_TOKEN"),
            scheduler_embed_url: optional_url("SCHEDULER_EMBED_URL")?,
            contact_rate_limit_max: std::env::var("CONTACT_RATE_LIMIT_MAX")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .ok()
                .filter(|max| *max > 0)
                .ok_or_else(|| {
                    anyhow::anyhow!("CONTACT_RATE_LIMIT_MAX must be a positive number")
                })?,
            contact_rate_limit_window_secs: std::env::var("CONTACT_RATE_LIMIT_WINDOW_SECS")
                .unwrap_or_else(|_| "600".to_string())
                .parse()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    anyhow::anyhow!("CONTACT_RATE_LIMIT_WINDOW_SECS must be a positive number")
                })?,
        };

        // Log which integrations are active (without sensitive values)
        if config.email_api_key.is_some() && config.contact_email.is_some() {
            tracing::info!(
                "Email dispatch configured -> {}",
                config.contact_email.as_deref().unwrap_or_default()
            );
        } else {
            tracing::warn!("Email dispatch disabled (RESEND_API_KEY / CONTACT_EMAIL not set)");
        }
        if config.chat_webhook_url.is_some() {
            tracing::info!("Chat dispatch configured");
        } else {
            tracing::warn!("Chat dispatch disabled (SLACK_WEBHOOK_URL not set)");
        }
        match (&config.kv_rest_url, &config.kv_rest_token) {
            (Some(_), Some(_)) => tracing::info!("Shared rate-limit store configured"),
            (None, None) => {
                tracing::info!("Rate limiting uses per-instance in-memory tracking")
            }
            _ => tracing::warn!(
                "KV store partially configured (KV_REST_URL and KV_REST_TOKEN are both required); \
                 falling back to in-memory rate limiting"
            ),
        }
        if config.scheduler_embed_url.is_some() {
            tracing::info!("Booking page set to scheduler embed");
        }
        tracing::debug!("Server Port: {}", config.port);
        tracing::debug!(
            "Contact rate limit: {} requests / {}s",
            config.contact_rate_limit_max,
            config.contact_rate_limit_window_secs
        );

        Ok(config)
    }
}

/// Read an environment variable, treating blank values as absent.
fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

/// Read an optional environment variable that must be an http(s) URL when set.
fn optional_url(name: &str) -> anyhow::Result<Option<String>> {
    match optional_var(name) {
        Some(raw) => check_url(name, &raw).map(Some),
        None => Ok(None),
    }
}

fn check_url(name: &str, raw: &str) -> anyhow::Result<String> {
    let parsed = url::Url::parse(raw).map_err(|e| anyhow::anyhow!("{} is not a valid URL: {}", name, e))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        anyhow::bail!("{} must start with http:// or https://", name);
    }
    Ok(raw.to_string())
}

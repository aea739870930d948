use std::env;

use anyhow::Result;

use crate::broadcast::compose::ComposeSettings;
use crate::broadcast::personalize::LinkBuilder;

/// Sender used when MEGAPHONE_SENDER is not set.
pub const DEFAULT_SENDER: &str = "STUFF <hello@getstuff.city>";

/// Base URL for claim and referral deep links.
pub const DEFAULT_LINK_BASE: &str = "https://getstuff.city";

/// Central configuration loaded from environment variables.
///
/// All secrets come from env vars (never hardcoded). The .env file
/// is loaded automatically at startup via dotenvy.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    /// PostgreSQL connection URL (when set and starts with postgres://, uses Postgres backend)
    pub database_url: Option<String>,
    pub resend_api_key: String,
    /// Resend API root (defaults to https://api.resend.com)
    pub resend_api_url: String,
    /// The `From:` header on every outbound message.
    pub sender: String,
    pub link_base: String,
    /// Password for the admin dashboard (MEGAPHONE_ADMIN_PASSWORD env var)
    pub admin_password: String,
    /// Secret for HMAC session token signing (MEGAPHONE_SESSION_SECRET env var)
    pub session_secret: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Everything has a default or an empty fallback; `require_*` checks
    /// run at the point a command actually needs a value.
    pub fn load() -> Result<Self> {
        Ok(Self {
            db_path: env::var("MEGAPHONE_DB_PATH").unwrap_or_else(|_| "./megaphone.db".to_string()),
            database_url: env::var("DATABASE_URL").ok(),
            resend_api_key: env::var("RESEND_API_KEY").unwrap_or_default(),
            resend_api_url: env::var("RESEND_API_URL")
                .unwrap_or_else(|_| crate::dispatch::resend::DEFAULT_API_URL.to_string()),
            sender: env::var("MEGAPHONE_SENDER").unwrap_or_else(|_| DEFAULT_SENDER.to_string()),
            link_base: env::var("MEGAPHONE_LINK_BASE")
                .unwrap_or_else(|_| DEFAULT_LINK_BASE.to_string()),
            admin_password: env::var("MEGAPHONE_ADMIN_PASSWORD").unwrap_or_default(),
            session_secret: env::var("MEGAPHONE_SESSION_SECRET").unwrap_or_default(),
        })
    }

    /// Settings the composer needs: sender address and link base.
    pub fn compose_settings(&self) -> ComposeSettings {
        ComposeSettings {
            sender: self.sender.clone(),
            links: LinkBuilder::new(&self.link_base),
        }
    }

    /// Check that the Resend API key is configured.
    /// Call this before any real (non dry-run) send.
    pub fn require_resend(&self) -> Result<()> {
        if self.resend_api_key.is_empty() {
            anyhow::bail!(
                "RESEND_API_KEY not set. Add it to your .env file,\n\
                 or pass --dry-run to log messages instead of sending them."
            );
        }
        Ok(())
    }

    /// Check that the admin password and session secret are configured.
    /// The web server refuses to start without both.
    pub fn require_web(&self) -> Result<()> {
        if self.admin_password.is_empty() || self.session_secret.is_empty() {
            anyhow::bail!(
                "MEGAPHONE_ADMIN_PASSWORD and MEGAPHONE_SESSION_SECRET must both be set.\n\
                 See .env.example for the required variables."
            );
        }
        Ok(())
    }
}

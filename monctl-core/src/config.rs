use std::fmt;

use tracing::{debug, info};

/// Fallback site used when no URL is configured.
pub const DEFAULT_SITE_URL: &str = "https://mon.school/";

/// Connection settings for the LMS site.
#[derive(Clone, PartialEq, Eq)]
pub struct SiteConfig {
    /// Base URL without a trailing slash.
    pub site_url: String,
    pub api_key: String,
    pub api_secret: String,
}

impl SiteConfig {
    pub fn new(
        site_url: impl AsRef<str>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            site_url: site_url.as_ref().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    pub fn trace_loaded(&self) {
        info!(
            site_url = %self.site_url,
            api_key_set = !self.api_key.is_empty(),
            api_secret_set = !self.api_secret.is_empty(),
            "Loaded SiteConfig"
        );
        debug!(?self, "SiteConfig loaded (full debug)");
    }
}

// Secrets stay out of logs.
impl fmt::Debug for SiteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SiteConfig")
            .field("site_url", &self.site_url)
            .field("api_key", &"<redacted>")
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

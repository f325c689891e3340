//! `load_config` module: builds the [`SiteConfig`] used to reach the LMS site from the environment.
//!
//! # Responsibilities
//! - Read the site URL and API credentials from environment variables
//! - Apply the default site URL when none is given
//! - Fail with a message naming the missing variable, so the CLI can surface it as-is
//!
//! A `.env` file is loaded by `main` before this runs; this module only reads
//! the process environment.
//!
//! # Errors
//! All errors in this module use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::Result;
use monctl_core::config::{SiteConfig, DEFAULT_SITE_URL};
use std::env;
use tracing::{error, info};

pub const SITE_URL_VAR: &str = "MON_SCHOOL_URL";
pub const API_KEY_VAR: &str = "MON_SCHOOL_API_KEY";
pub const API_SECRET_VAR: &str = "MON_SCHOOL_API_SECRET";

/// Loads the site configuration from `MON_SCHOOL_URL`, `MON_SCHOOL_API_KEY`
/// and `MON_SCHOOL_API_SECRET`.
pub fn load_config() -> Result<SiteConfig> {
    info!("Loading site configuration from environment");
    let site_url = read_config_value(SITE_URL_VAR, Some(DEFAULT_SITE_URL))?;
    let api_key = read_config_value(API_KEY_VAR, None)?;
    let api_secret = read_config_value(API_SECRET_VAR, None)?;

    let config = SiteConfig::new(site_url, api_key, api_secret);
    config.trace_loaded();
    Ok(config)
}

/// Empty values count as unset.
fn read_config_value(name: &str, default: Option<&str>) -> Result<String> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => match default {
            Some(default) => {
                info!(var = name, default, "Environment variable not set, using default");
                Ok(default.to_string())
            }
            None => {
                error!(var = name, "Required environment variable not set");
                Err(anyhow::anyhow!("Please provide {name} environment variable"))
            }
        },
    }
}

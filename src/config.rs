//! Process configuration.
//!
//! Two kinds of settings live here:
//!
//! - [`SiteConfig`]: limits, session lifetime and CORS origins. Built once at
//!   startup and shared read-only.
//! - [`AdminSecrets`]: the admin password, the session signing secret and the
//!   cookie name. These are pulled from a [`SecretSource`] on every request so
//!   that rotating a secret and redeploying invalidates every issued session.
//!
//! # Example
//!
//! ```rust
//! use makerspace_admin::config::{SiteConfig, StaticSecretSource, SecretSource};
//!
//! let config = SiteConfig::default();
//! assert_eq!(config.rate_limit.login.max_requests(), 5);
//!
//! let secrets = StaticSecretSource::new("admin-pass", "a-signing-secret-of-32-characters").load();
//! assert!(secrets.is_configured());
//! ```

use chrono::Duration;

use crate::SecretString;
use crate::rate_limit::Limit;

/// Minimum length, in characters, of the session signing secret.
pub const MIN_SECRET_LENGTH: usize = 16;

/// Default name of the admin session cookie.
pub const DEFAULT_COOKIE_NAME: &str = "admin_session";

pub const ADMIN_PASSWORD_VAR: &str = "ADMIN_PASSWORD";
pub const SESSION_SECRET_VAR: &str = "ADMIN_SESSION_SECRET";
pub const COOKIE_NAME_VAR: &str = "ADMIN_COOKIE_NAME";
pub const APP_ENV_VAR: &str = "APP_ENV";
pub const ALLOWED_ORIGINS_VAR: &str = "SITE_ALLOWED_ORIGINS";

#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub rate_limit: RateLimitConfig,

    /// Lifetime of an admin session token and of its cookie.
    ///
    /// Default: 12 hours
    pub session_lifetime: Duration,

    /// Origins allowed to call the API with credentials. Empty means
    /// same-origin only.
    pub allowed_origins: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            rate_limit: RateLimitConfig::default(),
            session_lifetime: Duration::hours(12),
            allowed_origins: Vec::new(),
        }
    }
}

impl SiteConfig {
    /// Defaults plus `SITE_ALLOWED_ORIGINS` (comma separated).
    pub fn from_env() -> Self {
        let allowed_origins = std::env::var(ALLOWED_ORIGINS_VAR)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(ToOwned::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            allowed_origins,
            ..Self::default()
        }
    }
}

/// One limit per use-case; each gets its own limiter instance.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Default: 5 per 15 minutes
    pub login: Limit,
    /// Default: 120 per hour
    pub admin_api: Limit,
    /// Default: 10 per hour
    pub submissions: Limit,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            login: Limit::new(5, Duration::minutes(15)),
            admin_api: Limit::per_hour(120),
            submissions: Limit::per_hour(10),
        }
    }
}

/// Secrets and cookie settings as they are at this instant.
#[derive(Debug, Clone)]
pub struct AdminSecrets {
    pub admin_password: Option<SecretString>,
    pub session_secret: Option<SecretString>,
    pub cookie_name: String,
    /// Marks the session cookie `Secure`.
    pub production: bool,
}

impl AdminSecrets {
    /// True when both the password and a long-enough signing secret are set.
    pub fn is_configured(&self) -> bool {
        let has_password = self
            .admin_password
            .as_ref()
            .is_some_and(|password| !password.is_empty());
        has_password && self.has_usable_session_secret()
    }

    pub fn has_usable_session_secret(&self) -> bool {
        self.session_secret
            .as_ref()
            .is_some_and(|secret| secret.char_len() >= MIN_SECRET_LENGTH)
    }
}

/// Where [`AdminSecrets`] come from. Called once per request.
pub trait SecretSource: Send + Sync {
    fn load(&self) -> AdminSecrets;
}

/// Reads secrets from the process environment on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSecretSource;

impl SecretSource for EnvSecretSource {
    fn load(&self) -> AdminSecrets {
        let cookie_name = std::env::var(COOKIE_NAME_VAR)
            .ok()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_COOKIE_NAME.to_owned());

        let production = std::env::var(APP_ENV_VAR)
            .is_ok_and(|env| env.eq_ignore_ascii_case("production"));

        AdminSecrets {
            admin_password: SecretString::from_env(ADMIN_PASSWORD_VAR),
            session_secret: SecretString::from_env(SESSION_SECRET_VAR),
            cookie_name,
            production,
        }
    }
}

/// Fixed secrets, for tests and embedding.
#[derive(Debug, Clone)]
pub struct StaticSecretSource {
    secrets: AdminSecrets,
}

impl StaticSecretSource {
    pub fn new(admin_password: impl Into<String>, session_secret: impl Into<String>) -> Self {
        Self {
            secrets: AdminSecrets {
                admin_password: Some(SecretString::new(admin_password)),
                session_secret: Some(SecretString::new(session_secret)),
                cookie_name: DEFAULT_COOKIE_NAME.to_owned(),
                production: false,
            },
        }
    }

    /// A source with no secrets at all.
    pub fn unconfigured() -> Self {
        Self {
            secrets: AdminSecrets {
                admin_password: None,
                session_secret: None,
                cookie_name: DEFAULT_COOKIE_NAME.to_owned(),
                production: false,
            },
        }
    }

    #[must_use]
    pub fn production(mut self, production: bool) -> Self {
        self.secrets.production = production;
        self
    }

    #[must_use]
    pub fn cookie_name(mut self, name: impl Into<String>) -> Self {
        self.secrets.cookie_name = name.into();
        self
    }
}

impl SecretSource for StaticSecretSource {
    fn load(&self) -> AdminSecrets {
        self.secrets.clone()
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();

        assert_eq!(config.session_lifetime, Duration::hours(12));
        assert_eq!(config.rate_limit.login.max_requests(), 5);
        assert_eq!(config.rate_limit.login.window_secs(), 15 * 60);
        assert_eq!(config.rate_limit.admin_api.max_requests(), 120);
        assert_eq!(config.rate_limit.admin_api.window_secs(), 3600);
        assert_eq!(config.rate_limit.submissions.max_requests(), 10);
        assert!(config.allowed_origins.is_empty());
    }

    #[test]
    fn test_short_session_secret_is_not_configured() {
        let secrets = StaticSecretSource::new("pw", "fifteen-chars!!").load();
        assert!(!secrets.is_configured());

        let secrets = StaticSecretSource::new("pw", "sixteen-chars!!!").load();
        assert!(secrets.is_configured());
    }

    #[test]
    fn test_empty_password_is_not_configured() {
        let secrets = StaticSecretSource::new("", "a-signing-secret-of-32-characters").load();
        assert!(!secrets.is_configured());
        assert!(secrets.has_usable_session_secret());
    }

    #[test]
    fn test_unconfigured_source() {
        let secrets = StaticSecretSource::unconfigured().load();
        assert!(!secrets.is_configured());
        assert_eq!(secrets.cookie_name, DEFAULT_COOKIE_NAME);
    }

    #[test]
    #[serial]
    fn test_env_source_reads_at_call_time() {
        let source = EnvSecretSource;

        // SAFETY: serialised with the other env tests.
        unsafe {
            std::env::remove_var(ADMIN_PASSWORD_VAR);
            std::env::remove_var(SESSION_SECRET_VAR);
            std::env::remove_var(COOKIE_NAME_VAR);
            std::env::remove_var(APP_ENV_VAR);
        }
        assert!(!source.load().is_configured());

        unsafe {
            std::env::set_var(ADMIN_PASSWORD_VAR, "workshop-admin");
            std::env::set_var(SESSION_SECRET_VAR, "0123456789abcdef0123456789abcdef");
            std::env::set_var(APP_ENV_VAR, "Production");
        }
        let secrets = source.load();
        assert!(secrets.is_configured());
        assert!(secrets.production);
        assert_eq!(secrets.cookie_name, DEFAULT_COOKIE_NAME);

        unsafe {
            std::env::remove_var(ADMIN_PASSWORD_VAR);
            std::env::remove_var(SESSION_SECRET_VAR);
            std::env::remove_var(APP_ENV_VAR);
        }
    }

    #[test]
    #[serial]
    fn test_site_config_from_env_parses_origins() {
        unsafe {
            std::env::set_var(
                ALLOWED_ORIGINS_VAR,
                "https://makerspace.example, https://admin.makerspace.example,,",
            );
        }
        let config = SiteConfig::from_env();
        assert_eq!(
            config.allowed_origins,
            vec![
                "https://makerspace.example".to_owned(),
                "https://admin.makerspace.example".to_owned()
            ]
        );
        unsafe {
            std::env::remove_var(ALLOWED_ORIGINS_VAR);
        }
    }
}

//! Client Configuration
//!
//! Loads configuration from environment variables.

use std::env;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use natter_common::PasswordPolicy;

/// Default identity toolkit endpoint.
pub const DEFAULT_IDENTITY_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Default document store endpoint.
pub const DEFAULT_FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";

/// How profile images are keyed in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AvatarKeyStrategy {
    /// Key by the current display name. Accounts sharing a name share one object.
    #[default]
    DisplayName,
    /// Key by the immutable account ID.
    AccountId,
}

impl FromStr for AvatarKeyStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "display_name" | "display-name" => Ok(Self::DisplayName),
            "account_id" | "account-id" => Ok(Self::AccountId),
            other => bail!("unknown avatar key strategy: {other}"),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Profile image upload settings.
#[derive(Debug, Clone)]
pub struct AvatarSettings {
    /// Storage key derivation.
    pub key_strategy: AvatarKeyStrategy,
    /// Maximum image size in bytes (default: 5MB)
    pub max_size: usize,
}

impl Default for AvatarSettings {
    fn default() -> Self {
        Self {
            key_strategy: AvatarKeyStrategy::default(),
            max_size: 5 * 1024 * 1024,
        }
    }
}

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Identity service API key
    pub identity_api_key: String,

    /// Identity service base URL (override for emulators)
    pub identity_base_url: String,

    /// Document store project ID
    pub firestore_project_id: String,

    /// Document store base URL (override for emulators)
    pub firestore_base_url: String,

    /// S3-compatible storage endpoint
    pub s3_endpoint: Option<String>,

    /// S3 bucket name
    pub s3_bucket: String,

    /// S3 region
    pub s3_region: String,

    /// Public base URL objects are served from (optional)
    pub s3_public_url: Option<String>,

    /// Profile image settings
    pub avatar: AvatarSettings,

    /// Sign-up password policy
    pub password_policy: PasswordPolicy,

    /// Log output format
    pub log_format: LogFormat,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let defaults = PasswordPolicy::default();

        Ok(Self {
            identity_api_key: env::var("IDENTITY_API_KEY")
                .context("IDENTITY_API_KEY must be set")?,
            identity_base_url: env::var("IDENTITY_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_IDENTITY_BASE_URL.into()),
            firestore_project_id: env::var("FIRESTORE_PROJECT_ID")
                .context("FIRESTORE_PROJECT_ID must be set")?,
            firestore_base_url: env::var("FIRESTORE_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_FIRESTORE_BASE_URL.into()),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            s3_bucket: env::var("S3_BUCKET").unwrap_or_else(|_| "natter".into()),
            s3_region: env::var("S3_REGION")
                .or_else(|_| env::var("AWS_REGION"))
                .unwrap_or_else(|_| "us-east-1".into()),
            s3_public_url: env::var("S3_PUBLIC_URL").ok(),
            avatar: AvatarSettings {
                key_strategy: env::var("AVATAR_KEY_STRATEGY")
                    .ok()
                    .map(|v| v.parse::<AvatarKeyStrategy>())
                    .transpose()
                    .context("AVATAR_KEY_STRATEGY is invalid")?
                    .unwrap_or_default(),
                max_size: parse_or("MAX_AVATAR_SIZE", 5 * 1024 * 1024), // 5MB
            },
            password_policy: PasswordPolicy {
                min_length: parse_or("PASSWORD_MIN_LENGTH", defaults.min_length),
                max_length: parse_or("PASSWORD_MAX_LENGTH", defaults.max_length),
                require_letter: parse_or("PASSWORD_REQUIRE_LETTER", defaults.require_letter),
                require_digit: parse_or("PASSWORD_REQUIRE_DIGIT", defaults.require_digit),
            },
            log_format: match env::var("LOG_FORMAT").as_deref() {
                Ok("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        })
    }

    /// Create a configuration pointing at local emulators.
    ///
    /// - Identity: `http://localhost:9099/identitytoolkit.googleapis.com/v1`
    /// - Documents: `http://localhost:8085/v1`
    /// - Storage: `MinIO` on `http://localhost:9000`
    #[must_use]
    pub fn default_for_test() -> Self {
        Self {
            identity_api_key: "test-api-key".into(),
            identity_base_url: "http://localhost:9099/identitytoolkit.googleapis.com/v1".into(),
            firestore_project_id: "natter-test".into(),
            firestore_base_url: "http://localhost:8085/v1".into(),
            s3_endpoint: Some("http://localhost:9000".into()),
            s3_bucket: "natter-test".into(),
            s3_region: "us-east-1".into(),
            s3_public_url: None,
            avatar: AvatarSettings::default(),
            password_policy: PasswordPolicy::default(),
            log_format: LogFormat::Pretty,
        }
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

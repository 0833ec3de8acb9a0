//! HTTP client configuration
//!
//! Configuration is resolved with the following precedence:
//! 1. Environment variables (`FLUENT_HTTP_*`, highest priority)
//! 2. YAML config file, when one is given
//! 3. Built-in defaults (lowest priority)

use std::path::Path;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{HttpError, Result};

/// Default content type for request bodies
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Content type used for form bodies when none is set explicitly
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Decides which received status codes take the success path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuccessPolicy {
    /// Only `200 OK` is a success; `201`, `204` and the rest go to the error path
    #[default]
    ExactOk,
    /// Any `2xx` status is a success
    AnySuccess,
}

impl SuccessPolicy {
    /// Classify a received status code
    pub fn is_success(&self, status: StatusCode) -> bool {
        match self {
            SuccessPolicy::ExactOk => status == StatusCode::OK,
            SuccessPolicy::AnySuccess => status.is_success(),
        }
    }
}

impl std::str::FromStr for SuccessPolicy {
    type Err = HttpError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact_ok" | "exact-ok" | "200" => Ok(SuccessPolicy::ExactOk),
            "any_success" | "any-success" | "2xx" => Ok(SuccessPolicy::AnySuccess),
            other => Err(HttpError::Config(format!("Unknown success policy: {other}"))),
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Custom user agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP/HTTPS proxy URL
    #[serde(default)]
    pub proxy: Option<String>,

    /// Maximum redirects to follow (0 = no redirects)
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Content type for text and structured bodies
    #[serde(default = "default_content_type")]
    pub content_type: String,

    /// Prefix of the message attached to transport failures
    #[serde(default = "default_error_prefix")]
    pub error_prefix: String,

    /// Which statuses count as success
    #[serde(default)]
    pub success_policy: SuccessPolicy,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            proxy: None,
            max_redirects: default_max_redirects(),
            content_type: default_content_type(),
            error_prefix: default_error_prefix(),
            success_policy: SuccessPolicy::default(),
        }
    }
}

/// Shape of the YAML config file, `http:` section
#[derive(Debug, Default, Deserialize)]
struct HttpFileConfig {
    http: Option<HttpConfig>,
}

impl HttpConfig {
    /// Create a new HTTP config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Config that treats every `2xx` as success
    pub fn lenient() -> Self {
        Self {
            success_policy: SuccessPolicy::AnySuccess,
            ..Default::default()
        }
    }

    /// Resolve configuration from an optional YAML file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) if path.exists() => {
                debug!("Loading HTTP config from {:?}", path);
                Self::from_yaml_file(path)?
            }
            _ => Self::default(),
        };

        config.load_from_env();
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from YAML text
    ///
    /// The settings live under a top-level `http:` key; a missing section
    /// yields the defaults.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let file_config: HttpFileConfig = serde_yaml::from_str(content)
            .map_err(|e| HttpError::Config(format!("Failed to parse HTTP config: {e}")))?;
        Ok(file_config.http.unwrap_or_default())
    }

    /// Parse configuration from a YAML file
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| HttpError::Config(format!("Failed to read HTTP config file: {e}")))?;
        Self::from_yaml_str(&content)
    }

    /// Override fields from `FLUENT_HTTP_*` environment variables
    pub fn load_from_env(&mut self) {
        if let Ok(user_agent) = std::env::var("FLUENT_HTTP_USER_AGENT") {
            debug!("Loading FLUENT_HTTP_USER_AGENT from environment: {}", user_agent);
            self.user_agent = user_agent;
        }

        if let Ok(proxy) = std::env::var("FLUENT_HTTP_PROXY") {
            debug!("Loading FLUENT_HTTP_PROXY from environment: {}", proxy);
            self.proxy = Some(proxy);
        }

        if let Ok(redirects) = std::env::var("FLUENT_HTTP_MAX_REDIRECTS") {
            match redirects.parse::<usize>() {
                Ok(redirects) => self.max_redirects = redirects,
                Err(_) => warn!("Invalid FLUENT_HTTP_MAX_REDIRECTS value: {}", redirects),
            }
        }

        if let Ok(content_type) = std::env::var("FLUENT_HTTP_CONTENT_TYPE") {
            self.content_type = content_type;
        }

        if let Ok(prefix) = std::env::var("FLUENT_HTTP_ERROR_PREFIX") {
            self.error_prefix = prefix;
        }

        if let Ok(policy) = std::env::var("FLUENT_HTTP_SUCCESS_POLICY") {
            match policy.parse::<SuccessPolicy>() {
                Ok(policy) => self.success_policy = policy,
                Err(_) => warn!("Invalid FLUENT_HTTP_SUCCESS_POLICY value: {}", policy),
            }
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.content_type.trim().is_empty() {
            return Err(HttpError::Config("Content type cannot be empty".to_string()));
        }

        if reqwest::header::HeaderValue::from_str(&self.content_type).is_err() {
            return Err(HttpError::Config(format!(
                "Content type is not a valid header value: {}",
                self.content_type
            )));
        }

        if let Some(proxy) = &self.proxy {
            if !proxy.contains("://") {
                return Err(HttpError::Config(format!(
                    "Proxy URL must include a scheme: {proxy}"
                )));
            }
        }

        Ok(())
    }

    /// Set proxy URL
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Set user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set default body content type
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Set the transport-failure message prefix
    pub fn with_error_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.error_prefix = prefix.into();
        self
    }

    /// Set the success policy
    pub fn with_success_policy(mut self, policy: SuccessPolicy) -> Self {
        self.success_policy = policy;
        self
    }
}

// Default value functions for serde
fn default_user_agent() -> String {
    format!("fluent-http/{}", env!("CARGO_PKG_VERSION"))
}

fn default_max_redirects() -> usize {
    10
}

fn default_content_type() -> String {
    DEFAULT_CONTENT_TYPE.to_string()
}

fn default_error_prefix() -> String {
    "Error: ".to_string()
}

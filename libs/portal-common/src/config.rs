// Client configuration, read from the environment

const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Connection settings for the portal API.
///
/// The request deadline bounds every gateway call; an expired deadline
/// settles the call as a transport failure instead of leaving the
/// workbench busy forever.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub api_url: String,
    pub request_timeout_ms: u64,
}

impl PortalConfig {
    pub fn from_env() -> Self {
        let api_url = std::env::var("PORTAL_API_URL")
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let request_timeout_ms = std::env::var("PORTAL_REQUEST_TIMEOUT_MS")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS);

        Self {
            api_url,
            request_timeout_ms,
        }
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PortalConfig::default();
        assert_eq!(config.api_url, "http://127.0.0.1:5000");
        assert_eq!(config.request_timeout_ms, 30_000);
    }
}

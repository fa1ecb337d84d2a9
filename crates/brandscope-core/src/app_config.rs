use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Server-side configuration: where to listen and how to reach the model.
#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub anthropic_api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub upstream_url: String,
    pub upstream_timeout_secs: u64,
    /// Advisory prompt budget; exceeding it is logged, not enforced.
    pub token_budget: usize,
    pub max_platforms: usize,
    pub max_body_bytes: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("anthropic_api_key", &"[redacted]")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("upstream_url", &self.upstream_url)
            .field("upstream_timeout_secs", &self.upstream_timeout_secs)
            .field("token_budget", &self.token_budget)
            .field("max_platforms", &self.max_platforms)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}

/// Client-side configuration used by the CLI and any embedding UI.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_url: String,
    pub report_sink_url: Option<String>,
    pub request_timeout_secs: u64,
    pub token_budget: usize,
}

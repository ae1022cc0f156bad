use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Base URL without credentials (http://ip:port)
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ProxyConfig {
    /// Full proxy URI including credentials, as handed to `reqwest::Proxy`.
    pub fn endpoint(&self) -> String {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => {
                let host_port = self
                    .url
                    .trim_start_matches("http://")
                    .trim_start_matches("https://");
                format!("http://{}:{}@{}", user, pass, host_port)
            }
            _ => self.url.clone(),
        }
    }

    /// `ip:port` only. Safe to log.
    pub fn host(&self) -> &str {
        self.url
            .trim_start_matches("http://")
            .trim_start_matches("https://")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    pub name: String,
    pub rpc_endpoint: String,
    pub explorer_url: String,
}

impl ChainConfig {
    /// Explorer page for an account, `{address}` in the template is substituted.
    pub fn explorer_link(&self, address: &str) -> String {
        self.explorer_url.replace("{address}", address)
    }
}

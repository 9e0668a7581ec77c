use std::time::Duration;

pub struct Config {
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            timeout: parse_duration_env("UFETCH_TIMEOUT"),
            user_agent: std::env::var("UFETCH_UA").unwrap_or_else(|_| "ufetch/0.2".to_string()),
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn parse_duration_env(key: &str) -> Option<Duration> {
    std::env::var(key).ok().and_then(|v| {
        let v = v.trim();
        if let Some(s) = v.strip_suffix("ms") {
            s.parse::<u64>().ok().map(Duration::from_millis)
        } else if let Some(s) = v.strip_suffix('s') {
            s.parse::<u64>().ok().map(Duration::from_secs)
        } else {
            v.parse::<u64>().ok().map(Duration::from_secs)
        }
    })
}

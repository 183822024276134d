//! robots.txt policy
//!
//! Parsing and matching are done by `texting_robots`: the group naming this
//! crawler's product token wins over `*`, the longest matching rule decides
//! and `*`/`$` patterns are supported. A robots.txt that is missing,
//! unreachable or unparsable allows everything.

use std::collections::HashMap;
use std::sync::Arc;
use texting_robots::Robot;
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

/// Parsed robots.txt rules for one user agent
pub struct RobotsRules {
    robot: Option<Robot>,
}

impl RobotsRules {
    /// Rules that allow everything (missing or unreadable robots.txt)
    pub fn allow_all() -> Self {
        Self { robot: None }
    }

    /// Parse the body of a robots.txt file for `user_agent`
    pub fn parse(user_agent: &str, body: &str) -> Self {
        match Robot::new(&product_token(user_agent), body.as_bytes()) {
            Ok(robot) => Self { robot: Some(robot) },
            Err(e) => {
                debug!(error = %e, "unparsable robots.txt, allowing all");
                Self::allow_all()
            }
        }
    }

    /// Check whether `url` may be fetched
    pub fn is_allowed(&self, url: &Url) -> bool {
        self.robot
            .as_ref()
            .map(|robot| robot.allowed(url.as_str()))
            .unwrap_or(true)
    }
}

/// Product name of a User-Agent string ("Nexlify/1.0 (+url)" -> "nexlify")
fn product_token(user_agent: &str) -> String {
    user_agent
        .split(|c: char| c == '/' || c.is_whitespace())
        .next()
        .unwrap_or("")
        .to_ascii_lowercase()
}

/// Per-origin cache of robots.txt rules for one user agent
pub struct RobotsCache {
    user_agent: String,
    entries: RwLock<HashMap<String, Arc<RobotsRules>>>,
}

impl RobotsCache {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Check `url` against its origin's robots.txt, fetching it on first use
    pub async fn is_allowed(&self, client: &reqwest::Client, url: &Url) -> bool {
        self.rules_for(client, url).await.is_allowed(url)
    }

    async fn rules_for(&self, client: &reqwest::Client, url: &Url) -> Arc<RobotsRules> {
        let origin = url.origin().ascii_serialization();

        if let Some(rules) = self.entries.read().await.get(&origin) {
            return rules.clone();
        }

        let rules = Arc::new(fetch_rules(client, &origin, &self.user_agent).await);
        self.entries
            .write()
            .await
            .entry(origin)
            .or_insert(rules)
            .clone()
    }
}

async fn fetch_rules(client: &reqwest::Client, origin: &str, user_agent: &str) -> RobotsRules {
    let robots_url = format!("{origin}/robots.txt");

    let response = match client.get(&robots_url).send().await {
        Ok(response) => response,
        Err(e) => {
            debug!(url = %robots_url, error = %e, "robots.txt unavailable, allowing all");
            return RobotsRules::allow_all();
        }
    };

    if !response.status().is_success() {
        debug!(url = %robots_url, status = response.status().as_u16(), "no robots.txt, allowing all");
        return RobotsRules::allow_all();
    }

    match response.text().await {
        Ok(body) => RobotsRules::parse(user_agent, &body),
        Err(e) => {
            debug!(url = %robots_url, error = %e, "failed to read robots.txt, allowing all");
            RobotsRules::allow_all()
        }
    }
}

//! robots.txt fetching and evaluation.
//!
//! Fetch failure is permissive: a site whose robots.txt cannot be retrieved
//! is crawled as if it allowed everything.

use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::error::{EngineError, Result};

/// Parsed robots.txt rules for one user agent.
#[derive(Debug, Clone, Default)]
pub struct RobotsPolicy {
    allow: Vec<String>,
    disallow: Vec<String>,
    crawl_delay: Option<f32>,
}

impl RobotsPolicy {
    /// Permissive policy used when robots.txt is missing or unreachable.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Whether a path may be fetched. When both an allow and a disallow
    /// pattern match, the longer pattern wins (allow on ties).
    pub fn is_allowed(&self, path: &str) -> bool {
        let disallow = longest_match(&self.disallow, path);
        let allow = longest_match(&self.allow, path);
        match (allow, disallow) {
            (Some(a), Some(d)) => a >= d,
            (None, Some(_)) => false,
            _ => true,
        }
    }

    /// Crawl-delay directive, if the site declared one.
    pub fn crawl_delay(&self) -> Option<f32> {
        self.crawl_delay
    }
}

fn longest_match(patterns: &[String], path: &str) -> Option<usize> {
    patterns
        .iter()
        .filter(|p| pattern_matches(p, path))
        .map(|p| p.len())
        .max()
}

/// Prefix matching per the robots.txt convention, with trailing `*` and `$`.
fn pattern_matches(pattern: &str, path: &str) -> bool {
    if pattern.is_empty() {
        return false;
    }
    if let Some(prefix) = pattern.strip_suffix('*') {
        return path.starts_with(prefix);
    }
    if let Some(exact) = pattern.strip_suffix('$') {
        return path == exact;
    }
    path.starts_with(pattern)
}

/// Parse a robots.txt body, keeping the groups addressed to `user_agent`
/// (matched case-insensitively by product-token prefix) or to `*`.
pub fn parse_policy(body: &str, user_agent: &str) -> RobotsPolicy {
    let mut policy = RobotsPolicy::default();
    let token = user_agent
        .split('/')
        .next()
        .unwrap_or(user_agent)
        .to_lowercase();
    let mut group_applies = false;
    let mut saw_any_group = false;

    for line in body.lines() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_lowercase();
        let value = value.trim();

        match key.as_str() {
            "user-agent" => {
                let agent = value.to_lowercase();
                group_applies = agent == "*" || agent == token;
                if group_applies {
                    saw_any_group = true;
                }
            }
            "allow" if group_applies || !saw_any_group => {
                if !value.is_empty() {
                    policy.allow.push(value.to_string());
                }
            }
            "disallow" if group_applies || !saw_any_group => {
                if !value.is_empty() {
                    policy.disallow.push(value.to_string());
                }
            }
            "crawl-delay" if group_applies || !saw_any_group => {
                if let Ok(delay) = value.parse::<f32>() {
                    policy.crawl_delay = Some(delay);
                }
            }
            _ => {}
        }
    }

    policy
}

/// Fetch and parse robots.txt for the seed's origin. Any failure (network,
/// non-2xx status, body read) degrades to the permissive policy.
pub async fn fetch_policy(client: &Client, seed: &Url, user_agent: &str) -> RobotsPolicy {
    match try_fetch_policy(client, seed, user_agent).await {
        Ok(policy) => policy,
        Err(e) => {
            debug!(%seed, error = %e, "allowing all");
            RobotsPolicy::allow_all()
        }
    }
}

async fn try_fetch_policy(
    client: &Client,
    seed: &Url,
    user_agent: &str,
) -> Result<RobotsPolicy> {
    let robots_url = seed
        .join("/robots.txt")
        .map_err(|e| EngineError::Robots(format!("deriving url: {e}")))?;

    let response = client
        .get(robots_url.clone())
        .header(reqwest::header::USER_AGENT, user_agent)
        .send()
        .await
        .map_err(|e| EngineError::Robots(e.to_string()))?;

    if !response.status().is_success() {
        return Err(EngineError::Robots(format!(
            "{robots_url} returned {}",
            response.status()
        )));
    }

    let body = response
        .text()
        .await
        .map_err(|e| EngineError::Robots(format!("reading body: {e}")))?;
    Ok(parse_policy(&body, user_agent))
}

//! Bounded breadth-first crawl of a single site.
//!
//! The frontier is strictly FIFO and the loop strictly sequential: one page
//! rendered at a time through an exclusively owned renderer. Page failures
//! are retried with backoff and then skipped; only a renderer failure aborts
//! the job.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::CrawlLimits;
use crate::crawl::robots::RobotsPolicy;
use crate::error::{EngineError, Result};
use crate::extraction::{ExtractedPage, PageExtractor};
use crate::renderer::Renderer;
use crate::retry::{with_retry, RetryPolicy};
use crate::types::PageRecord;

/// Breadth-first crawler over one site, bounded by page count, depth, and an
/// optional wall-clock budget.
pub struct Frontier<'a> {
    renderer: &'a dyn Renderer,
    limits: &'a CrawlLimits,
    robots: RobotsPolicy,
    extractor: PageExtractor,
}

impl<'a> Frontier<'a> {
    pub fn new(
        renderer: &'a dyn Renderer,
        limits: &'a CrawlLimits,
        robots: RobotsPolicy,
        extractor: PageExtractor,
    ) -> Self {
        Self {
            renderer,
            limits,
            robots,
            extractor,
        }
    }

    /// Crawl from the seed, breadth-first, and return the extracted pages.
    ///
    /// Returns `Err` only when the renderer itself is unavailable. A budget
    /// expiry returns whatever was collected so far.
    pub async fn crawl(&self, seed: &Url) -> Result<Vec<PageRecord>> {
        let deadline = self.limits.job_budget.map(|b| Instant::now() + b);
        let mut queue: VecDeque<(Url, u32)> = VecDeque::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut pages: Vec<PageRecord> = Vec::new();

        queue.push_back((seed.clone(), 0));

        while let Some((url, depth)) = queue.pop_front() {
            if pages.len() >= self.limits.max_pages {
                break;
            }
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    warn!(
                        collected = pages.len(),
                        remaining = queue.len(),
                        "job budget exhausted, abandoning frontier"
                    );
                    break;
                }
            }
            if depth > self.limits.max_depth {
                continue;
            }

            let key = normalized_key(&url);
            if !visited.insert(key) {
                continue;
            }

            if !self.robots.is_allowed(url.path()) {
                debug!(%url, "skipping robots-disallowed path");
                continue;
            }

            if !pages.is_empty() {
                tokio::time::sleep(self.politeness_delay()).await;
            }

            let policy = RetryPolicy::new(self.limits.max_retries, self.limits.retry_base_delay);
            let rendered = with_retry(policy, "render page", || {
                self.render_one(&url, depth)
            })
            .await;

            let extracted = match rendered {
                Ok(extracted) => extracted,
                Err(EngineError::Renderer(reason)) => {
                    return Err(EngineError::Renderer(reason));
                }
                Err(e) => {
                    warn!(%url, depth, error = %e, "page skipped after retries");
                    continue;
                }
            };

            info!(%url, depth, images = extracted.record.images.len(), "page extracted");

            if depth < self.limits.max_depth {
                for link in &extracted.links {
                    if let Some(next) = same_host_link(link, seed) {
                        if !visited.contains(&normalized_key(&next)) {
                            queue.push_back((next, depth + 1));
                        }
                    }
                }
            }

            pages.push(extracted.record);
        }

        Ok(pages)
    }

    async fn render_one(&self, url: &Url, depth: u32) -> Result<ExtractedPage> {
        let mut context = self.renderer.new_context().await?;

        let nav = match context
            .navigate(url.as_str(), self.limits.page_timeout)
            .await
        {
            Ok(nav) => nav,
            Err(e) => {
                context.close().await.ok();
                return Err(e);
            }
        };

        // Record the page under its post-redirect URL when it parses.
        let final_url = Url::parse(&nav.final_url).unwrap_or_else(|_| url.clone());
        let extracted = self.extractor.extract_page(context.as_ref(), &final_url, depth).await;

        context.close().await.ok();
        Ok(extracted)
    }

    /// Configured politeness delay, raised to the site's crawl-delay if that
    /// is longer.
    fn politeness_delay(&self) -> Duration {
        let configured = self.limits.request_delay;
        match self.robots.crawl_delay() {
            Some(secs) if secs > 0.0 => configured.max(Duration::from_secs_f32(secs)),
            _ => configured,
        }
    }
}

/// Normalized visited-set key: absolute URL without fragment.
fn normalized_key(url: &Url) -> String {
    let mut u = url.clone();
    u.set_fragment(None);
    u.to_string()
}

/// Parse an outbound link and keep it only when it is an http(s) URL on the
/// seed's hostname. Anything else (including unparseable links) is discarded
/// silently.
fn same_host_link(link: &str, seed: &Url) -> Option<Url> {
    let mut url = Url::parse(link).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    if url.host_str() != seed.host_str() {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl::robots::parse_policy;
    use crate::renderer::{ExtractorId, NavigationResult, RenderContext};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Stub site: URL -> content-extractor payload, with a visit log.
    struct StubRenderer {
        pages: Arc<HashMap<String, Value>>,
        visits: Arc<Mutex<Vec<String>>>,
    }

    struct StubContext {
        pages: Arc<HashMap<String, Value>>,
        visits: Arc<Mutex<Vec<String>>>,
        current: Option<String>,
    }

    #[async_trait]
    impl Renderer for StubRenderer {
        async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
            Ok(Box::new(StubContext {
                pages: self.pages.clone(),
                visits: self.visits.clone(),
                current: None,
            }))
        }
    }

    #[async_trait]
    impl RenderContext for StubContext {
        async fn navigate(&mut self, url: &str, _timeout: Duration) -> Result<NavigationResult> {
            self.visits.lock().unwrap().push(url.to_string());
            if !self.pages.contains_key(url) {
                return Err(EngineError::PageLoad {
                    url: url.to_string(),
                    reason: "no such page".to_string(),
                });
            }
            self.current = Some(url.to_string());
            Ok(NavigationResult {
                final_url: url.to_string(),
                load_time_ms: 1,
            })
        }

        async fn extract(&self, extractor: ExtractorId) -> Result<Value> {
            match extractor {
                ExtractorId::Content => {
                    let url = self.current.as_deref().unwrap_or_default();
                    Ok(self.pages.get(url).cloned().unwrap_or_else(|| json!({})))
                }
                _ => Ok(json!({})),
            }
        }

        async fn screenshot(&self) -> Result<Vec<u8>> {
            Err(EngineError::Extraction("no screenshots in stub".to_string()))
        }

        async fn close(self: Box<Self>) -> Result<()> {
            Ok(())
        }
    }

    fn page(title: &str, links: &[&str]) -> Value {
        json!({
            "title": title,
            "bodyText": format!("body of {title}"),
            "links": links,
        })
    }

    fn fast_limits() -> CrawlLimits {
        CrawlLimits {
            request_delay: Duration::ZERO,
            retry_base_delay: Duration::from_millis(1),
            ..CrawlLimits::default()
        }
    }

    fn site(entries: &[(&str, Value)]) -> (StubRenderer, Arc<Mutex<Vec<String>>>) {
        let pages: HashMap<String, Value> = entries
            .iter()
            .map(|(url, v)| (url.to_string(), v.clone()))
            .collect();
        let visits = Arc::new(Mutex::new(Vec::new()));
        (
            StubRenderer {
                pages: Arc::new(pages),
                visits: visits.clone(),
            },
            visits,
        )
    }

    #[tokio::test]
    async fn test_page_cap_respected() {
        let (renderer, _) = site(&[
            (
                "https://acme.test/",
                page(
                    "Home",
                    &[
                        "https://acme.test/a",
                        "https://acme.test/b",
                        "https://acme.test/c",
                    ],
                ),
            ),
            ("https://acme.test/a", page("A", &[])),
            ("https://acme.test/b", page("B", &[])),
            ("https://acme.test/c", page("C", &[])),
        ]);
        let mut limits = fast_limits();
        limits.max_pages = 2;

        let frontier = Frontier::new(
            &renderer,
            &limits,
            RobotsPolicy::allow_all(),
            PageExtractor::new(None),
        );
        let seed = Url::parse("https://acme.test/").unwrap();
        let pages = frontier.crawl(&seed).await.unwrap();
        assert_eq!(pages.len(), 2);
        assert!(pages.iter().all(|p| p.depth <= limits.max_depth));
    }

    #[tokio::test]
    async fn test_depth_cap_stops_expansion() {
        let (renderer, visits) = site(&[
            ("https://acme.test/", page("Home", &["https://acme.test/a"])),
            ("https://acme.test/a", page("A", &["https://acme.test/b"])),
            ("https://acme.test/b", page("B", &[])),
        ]);
        let mut limits = fast_limits();
        limits.max_depth = 1;
        limits.max_pages = 10;

        let frontier = Frontier::new(
            &renderer,
            &limits,
            RobotsPolicy::allow_all(),
            PageExtractor::new(None),
        );
        let seed = Url::parse("https://acme.test/").unwrap();
        let pages = frontier.crawl(&seed).await.unwrap();

        assert_eq!(pages.len(), 2);
        let visited = visits.lock().unwrap();
        assert!(!visited.contains(&"https://acme.test/b".to_string()));
    }

    #[tokio::test]
    async fn test_external_hosts_never_enqueued() {
        let (renderer, visits) = site(&[
            (
                "https://acme.test/",
                page(
                    "Home",
                    &[
                        "https://other.test/elsewhere",
                        "mailto:hi@acme.test",
                        "not a url",
                        "https://acme.test/a#section",
                    ],
                ),
            ),
            ("https://acme.test/a", page("A", &[])),
        ]);
        let limits = fast_limits();

        let frontier = Frontier::new(
            &renderer,
            &limits,
            RobotsPolicy::allow_all(),
            PageExtractor::new(None),
        );
        let seed = Url::parse("https://acme.test/").unwrap();
        let pages = frontier.crawl(&seed).await.unwrap();

        assert_eq!(pages.len(), 2);
        let visited = visits.lock().unwrap();
        assert!(visited.iter().all(|u| u.starts_with("https://acme.test/")));
    }

    #[tokio::test]
    async fn test_robots_disallowed_paths_not_fetched() {
        let (renderer, visits) = site(&[
            (
                "https://acme.test/",
                page(
                    "Home",
                    &["https://acme.test/private/page", "https://acme.test/about"],
                ),
            ),
            ("https://acme.test/private/page", page("Secret", &[])),
            ("https://acme.test/about", page("About", &[])),
        ]);
        let limits = fast_limits();
        let robots = parse_policy("User-agent: *\nDisallow: /private/\n", "brandprobe");

        let frontier = Frontier::new(&renderer, &limits, robots, PageExtractor::new(None));
        let seed = Url::parse("https://acme.test/").unwrap();
        let pages = frontier.crawl(&seed).await.unwrap();

        assert_eq!(pages.len(), 2);
        assert!(pages.iter().all(|p| !p.url.contains("/private/")));
        let visited = visits.lock().unwrap();
        assert!(!visited.iter().any(|u| u.contains("/private/")));
    }

    #[tokio::test]
    async fn test_failed_page_is_skipped_not_fatal() {
        let (renderer, visits) = site(&[
            (
                "https://acme.test/",
                page("Home", &["https://acme.test/gone", "https://acme.test/a"]),
            ),
            ("https://acme.test/a", page("A", &[])),
        ]);
        let limits = fast_limits();

        let frontier = Frontier::new(
            &renderer,
            &limits,
            RobotsPolicy::allow_all(),
            PageExtractor::new(None),
        );
        let seed = Url::parse("https://acme.test/").unwrap();
        let pages = frontier.crawl(&seed).await.unwrap();

        assert_eq!(pages.len(), 2);
        // The missing page was attempted max_retries times, then skipped.
        let attempts = visits
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.ends_with("/gone"))
            .count();
        assert_eq!(attempts, limits.max_retries as usize);
    }

    #[tokio::test]
    async fn test_expired_budget_abandons_frontier() {
        let (renderer, visits) = site(&[("https://acme.test/", page("Home", &[]))]);
        let mut limits = fast_limits();
        limits.job_budget = Some(Duration::ZERO);

        let frontier = Frontier::new(
            &renderer,
            &limits,
            RobotsPolicy::allow_all(),
            PageExtractor::new(None),
        );
        let seed = Url::parse("https://acme.test/").unwrap();
        let pages = frontier.crawl(&seed).await.unwrap();

        assert!(pages.is_empty());
        assert!(visits.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_links_visited_once() {
        let (renderer, visits) = site(&[
            (
                "https://acme.test/",
                page(
                    "Home",
                    &[
                        "https://acme.test/a",
                        "https://acme.test/a",
                        "https://acme.test/a#pricing",
                    ],
                ),
            ),
            ("https://acme.test/a", page("A", &[])),
        ]);
        let limits = fast_limits();

        let frontier = Frontier::new(
            &renderer,
            &limits,
            RobotsPolicy::allow_all(),
            PageExtractor::new(None),
        );
        let seed = Url::parse("https://acme.test/").unwrap();
        let pages = frontier.crawl(&seed).await.unwrap();

        assert_eq!(pages.len(), 2);
        let attempts = visits
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.ends_with("/a"))
            .count();
        assert_eq!(attempts, 1);
    }
}

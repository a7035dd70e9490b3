//! One ingestion cycle: listing discovery, per-item extraction, dedup and
//! persistence. Strictly sequential with a politeness delay between article
//! fetches; a single candidate failing never aborts the batch, a listing
//! fetch failure aborts the whole cycle with zero new items.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, NaiveDateTime, Utc};
use scraper::{Html, Selector};
use tracing::{debug, info, warn};

use nb_core::{NewsItem, NewsStore, PageFetcher, ProcessingState, Result};

use crate::clean::clean_content;
use crate::datetime::{recover_datetime, within_window};
use crate::dedup::{already_exists, fingerprint, insert_if_new};
use crate::extract::extract_article;

/// Listing links with visible text at or under this length are chrome.
const MIN_TITLE_CHARS: usize = 15;
/// Known non-article link labels on the listing page.
const NON_ARTICLE_PREFIXES: &[&str] = &["לחץ כאן", "אל לובי"];
/// A candidate href must look like a thread link.
const ARTICLE_HREF_MARKERS: &[&str] = &["dcboard.cgi", "forum"];

#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub base_url: String,
    pub listing_url: String,
    /// Candidates older than this are discarded before any content fetch.
    pub freshness_window: Duration,
    /// Politeness pause between successive article fetches.
    pub fetch_delay: StdDuration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            base_url: "https://rotter.net".to_string(),
            listing_url: "https://rotter.net/forum/listforum.php".to_string(),
            freshness_window: Duration::hours(24),
            fetch_delay: StdDuration::from_millis(300),
        }
    }
}

/// Outcome of one cycle. Skips are counted, not errors.
#[derive(Debug, Default)]
pub struct IngestReport {
    /// Newly persisted items, most recent first; items without a recovered
    /// timestamp sort last.
    pub items: Vec<NewsItem>,
    pub discovered: usize,
    pub skipped_stale: usize,
    pub skipped_existing: usize,
    pub skipped_empty: usize,
    pub failed: usize,
}

/// A listing link that passed the title/href filters and the freshness
/// window, not yet confirmed new.
#[derive(Debug, Clone)]
struct Candidate {
    title: String,
    url: String,
    published_at: NaiveDateTime,
}

struct ListingScan {
    candidates: Vec<Candidate>,
    seen: usize,
    stale: usize,
}

fn parse_listing(
    html: &str,
    base_url: &str,
    now: NaiveDateTime,
    window: Duration,
) -> ListingScan {
    let document = Html::parse_document(html);
    let row_selector = Selector::parse("tr").expect("static selector");
    let link_selector = Selector::parse("a[href]").expect("static selector");

    let mut scan = ListingScan {
        candidates: Vec::new(),
        seen: 0,
        stale: 0,
    };

    for row in document.select(&row_selector) {
        let row_text = row.text().collect::<Vec<_>>().join("\n");
        for link in row.select(&link_selector) {
            let title = link.text().collect::<String>().trim().to_string();
            let Some(href) = link.value().attr("href") else {
                continue;
            };
            if title.chars().count() <= MIN_TITLE_CHARS
                || NON_ARTICLE_PREFIXES.iter().any(|p| title.starts_with(p))
                || !ARTICLE_HREF_MARKERS.iter().any(|m| href.contains(m))
            {
                continue;
            }
            scan.seen += 1;

            let published_at = match recover_datetime(&row_text, now) {
                Ok(dt) => dt,
                Err(_) => {
                    debug!(title = %title, "no timestamp in listing row, skipping");
                    continue;
                }
            };
            if !within_window(now, published_at, window) {
                debug!(title = %title, %published_at, "outside freshness window");
                scan.stale += 1;
                continue;
            }

            let url = if href.starts_with("http") {
                href.to_string()
            } else {
                format!("{}{}", base_url, href)
            };
            scan.candidates.push(Candidate {
                title,
                url,
                published_at,
            });
        }
    }

    scan
}

pub struct IngestCoordinator {
    fetcher: Arc<dyn PageFetcher>,
    store: Arc<dyn NewsStore>,
    config: IngestConfig,
}

impl IngestCoordinator {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        store: Arc<dyn NewsStore>,
        config: IngestConfig,
    ) -> Self {
        Self {
            fetcher,
            store,
            config,
        }
    }

    /// Run one full ingestion cycle against the listing page. `now` is the
    /// caller's wall clock; passing it in keeps the freshness decisions
    /// deterministic and free of process-wide state.
    pub async fn run_cycle(&self, now: NaiveDateTime) -> Result<IngestReport> {
        info!(url = %self.config.listing_url, "fetching forum listing");
        let listing_html = self.fetcher.fetch(&self.config.listing_url).await?;

        let scan = parse_listing(
            &listing_html,
            &self.config.base_url,
            now,
            self.config.freshness_window,
        );
        info!(
            seen = scan.seen,
            fresh = scan.candidates.len(),
            stale = scan.stale,
            "listing scanned"
        );

        let mut report = IngestReport {
            discovered: scan.seen,
            skipped_stale: scan.stale,
            ..IngestReport::default()
        };

        let total = scan.candidates.len();
        for (index, candidate) in scan.candidates.into_iter().enumerate() {
            if already_exists(self.store.as_ref(), &candidate.title, &candidate.url).await? {
                debug!(title = %candidate.title, "already stored, skipping");
                report.skipped_existing += 1;
                continue;
            }

            match self.ingest_candidate(&candidate, now).await {
                Ok(Some(item)) => report.items.push(item),
                Ok(None) => report.skipped_empty += 1,
                Err(e) if e.is_conflict() => report.skipped_existing += 1,
                Err(e) => {
                    warn!(url = %candidate.url, error = %e, "candidate failed, skipping");
                    report.failed += 1;
                }
            }

            if index + 1 < total && !self.config.fetch_delay.is_zero() {
                tokio::time::sleep(self.config.fetch_delay).await;
            }
        }

        report.items.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        Ok(report)
    }

    /// Fetch, extract, clean and persist one candidate. `Ok(None)` means no
    /// content was recovered; a dedup race at insert time surfaces as a
    /// conflict and is counted by the caller as existing.
    async fn ingest_candidate(
        &self,
        candidate: &Candidate,
        now: NaiveDateTime,
    ) -> Result<Option<NewsItem>> {
        let html = self.fetcher.fetch(&candidate.url).await?;
        let (raw_content, page_published) = {
            let document = Html::parse_document(&html);
            extract_article(&document, now)
        };

        if raw_content.is_empty() {
            debug!(url = %candidate.url, "no content recovered");
            return Ok(None);
        }

        let clean = clean_content(&raw_content);
        // The article page's own timestamp wins over the listing row's.
        let published_at = page_published.unwrap_or(candidate.published_at);

        let mut item = NewsItem {
            id: None,
            title: candidate.title.clone(),
            url: candidate.url.clone(),
            fingerprint: fingerprint(&candidate.title, &candidate.url),
            discovered_at: Utc::now(),
            published_at: Some(published_at),
            raw_content,
            clean_content: clean,
            state: ProcessingState::Unprocessed,
            analysis: None,
        };

        match insert_if_new(self.store.as_ref(), &item).await? {
            Some(id) => {
                info!(id, title = %item.title, "stored new item");
                item.id = Some(id);
                Ok(Some(item))
            }
            None => Err(nb_core::Error::Conflict(item.url.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    use nb_core::Error;
    use nb_storage::MemoryStore;

    struct MockFetcher {
        pages: HashMap<String, String>,
    }

    #[async_trait]
    impl PageFetcher for MockFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| Error::Fetch(format!("no page for {}", url)))
        }
    }

    const LISTING_URL: &str = "https://rotter.net/forum/listforum.php";
    const ARTICLE_PATH: &str = "/forum/dcboard.cgi?az=read_count&om=1";
    const TITLE: &str = "דיווח חדש על מבצע צבאי נרחב";
    const PARAGRAPH: &str =
        "ראש הממשלה הציג הערב את עיקרי התוכנית המדינית החדשה בפני חברי הקבינט המצומצם";

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn listing_page(row_datetime: &str) -> String {
        format!(
            r#"<html><body><table>
            <tr><td><a href="{href}">{title}</a></td><td>{dt}</td></tr>
            <tr><td><a href="/forum/dcboard.cgi?az=lobby">לחץ כאן לכניסה</a></td><td>{dt}</td></tr>
            </table></body></html>"#,
            href = ARTICLE_PATH,
            title = TITLE,
            dt = row_datetime
        )
    }

    fn article_page() -> String {
        format!(
            r#"<html><body><div class="content"><p>{p}</p><p>{p}</p><p>{p}</p><p>{p}</p></div></body></html>"#,
            p = PARAGRAPH
        )
    }

    fn test_config() -> IngestConfig {
        IngestConfig {
            fetch_delay: StdDuration::ZERO,
            ..IngestConfig::default()
        }
    }

    fn coordinator_with(
        listing: String,
        store: Arc<dyn NewsStore>,
    ) -> IngestCoordinator {
        let mut pages = HashMap::new();
        pages.insert(LISTING_URL.to_string(), listing);
        pages.insert(
            format!("https://rotter.net{}", ARTICLE_PATH),
            article_page(),
        );
        IngestCoordinator::new(
            Arc::new(MockFetcher { pages }),
            store,
            test_config(),
        )
    }

    #[tokio::test]
    async fn test_fresh_candidate_is_persisted_unprocessed() {
        let store: Arc<dyn NewsStore> = Arc::new(MemoryStore::new());
        // Row timestamp two hours before `now`.
        let coordinator = coordinator_with(listing_page("15.06.25 10:00"), store.clone());

        let report = coordinator.run_cycle(noon()).await.unwrap();
        assert_eq!(report.items.len(), 1);
        assert_eq!(report.skipped_stale, 0);

        let item = &report.items[0];
        assert_eq!(item.title, TITLE);
        assert_eq!(item.state, ProcessingState::Unprocessed);
        assert!(item.raw_content.chars().count() > 200);
        assert!(!item.clean_content.is_empty());
        assert_eq!(
            item.published_at,
            Some(
                NaiveDate::from_ymd_opt(2025, 6, 15)
                    .unwrap()
                    .and_hms_opt(10, 0, 0)
                    .unwrap()
            )
        );

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.unprocessed, 1);
    }

    #[tokio::test]
    async fn test_stale_candidate_discarded_before_fetch() {
        let store: Arc<dyn NewsStore> = Arc::new(MemoryStore::new());
        // Thirty hours old. The article page is reachable, but a stale
        // candidate must be dropped before any fetch is attempted.
        let coordinator = coordinator_with(listing_page("14.06.25 06:00"), store.clone());

        let report = coordinator.run_cycle(noon()).await.unwrap();
        assert!(report.items.is_empty());
        assert_eq!(report.skipped_stale, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(store.stats().await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn test_second_cycle_skips_existing() {
        let store: Arc<dyn NewsStore> = Arc::new(MemoryStore::new());
        let coordinator = coordinator_with(listing_page("15.06.25 10:00"), store.clone());

        let first = coordinator.run_cycle(noon()).await.unwrap();
        assert_eq!(first.items.len(), 1);

        let second = coordinator.run_cycle(noon()).await.unwrap();
        assert!(second.items.is_empty());
        assert_eq!(second.skipped_existing, 1);
        assert_eq!(store.stats().await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn test_listing_fetch_failure_aborts_cycle() {
        let store: Arc<dyn NewsStore> = Arc::new(MemoryStore::new());
        let coordinator = IngestCoordinator::new(
            Arc::new(MockFetcher {
                pages: HashMap::new(),
            }),
            store.clone(),
            test_config(),
        );

        assert!(coordinator.run_cycle(noon()).await.is_err());
        assert_eq!(store.stats().await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn test_article_fetch_failure_is_isolated() {
        let store: Arc<dyn NewsStore> = Arc::new(MemoryStore::new());
        // Listing names an article the fetcher cannot serve.
        let mut pages = HashMap::new();
        pages.insert(LISTING_URL.to_string(), listing_page("15.06.25 10:00"));
        let coordinator = IngestCoordinator::new(
            Arc::new(MockFetcher { pages }),
            store.clone(),
            test_config(),
        );

        let report = coordinator.run_cycle(noon()).await.unwrap();
        assert!(report.items.is_empty());
        assert_eq!(report.failed, 1);
    }

    #[test]
    fn test_listing_filters_non_article_labels() {
        let scan = parse_listing(
            &listing_page("15.06.25 10:00"),
            "https://rotter.net",
            noon(),
            Duration::hours(24),
        );
        // The "לחץ כאן" link is filtered out before any counting.
        assert_eq!(scan.candidates.len(), 1);
        assert_eq!(scan.candidates[0].title, TITLE);
    }

    #[test]
    fn test_batch_sorted_newest_first() {
        let listing = r#"<html><body><table>
            <tr><td><a href="/forum/dcboard.cgi?om=1">כותרת ראשונה עם מספיק תווים בה</a></td><td>15.06.25 08:00</td></tr>
            <tr><td><a href="/forum/dcboard.cgi?om=2">כותרת שניה עם מספיק תווים גם כן</a></td><td>15.06.25 11:00</td></tr>
            </table></body></html>"#;
        let scan = parse_listing(listing, "https://rotter.net", noon(), Duration::hours(24));
        assert_eq!(scan.candidates.len(), 2);

        let mut items: Vec<NewsItem> = scan
            .candidates
            .iter()
            .map(|c| NewsItem {
                id: None,
                title: c.title.clone(),
                url: c.url.clone(),
                fingerprint: fingerprint(&c.title, &c.url),
                discovered_at: Utc::now(),
                published_at: Some(c.published_at),
                raw_content: String::new(),
                clean_content: String::new(),
                state: ProcessingState::Unprocessed,
                analysis: None,
            })
            .collect();
        items.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        assert!(items[0].published_at > items[1].published_at);
    }
}

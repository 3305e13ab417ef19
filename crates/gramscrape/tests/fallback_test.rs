//! Fallback controller behaviour with scripted strategies.
//!
//! No network: each strategy returns a canned harvest and counts its calls.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use gramscrape::{
    AcquisitionError, Harvest, PacingConfig, Post, ScrapeError, Scraper, ScraperConfig, Session,
    Strategy,
};

// ─────────────────────── helpers ───────────────────────

struct Scripted {
    name: &'static str,
    produce: usize,
    failure: Option<AcquisitionError>,
    calls: Arc<AtomicUsize>,
}

impl Scripted {
    fn new(name: &'static str, produce: usize) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let strategy = Self {
            name,
            produce,
            failure: None,
            calls: calls.clone(),
        };
        (strategy, calls)
    }

    fn failing(name: &'static str, failure: AcquisitionError) -> (Self, Arc<AtomicUsize>) {
        let (mut strategy, calls) = Self::new(name, 0);
        strategy.failure = Some(failure);
        (strategy, calls)
    }
}

#[async_trait]
impl Strategy for Scripted {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch(&self, _session: &mut Session, username: &str, _limit: usize) -> Harvest {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let posts = (0..self.produce)
            .map(|i| post(self.name, i, username))
            .collect();
        Harvest::new(posts, self.failure.clone())
    }
}

fn post(source: &str, i: usize, username: &str) -> Post {
    Post {
        url: format!("https://www.instagram.com/p/{source}{i}/"),
        text: String::new(),
        title: String::new(),
        likes: "0".into(),
        comments: "0".into(),
        hashtags: Vec::new(),
        timestamp: "1970-01-01T00:00:00Z".into(),
        username: username.into(),
    }
}

fn scraper(strategies: Vec<Box<dyn Strategy>>) -> Scraper {
    let config = ScraperConfig::default().with_pacing(PacingConfig::disabled());
    Scraper::with_strategies(config, strategies)
}

// ─────────────────────── priority ───────────────────────

#[tokio::test]
async fn test_first_productive_strategy_wins() {
    let (a, a_calls) = Scripted::new("a", 3);
    let (b, b_calls) = Scripted::new("b", 5);
    let (c, c_calls) = Scripted::new("c", 5);
    let mut s = scraper(vec![Box::new(a), Box::new(b), Box::new(c)]);

    let posts = s.get_posts("nasa", 5).await.unwrap();

    assert_eq!(posts.len(), 3);
    assert!(posts.iter().all(|p| p.url.contains("/p/a")));
    assert_eq!(a_calls.load(Ordering::SeqCst), 1);
    assert_eq!(b_calls.load(Ordering::SeqCst), 0);
    assert_eq!(c_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_falls_through_empty_strategies_in_order() {
    let (a, a_calls) = Scripted::failing("a", AcquisitionError::Status(401));
    let (b, b_calls) = Scripted::new("b", 0);
    let (c, c_calls) = Scripted::new("c", 2);
    let mut s = scraper(vec![Box::new(a), Box::new(b), Box::new(c)]);

    let posts = s.get_posts("nasa", 5).await.unwrap();

    assert_eq!(posts.len(), 2);
    assert!(posts.iter().all(|p| p.url.contains("/p/c")));
    assert_eq!(a_calls.load(Ordering::SeqCst), 1);
    assert_eq!(b_calls.load(Ordering::SeqCst), 1);
    assert_eq!(c_calls.load(Ordering::SeqCst), 1);

    let report = s.last_report();
    assert_eq!(report.len(), 3);
    assert_eq!(report[0].failure, Some(AcquisitionError::Status(401)));
    assert_eq!(report[1].failure, None);
    assert_eq!(report[1].posts, 0);
    assert_eq!(report[2].posts, 2);
}

#[tokio::test]
async fn test_partial_harvest_with_failure_still_wins() {
    let (a, _) = Scripted::new("a", 0);
    let (mut b, _) = Scripted::new("b", 2);
    b.failure = Some(AcquisitionError::Timeout);
    let (c, c_calls) = Scripted::new("c", 10);
    let mut s = scraper(vec![Box::new(a), Box::new(b), Box::new(c)]);

    let posts = s.get_posts("nasa", 10).await.unwrap();

    assert_eq!(posts.len(), 2);
    assert_eq!(c_calls.load(Ordering::SeqCst), 0);
    assert_eq!(s.last_report()[1].failure, Some(AcquisitionError::Timeout));
}

// ─────────────────────── limits and failure ───────────────────────

#[tokio::test]
async fn test_result_truncated_to_limit() {
    let (a, _) = Scripted::new("a", 40);
    let mut s = scraper(vec![Box::new(a)]);

    let posts = s.get_posts("nasa", 7).await.unwrap();
    assert_eq!(posts.len(), 7);
    assert_eq!(posts[6].url, "https://www.instagram.com/p/a6/");
}

#[tokio::test]
async fn test_all_empty_is_exhausted() {
    let (a, a_calls) = Scripted::failing("a", AcquisitionError::ProfileUnresolved);
    let (b, b_calls) = Scripted::failing("b", AcquisitionError::Malformed("x".into()));
    let (c, c_calls) = Scripted::new("c", 0);
    let mut s = scraper(vec![Box::new(a), Box::new(b), Box::new(c)]);

    let err = s.get_posts("nasa", 5).await.unwrap_err();

    assert_eq!(err, ScrapeError::Exhausted);
    for calls in [a_calls, b_calls, c_calls] {
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
    assert_eq!(s.last_report().len(), 3);
}

#[tokio::test]
async fn test_username_normalized_before_strategies() {
    let (a, _) = Scripted::new("a", 1);
    let mut s = scraper(vec![Box::new(a)]);

    let posts = s.get_posts("  @nasa ", 1).await.unwrap();
    assert_eq!(posts[0].username, "nasa");
}

#[tokio::test]
async fn test_invalid_request_skips_strategies() {
    let (a, a_calls) = Scripted::new("a", 1);
    let mut s = scraper(vec![Box::new(a)]);

    assert!(matches!(
        s.get_posts("nasa", 0).await,
        Err(ScrapeError::InvalidRequest(_))
    ));
    assert!(matches!(
        s.get_posts("", 5).await,
        Err(ScrapeError::InvalidRequest(_))
    ));
    assert_eq!(a_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_report_reset_between_calls() {
    let (a, _) = Scripted::new("a", 0);
    let (b, _) = Scripted::new("b", 1);
    let mut s = scraper(vec![Box::new(a), Box::new(b)]);

    s.get_posts("nasa", 5).await.unwrap();
    s.get_posts("esa", 5).await.unwrap();

    let report = s.last_report();
    assert_eq!(report.len(), 2);
    assert_eq!(report[1].strategy, "b");
}

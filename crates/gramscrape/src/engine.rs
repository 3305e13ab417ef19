//! Fallback controller and the engine's public entry point.

use crate::config::{ConfigError, ScraperConfig};
use crate::session::Session;
use crate::strategy::{default_strategies, Harvest, Strategy};
use crate::types::{AcquisitionError, Post, ScrapeError, ScrapeResult};

/// Outcome of one strategy during the most recent [`Scraper::get_posts`].
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptSummary {
    pub strategy: &'static str,
    pub posts: usize,
    pub failure: Option<AcquisitionError>,
}

/// The acquisition engine.
///
/// One instance owns one request identity. `get_posts` takes `&mut self`;
/// callers that scrape concurrently need one instance each.
pub struct Scraper {
    session: Session,
    strategies: Vec<Box<dyn Strategy>>,
    last_report: Vec<AttemptSummary>,
}

impl Scraper {
    /// Engine with the built-in strategies.
    pub fn new(config: ScraperConfig) -> Self {
        Self::with_strategies(config, default_strategies())
    }

    /// Engine configured from `GRAMSCRAPE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(ScraperConfig::from_env()?))
    }

    /// Engine with a custom strategy list, tried in the given order.
    pub fn with_strategies(config: ScraperConfig, strategies: Vec<Box<dyn Strategy>>) -> Self {
        Self::with_session(Session::new(config), strategies)
    }

    pub fn with_session(session: Session, strategies: Vec<Box<dyn Strategy>>) -> Self {
        Self {
            session,
            strategies,
            last_report: Vec::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Per-strategy outcomes of the last `get_posts` call.
    pub fn last_report(&self) -> &[AttemptSummary] {
        &self.last_report
    }

    /// Fetch up to `limit` recent posts for `username`.
    ///
    /// Strategies run in priority order and the first one that yields any
    /// post wins; results are never merged. When none yields anything the
    /// call fails with [`ScrapeError::Exhausted`].
    pub async fn get_posts(&mut self, username: &str, limit: usize) -> ScrapeResult<Vec<Post>> {
        let username = username.trim().trim_start_matches('@');
        if username.is_empty() {
            return Err(ScrapeError::InvalidRequest("username is empty".into()));
        }
        if !is_valid_username(username) {
            return Err(ScrapeError::InvalidRequest(format!(
                "username {username:?} is not a valid profile name"
            )));
        }
        if limit == 0 {
            return Err(ScrapeError::InvalidRequest("limit must be at least 1".into()));
        }

        tracing::info!("Scraping data for @{username}");
        self.last_report.clear();

        for strategy in &self.strategies {
            let Harvest { mut posts, stopped_by } =
                strategy.fetch(&mut self.session, username, limit).await;

            if let Some(e) = &stopped_by {
                tracing::warn!(
                    strategy = strategy.name(),
                    transport = e.is_transport(),
                    "Strategy stopped early with {} posts: {e}",
                    posts.len()
                );
            }
            self.last_report.push(AttemptSummary {
                strategy: strategy.name(),
                posts: posts.len(),
                failure: stopped_by,
            });

            if !posts.is_empty() {
                posts.truncate(limit);
                tracing::info!(
                    strategy = strategy.name(),
                    "Retrieved {} posts for @{username}",
                    posts.len()
                );
                return Ok(posts);
            }
        }

        tracing::error!("Scraping failed for @{username}");
        Err(ScrapeError::Exhausted)
    }
}

/// Profile names are 1-30 characters of ASCII letters, digits, `.` and `_`.
pub fn is_valid_username(username: &str) -> bool {
    (1..=USERNAME_MAX_CHARS).contains(&username.len())
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_')
}

const USERNAME_MAX_CHARS: usize = 30;

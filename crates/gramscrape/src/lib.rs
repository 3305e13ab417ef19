//! gramscrape: multi-strategy acquisition engine for recent posts on
//! public Instagram profiles.
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut scraper = gramscrape::Scraper::from_env()?;
//! for post in scraper.get_posts("nasa", 5).await? {
//!     println!("{} {}", post.url, post.title);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod embedded;
pub mod engine;
pub mod http_client;
pub mod identity;
pub mod normalize;
pub mod pacing;
pub mod resolver;
pub mod session;
pub mod strategy;
pub mod types;

pub use config::{ConfigError, PacingConfig, ScraperConfig};
pub use embedded::{extract_embedded_data, EmbeddedShape};
pub use engine::{AttemptSummary, Scraper};
pub use identity::RequestIdentity;
pub use normalize::normalize;
pub use session::Session;
pub use strategy::{Harvest, Strategy};
pub use types::*;

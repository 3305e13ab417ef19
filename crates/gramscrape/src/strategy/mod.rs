//! Acquisition strategies.
//!
//! Each strategy is one self-contained way of getting a profile's recent
//! posts. They share the [`Strategy`] trait, the timeline envelope reader
//! and the cursor-following loop in [`paginate_feed`].

pub mod embedded;
pub mod feed;
pub mod public_profile;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::normalize::normalize;
use crate::pacing::CallKind;
use crate::session::Session;
use crate::types::{AcquisitionError, AcquisitionResult, PaginationCursor, Post};

pub use embedded::EmbeddedPageStrategy;
pub use feed::FeedQueryStrategy;
pub use public_profile::PublicProfileStrategy;

/// What one strategy attempt produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Harvest {
    /// Normalized posts, in provider order.
    pub posts: Vec<Post>,
    /// Why the attempt ended early, if it did.
    pub stopped_by: Option<AcquisitionError>,
}

impl Harvest {
    pub fn new(posts: Vec<Post>, stopped_by: Option<AcquisitionError>) -> Self {
        Self { posts, stopped_by }
    }

    pub fn failed(err: AcquisitionError) -> Self {
        Self {
            posts: Vec::new(),
            stopped_by: Some(err),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

/// A pluggable retrieval method.
///
/// Implementations never return errors: a failed request or parse step
/// ends the attempt and whatever was collected so far is handed back,
/// with the failure recorded in [`Harvest::stopped_by`].
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Short stable name for logs and reports.
    fn name(&self) -> &'static str;

    /// Collect up to `limit` posts for `username`.
    async fn fetch(&self, session: &mut Session, username: &str, limit: usize) -> Harvest;
}

/// The built-in strategies in priority order.
pub fn default_strategies() -> Vec<Box<dyn Strategy>> {
    vec![
        Box::new(FeedQueryStrategy),
        Box::new(EmbeddedPageStrategy),
        Box::new(PublicProfileStrategy),
    ]
}

/// One page of a user's timeline.
#[derive(Debug)]
pub struct TimelinePage<'a> {
    pub nodes: Vec<&'a Value>,
    pub cursor: PaginationCursor,
}

/// The `data.user` object of a JSON API envelope.
pub fn user_from_envelope(data: &Value) -> AcquisitionResult<&Value> {
    data.get("data")
        .and_then(|d| d.get("user"))
        .filter(|u| u.is_object())
        .ok_or_else(|| AcquisitionError::Malformed("response has no data.user".into()))
}

/// Read `edge_owner_to_timeline_media` from a user object.
///
/// Edges without a node, or with an empty one, are skipped.
pub fn read_timeline(user: &Value) -> AcquisitionResult<TimelinePage<'_>> {
    let media = user
        .get("edge_owner_to_timeline_media")
        .filter(|m| m.is_object())
        .ok_or_else(|| AcquisitionError::Malformed("user has no timeline media".into()))?;

    let nodes = media
        .get("edges")
        .and_then(|e| e.as_array())
        .map(|edges| {
            edges
                .iter()
                .filter_map(|edge| edge.get("node"))
                .filter(|node| node.as_object().is_some_and(|m| !m.is_empty()))
                .collect()
        })
        .unwrap_or_default();

    Ok(TimelinePage {
        nodes,
        cursor: PaginationCursor::from_page_info(media.get("page_info")),
    })
}

/// Normalize nodes into `posts` until it holds `limit` entries.
pub fn collect_nodes(posts: &mut Vec<Post>, nodes: &[&Value], fallback_username: &str, limit: usize) {
    for node in nodes {
        if posts.len() >= limit {
            break;
        }
        posts.push(normalize(node, fallback_username));
    }
}

/// Parameters of a timeline feed query.
#[derive(Debug, Clone)]
pub struct FeedQuery {
    pub query_hash: String,
    pub user_id: String,
    /// Value of the `first` variable on every page.
    pub page_size: usize,
    /// Call class of the first request; later pages use `next_kind`.
    pub first_kind: CallKind,
    pub next_kind: CallKind,
}

impl FeedQuery {
    /// The `variables` query parameter for one page.
    pub fn variables(&self, after: Option<&str>) -> String {
        json!({
            "id": self.user_id,
            "first": self.page_size,
            "after": after,
        })
        .to_string()
    }
}

/// Follow feed-query cursors, appending normalized posts to `posts`.
///
/// Starts at `start` (`None` for the first page) and stops once `posts`
/// holds `limit` entries, the provider reports no further page, or a step
/// fails. Returns the failure, if any.
pub async fn paginate_feed(
    session: &mut Session,
    query: &FeedQuery,
    start: Option<String>,
    fallback_username: &str,
    limit: usize,
    posts: &mut Vec<Post>,
) -> Option<AcquisitionError> {
    let url = match session.endpoint("/graphql/query/") {
        Ok(url) => url,
        Err(e) => return Some(e),
    };

    let mut cursor = start;
    let mut kind = if cursor.is_some() {
        query.next_kind
    } else {
        query.first_kind
    };
    let mut pages = 0usize;

    while posts.len() < limit {
        let variables = query.variables(cursor.as_deref());
        let resp = match session
            .get(
                kind,
                &url,
                &[
                    ("query_hash", query.query_hash.as_str()),
                    ("variables", variables.as_str()),
                ],
                &[],
            )
            .await
        {
            Ok(resp) => resp,
            Err(e) => return Some(e),
        };
        pages += 1;

        let data = match resp.json() {
            Ok(data) => data,
            Err(e) => return Some(e),
        };
        let next = match user_from_envelope(&data).and_then(|user| read_timeline(user)) {
            Ok(page) => {
                collect_nodes(posts, &page.nodes, fallback_username, limit);
                page.cursor.next().map(|c| c.to_string())
            }
            Err(e) => return Some(e),
        };

        tracing::debug!("Feed page {pages}: {} posts so far", posts.len());

        match next {
            Some(next) if cursor.as_deref() == Some(next.as_str()) => {
                return Some(AcquisitionError::Malformed(
                    "pagination cursor did not advance".into(),
                ));
            }
            Some(next) => cursor = Some(next),
            None => break,
        }
        kind = query.next_kind;
    }

    None
}

//! Feed-query strategy: the timeline query endpoint, keyed by identifier.

use async_trait::async_trait;

use super::{paginate_feed, FeedQuery, Harvest, Strategy};
use crate::pacing::CallKind;
use crate::resolver;
use crate::session::Session;
use crate::types::AcquisitionError;

/// Resolves the profile identifier, then pages through the timeline feed
/// query until `limit` posts are collected or the cursor runs out.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedQueryStrategy;

#[async_trait]
impl Strategy for FeedQueryStrategy {
    fn name(&self) -> &'static str {
        "feed_query"
    }

    async fn fetch(&self, session: &mut Session, username: &str, limit: usize) -> Harvest {
        let Some(user_id) = resolver::resolve(session, username).await else {
            return Harvest::failed(AcquisitionError::ProfileUnresolved);
        };

        let query = FeedQuery {
            query_hash: session.config().feed_query_hash.clone(),
            user_id,
            page_size: limit.min(session.config().max_page_size),
            first_kind: CallKind::FeedFirstPage,
            next_kind: CallKind::FeedNextPage,
        };

        let mut posts = Vec::new();
        let stopped_by = paginate_feed(session, &query, None, username, limit, &mut posts).await;
        Harvest::new(posts, stopped_by)
    }
}

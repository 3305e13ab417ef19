//! Public-profile strategy: the lighter `web_profile_info` endpoint.

use async_trait::async_trait;

use super::{collect_nodes, paginate_feed, read_timeline, user_from_envelope, FeedQuery, Harvest, Strategy};
use crate::pacing::CallKind;
use crate::resolver::identifier_of;
use crate::session::Session;
use crate::types::AcquisitionResult;

/// Reads the first page from the public profile endpoint. When more posts
/// are wanted and the payload carries a cursor, continues with the feed
/// query keyed by the identifier from the same payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct PublicProfileStrategy;

#[async_trait]
impl Strategy for PublicProfileStrategy {
    fn name(&self) -> &'static str {
        "public_profile"
    }

    async fn fetch(&self, session: &mut Session, username: &str, limit: usize) -> Harvest {
        let data = match fetch_profile_info(session, username).await {
            Ok(data) => data,
            Err(e) => return Harvest::failed(e),
        };

        let mut posts = Vec::new();
        let (cursor, user_id) = match user_from_envelope(&data).and_then(|user| {
            let page = read_timeline(user)?;
            collect_nodes(&mut posts, &page.nodes, username, limit);
            Ok((page.cursor.next().map(|c| c.to_string()), identifier_of(user)))
        }) {
            Ok(found) => found,
            Err(e) => return Harvest::failed(e),
        };

        if posts.len() >= limit {
            return Harvest::new(posts, None);
        }
        let (Some(cursor), Some(user_id)) = (cursor, user_id) else {
            return Harvest::new(posts, None);
        };

        tracing::debug!(
            "Public profile gave {} of {limit} posts for @{username}, continuing from cursor",
            posts.len()
        );

        let query = FeedQuery {
            query_hash: session.config().continuation_query_hash.clone(),
            user_id,
            page_size: (limit - posts.len()).min(session.config().max_page_size),
            first_kind: CallKind::Continuation,
            next_kind: CallKind::Continuation,
        };
        // Continuation nodes take their username from the payload's owner field.
        let stopped_by = paginate_feed(session, &query, Some(cursor), "", limit, &mut posts).await;
        Harvest::new(posts, stopped_by)
    }
}

async fn fetch_profile_info(session: &mut Session, username: &str) -> AcquisitionResult<serde_json::Value> {
    let url = session.endpoint("/api/v1/users/web_profile_info/")?;
    let headers = session.app_headers();
    let resp = session
        .get(
            CallKind::PublicProfile,
            &url,
            &[("username", username)],
            &headers,
        )
        .await?;
    resp.json()
}

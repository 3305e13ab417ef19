//! Embedded-page-data strategy: posts inlined in the profile page markup.

use async_trait::async_trait;

use super::{collect_nodes, read_timeline, Harvest, Strategy};
use crate::embedded::{extract_embedded_data, find_user_container};
use crate::pacing::CallKind;
use crate::session::Session;
use crate::types::{AcquisitionError, AcquisitionResult, Post};

/// Reads the single page of posts the profile page ships with. No
/// pagination: the embedded blob carries no usable cursor.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedPageStrategy;

#[async_trait]
impl Strategy for EmbeddedPageStrategy {
    fn name(&self) -> &'static str {
        "embedded_page"
    }

    async fn fetch(&self, session: &mut Session, username: &str, limit: usize) -> Harvest {
        let markup = match fetch_profile_page(session, username).await {
            Ok(markup) => markup,
            Err(e) => return Harvest::failed(e),
        };
        match posts_from_markup(&markup, username, limit) {
            Ok(posts) => Harvest::new(posts, None),
            Err(e) => Harvest::failed(e),
        }
    }
}

async fn fetch_profile_page(session: &mut Session, username: &str) -> AcquisitionResult<String> {
    let url = session.profile_url(username)?;
    let resp = session
        .get(CallKind::EmbeddedProfilePage, &url, &[], &[])
        .await?;
    Ok(resp.body)
}

/// Normalize the posts embedded in a profile page.
pub fn posts_from_markup(markup: &str, username: &str, limit: usize) -> AcquisitionResult<Vec<Post>> {
    let data = extract_embedded_data(markup)
        .ok_or_else(|| AcquisitionError::Malformed("no embedded data in profile page".into()))?;
    let user = find_user_container(&data)
        .ok_or_else(|| AcquisitionError::Malformed("embedded data has no user".into()))?;
    let page = read_timeline(user)?;

    let mut posts = Vec::new();
    collect_nodes(&mut posts, &page.nodes, username, limit);
    Ok(posts)
}

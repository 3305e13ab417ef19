//! Username → internal numeric identifier.
//!
//! Three methods, tried in order:
//! 1. the profile metadata JSON (`/{username}/?__a=1&__d=dis`),
//! 2. the data blob embedded in the profile page,
//! 3. pattern search over the raw profile page.
//!
//! Failing to resolve is not an error for the engine as a whole; it only
//! rules out strategies that need the identifier.

use std::sync::OnceLock;

use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;

use crate::embedded::{extract_embedded_data, find_user_container};
use crate::pacing::CallKind;
use crate::session::Session;
use crate::types::{AcquisitionError, AcquisitionResult};

/// Resolve `username` to its identifier, or `None` if every method failed.
pub async fn resolve(session: &mut Session, username: &str) -> Option<String> {
    match resolve_detailed(session, username).await {
        Ok(id) => Some(id),
        Err(e) => {
            tracing::warn!("Could not resolve identifier for @{username}: {e}");
            None
        }
    }
}

/// Like [`resolve`], keeping the reason the last method failed.
pub async fn resolve_detailed(session: &mut Session, username: &str) -> AcquisitionResult<String> {
    match lookup_metadata(session, username).await {
        Ok(id) => {
            tracing::debug!("Resolved @{username} from profile metadata");
            return Ok(id);
        }
        Err(e) => tracing::debug!("Profile metadata lookup failed for @{username}: {e}"),
    }

    let page = session.profile_url(username)?;
    let resp = session
        .get(CallKind::ProfilePageLookup, &page, &[], &[])
        .await?;
    identifier_from_markup(&resp.body).ok_or(AcquisitionError::ProfileUnresolved)
}

async fn lookup_metadata(session: &mut Session, username: &str) -> AcquisitionResult<String> {
    let url = session.profile_url(username)?;
    let resp = session
        .get(
            CallKind::ProfileLookup,
            &url,
            &[("__a", "1"), ("__d", "dis")],
            &[],
        )
        .await?;
    let data = resp.json()?;
    identifier_from_metadata(&data)
        .ok_or_else(|| AcquisitionError::Malformed("metadata has no user id".into()))
}

/// Read the id from a metadata payload: `graphql.user.id` or `user.id`.
pub fn identifier_from_metadata(data: &Value) -> Option<String> {
    data.get("graphql")
        .and_then(|g| g.get("user"))
        .and_then(identifier_of)
        .or_else(|| data.get("user").and_then(identifier_of))
}

/// Find the id in profile-page markup: embedded data first, then patterns.
pub fn identifier_from_markup(markup: &str) -> Option<String> {
    if let Some(data) = extract_embedded_data(markup) {
        if let Some(id) = find_user_container(&data).and_then(identifier_of) {
            return Some(id);
        }
    }
    identifier_from_patterns(markup)
}

/// Pattern search: `"user_id":"…"`, `"profilePage_…"`, then the
/// `al:ios:url` meta tag.
pub fn identifier_from_patterns(markup: &str) -> Option<String> {
    capture_digits(user_id_re(), markup)
        .or_else(|| capture_digits(profile_page_re(), markup))
        .or_else(|| identifier_from_meta(markup))
}

/// The `id` field of a user object, as a string of digits.
pub fn identifier_of(user: &Value) -> Option<String> {
    let id = user.get("id")?;
    let id = match id {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!id.is_empty()).then_some(id)
}

fn identifier_from_meta(markup: &str) -> Option<String> {
    let document = Html::parse_document(markup);
    let sel = Selector::parse(r#"meta[property="al:ios:url"]"#).ok()?;
    document
        .select(&sel)
        .filter_map(|m| m.value().attr("content"))
        .find_map(|content| capture_digits(ios_url_re(), content))
}

fn capture_digits(re: &Regex, haystack: &str) -> Option<String> {
    re.captures(haystack)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn user_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""user_id":"(\d+)""#).expect("user id regex is valid"))
}

fn profile_page_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""profilePage_(\d+)""#).expect("profile page regex is valid"))
}

fn ios_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"user\?id=(\d+)").expect("ios url regex is valid"))
}

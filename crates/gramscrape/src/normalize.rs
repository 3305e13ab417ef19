//! Conversion of raw post nodes into [`Post`] records.
//!
//! Node shapes differ slightly per strategy and drift over time, so every
//! field is read defensively. [`normalize`] is total: anything it cannot
//! make sense of becomes a stub post instead of an error.

use std::sync::OnceLock;

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde_json::Value;

use crate::types::{AcquisitionError, AcquisitionResult, Post};

/// Prefix of canonical post links.
pub const POST_URL_PREFIX: &str = "https://www.instagram.com/p/";

/// Captions longer than this are cut for the title.
pub const TITLE_MAX_CHARS: usize = 30;

const ELLIPSIS: &str = "...";

/// Normalize a node, falling back to a stub post on any failure.
pub fn normalize(node: &Value, fallback_username: &str) -> Post {
    match try_normalize(node, fallback_username) {
        Ok(post) => post,
        Err(e) => {
            tracing::debug!("Stubbing unreadable post node: {e}");
            stub_post(fallback_username)
        }
    }
}

/// Normalize a node, reporting why it could not be read.
pub fn try_normalize(node: &Value, fallback_username: &str) -> AcquisitionResult<Post> {
    if !node.is_object() {
        return Err(AcquisitionError::Malformed("post node is not an object".into()));
    }

    let shortcode = node
        .get("shortcode")
        .and_then(|s| s.as_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AcquisitionError::Malformed("post node has no shortcode".into()))?;

    let text = caption_text(node)?;
    let title = derive_title(&text);
    let hashtags = extract_hashtags(&text);

    let likes = match read_count(node, "edge_liked_by") {
        0 => read_count(node, "edge_media_preview_like"),
        n => n,
    };
    let comments = read_count(node, "edge_media_to_comment");

    let timestamp = format_epoch(read_epoch(node)?)?;

    let username = if fallback_username.is_empty() {
        node.get("owner")
            .and_then(|o| o.get("username"))
            .and_then(|u| u.as_str())
            .unwrap_or_default()
            .to_string()
    } else {
        fallback_username.to_string()
    };

    Ok(Post {
        url: format!("{POST_URL_PREFIX}{shortcode}/"),
        text,
        title,
        likes: likes.to_string(),
        comments: comments.to_string(),
        hashtags,
        timestamp,
        username,
    })
}

/// The placeholder returned for unreadable nodes.
pub fn stub_post(fallback_username: &str) -> Post {
    Post {
        url: String::new(),
        text: String::new(),
        title: String::new(),
        likes: "0".to_string(),
        comments: "0".to_string(),
        hashtags: Vec::new(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        username: fallback_username.to_string(),
    }
}

/// First 30 characters of the caption, with `...` when something was cut.
pub fn derive_title(text: &str) -> String {
    if text.chars().count() > TITLE_MAX_CHARS {
        let mut title: String = text.chars().take(TITLE_MAX_CHARS).collect();
        title.push_str(ELLIPSIS);
        title
    } else {
        text.to_string()
    }
}

/// Lower-cased `#word` tokens in caption order. Duplicates are kept.
pub fn extract_hashtags(text: &str) -> Vec<String> {
    hashtag_re()
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

fn hashtag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#(\w+)").expect("hashtag regex is valid"))
}

fn caption_text(node: &Value) -> AcquisitionResult<String> {
    let first_edge = node
        .get("edge_media_to_caption")
        .and_then(|c| c.get("edges"))
        .and_then(|e| e.as_array())
        .and_then(|edges| edges.first());

    match first_edge {
        None => Ok(String::new()),
        Some(edge) => edge
            .get("node")
            .and_then(|n| n.get("text"))
            .and_then(|t| t.as_str())
            .map(|t| t.to_string())
            .ok_or_else(|| AcquisitionError::Malformed("caption edge has no text".into())),
    }
}

/// `node[field].count`, accepting numbers or numeric strings. Anything
/// else counts as zero.
fn read_count(node: &Value, field: &str) -> u64 {
    node.get(field)
        .and_then(|f| f.get("count"))
        .and_then(|c| {
            c.as_u64()
                .or_else(|| c.as_str().and_then(|s| s.trim().parse().ok()))
        })
        .unwrap_or(0)
}

fn read_epoch(node: &Value) -> AcquisitionResult<i64> {
    match node.get("taken_at_timestamp") {
        None | Some(Value::Null) => Ok(0),
        Some(v) => v
            .as_i64()
            .or_else(|| v.as_f64().map(|f| f as i64))
            .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
            .ok_or_else(|| AcquisitionError::Malformed(format!("bad timestamp: {v}"))),
    }
}

fn format_epoch(secs: i64) -> AcquisitionResult<String> {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
        .ok_or_else(|| AcquisitionError::Malformed(format!("timestamp out of range: {secs}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(caption: &str) -> Value {
        json!({
            "shortcode": "ABC123",
            "edge_media_to_caption": {"edges": [{"node": {"text": caption}}]},
            "edge_liked_by": {"count": 100},
            "edge_media_to_comment": {"count": 10},
            "taken_at_timestamp": 1623456789,
            "owner": {"username": "owner_name"}
        })
    }

    #[test]
    fn test_well_formed_node() {
        let post = normalize(&node("Test post #test"), "testuser");
        assert_eq!(post.url, "https://www.instagram.com/p/ABC123/");
        assert_eq!(post.text, "Test post #test");
        assert_eq!(post.title, "Test post #test");
        assert_eq!(post.likes, "100");
        assert_eq!(post.comments, "10");
        assert_eq!(post.hashtags, vec!["test"]);
        assert_eq!(post.timestamp, "2021-06-12T00:13:09Z");
        assert_eq!(post.username, "testuser");
    }

    #[test]
    fn test_title_short_caption_unchanged() {
        assert_eq!(derive_title("Hello #world"), "Hello #world");
    }

    #[test]
    fn test_title_long_caption_truncated() {
        let caption = "abcdefghijklmnopqrstuvwxyz0123456789ABCDEFGHI";
        assert_eq!(caption.chars().count(), 45);
        let title = derive_title(caption);
        assert_eq!(title, "abcdefghijklmnopqrstuvwxyz0123...");
        assert_eq!(title.chars().count(), 33);
    }

    #[test]
    fn test_title_exactly_thirty_chars() {
        let caption = "x".repeat(30);
        assert_eq!(derive_title(&caption), caption);
    }

    #[test]
    fn test_title_counts_characters_not_bytes() {
        let caption = "é".repeat(31);
        let title = derive_title(&caption);
        assert_eq!(title, format!("{}...", "é".repeat(30)));
    }

    #[test]
    fn test_hashtags_lowercased_in_order_with_duplicates() {
        assert_eq!(
            extract_hashtags("Great day in #Paris and #paris again"),
            vec!["paris", "paris"]
        );
        assert_eq!(extract_hashtags("#Moon then #Mars_2030!"), vec!["moon", "mars_2030"]);
        assert!(extract_hashtags("no tags # here").is_empty());
    }

    #[test]
    fn test_likes_fall_back_to_preview_count() {
        let n = json!({
            "shortcode": "X",
            "edge_liked_by": {"count": 0},
            "edge_media_preview_like": {"count": 42}
        });
        assert_eq!(normalize(&n, "u").likes, "42");
    }

    #[test]
    fn test_counts_accept_strings() {
        let n = json!({
            "shortcode": "X",
            "edge_liked_by": {"count": "17"},
            "edge_media_to_comment": {"count": "3"}
        });
        let post = normalize(&n, "u");
        assert_eq!(post.likes, "17");
        assert_eq!(post.comments, "3");
    }

    #[test]
    fn test_missing_fields_default() {
        let post = normalize(&json!({"shortcode": "ONLY"}), "u");
        assert_eq!(post.url, "https://www.instagram.com/p/ONLY/");
        assert_eq!(post.text, "");
        assert_eq!(post.title, "");
        assert_eq!(post.likes, "0");
        assert_eq!(post.comments, "0");
        assert!(post.hashtags.is_empty());
        assert_eq!(post.timestamp, "1970-01-01T00:00:00Z");
    }

    #[test]
    fn test_owner_username_used_when_no_fallback() {
        assert_eq!(normalize(&node("hi"), "").username, "owner_name");
        let no_owner = json!({"shortcode": "X"});
        assert_eq!(normalize(&no_owner, "").username, "");
    }

    #[test]
    fn test_malformed_nodes_become_stubs() {
        let cases = vec![
            json!(null),
            json!("a string"),
            json!([1, 2, 3]),
            json!({}),
            json!({"edge_liked_by": {"count": 5}}),
            json!({"shortcode": "X", "edge_media_to_caption": {"edges": [{"node": {}}]}}),
            json!({"shortcode": "X", "taken_at_timestamp": "yesterday"}),
            json!({"shortcode": "X", "taken_at_timestamp": i64::MAX}),
        ];
        for case in cases {
            let post = normalize(&case, "fallback");
            assert_eq!(post.url, "", "case: {case}");
            assert_eq!(post.text, "");
            assert_eq!(post.title, "");
            assert_eq!(post.likes, "0");
            assert_eq!(post.comments, "0");
            assert!(post.hashtags.is_empty());
            assert_eq!(post.username, "fallback");
            assert!(DateTime::parse_from_rfc3339(&post.timestamp).is_ok());
        }
    }

    #[test]
    fn test_try_normalize_reports_reason() {
        let err = try_normalize(&json!({}), "u").unwrap_err();
        assert!(matches!(err, AcquisitionError::Malformed(_)));
    }
}

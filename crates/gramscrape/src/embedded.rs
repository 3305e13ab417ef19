//! Extraction of data blobs embedded in profile-page markup.
//!
//! The provider has inlined profile data in several ways over time. Each
//! way is an [`EmbeddedShape`]; [`extract_embedded_data`] tries them in
//! order and returns the first one that yields parseable JSON. New shapes
//! go into [`EmbeddedShape::ALL`] and nothing else has to change.

use std::sync::OnceLock;

use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;

/// A known way of embedding profile data in the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddedShape {
    /// `window._sharedData = {...};</script>`
    SharedData,
    /// `window.__additionalDataLoaded('profile', {...});</script>`
    AdditionalData,
    /// `<script type="application/json" data-sjs>` with the user object
    /// somewhere inside the payload.
    StructuredScript,
}

impl EmbeddedShape {
    /// Shapes in the order they are tried.
    pub const ALL: [EmbeddedShape; 3] = [
        EmbeddedShape::SharedData,
        EmbeddedShape::AdditionalData,
        EmbeddedShape::StructuredScript,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EmbeddedShape::SharedData => "shared_data",
            EmbeddedShape::AdditionalData => "additional_data",
            EmbeddedShape::StructuredScript => "structured_script",
        }
    }

    /// Try this shape against the markup.
    pub fn extract(self, markup: &str) -> Option<Value> {
        match self {
            EmbeddedShape::SharedData => capture_json(shared_data_re(), markup),
            EmbeddedShape::AdditionalData => capture_json(additional_data_re(), markup),
            EmbeddedShape::StructuredScript => extract_structured_script(markup),
        }
    }
}

/// The data blob found in a page, tagged with the shape that matched.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedData {
    pub shape: EmbeddedShape,
    pub value: Value,
}

/// Find the embedded data blob, trying every known shape in order.
pub fn extract_embedded(markup: &str) -> Option<EmbeddedData> {
    EmbeddedShape::ALL.iter().find_map(|&shape| {
        let value = shape.extract(markup)?;
        tracing::debug!("Embedded data matched shape {}", shape.name());
        Some(EmbeddedData { shape, value })
    })
}

/// Find the embedded data blob and return just its value.
pub fn extract_embedded_data(markup: &str) -> Option<Value> {
    extract_embedded(markup).map(|d| d.value)
}

/// Locate the user object inside an embedded blob.
///
/// Two layouts are known: `entry_data.ProfilePage[0].graphql.user` and a
/// top-level `user`.
pub fn find_user_container(data: &Value) -> Option<&Value> {
    data.get("entry_data")
        .and_then(|e| e.get("ProfilePage"))
        .and_then(|p| p.get(0))
        .and_then(|p| p.get("graphql"))
        .and_then(|g| g.get("user"))
        .filter(|u| u.is_object())
        .or_else(|| data.get("user").filter(|u| u.is_object()))
}

fn shared_data_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)window\._sharedData\s*=\s*(.+?);\s*</script>")
            .expect("shared data regex is valid")
    })
}

fn additional_data_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?s)window\.__additionalDataLoaded\s*\(\s*['"]profile['"]\s*,\s*(.+?)\s*\);\s*</script>"#,
        )
        .expect("additional data regex is valid")
    })
}

fn capture_json(re: &Regex, markup: &str) -> Option<Value> {
    let raw = re.captures(markup)?.get(1)?.as_str();
    match serde_json::from_str::<Value>(raw.trim()) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::debug!("Embedded blob matched but did not parse: {e}");
            None
        }
    }
}

fn extract_structured_script(markup: &str) -> Option<Value> {
    let document = Html::parse_document(markup);
    let sel = Selector::parse(r#"script[type="application/json"][data-sjs]"#).ok()?;
    document.select(&sel).find_map(|element| {
        let text: String = element.text().collect();
        let payload: Value = serde_json::from_str(text.trim()).ok()?;
        find_object_with_user(&payload).cloned()
    })
}

/// Depth-first search for the first object that has a `user` key holding
/// an object.
fn find_object_with_user(value: &Value) -> Option<&Value> {
    match value {
        Value::Object(map) => {
            if map.get("user").is_some_and(|u| u.is_object()) {
                return Some(value);
            }
            map.values().find_map(find_object_with_user)
        }
        Value::Array(items) => items.iter().find_map(find_object_with_user),
        _ => None,
    }
}

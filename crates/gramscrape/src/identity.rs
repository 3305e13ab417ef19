//! Browser-plausible request identity.
//!
//! An identity is a user-agent plus a fixed set of synthetic cookie tokens.
//! Rotation builds a new value with a different user-agent and the same
//! tokens; nothing is mutated behind the caller's back.

use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

/// Desktop and mobile browser strings to rotate through.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:123.0) Gecko/20100101 Firefox/123.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36 Edg/122.0.0.0",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1",
];

const HEX: &[u8] = b"0123456789abcdef";
const DIGITS: &[u8] = b"0123456789";
const ALNUM: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

pub const DEVICE_ID_LEN: usize = 32;
pub const MACHINE_ID_LEN: usize = 26;
pub const CSRF_TOKEN_LEN: usize = 32;
pub const REGION_HINT_LEN: usize = 10;

/// Headers every request carries regardless of identity.
const STATIC_HEADERS: &[(&str, &str)] = &[
    ("accept-language", "en-US,en;q=0.9"),
    (
        "accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8",
    ),
    ("referer", "https://www.instagram.com/"),
    (
        "sec-ch-ua",
        "\"Chromium\";v=\"122\", \"Google Chrome\";v=\"122\", \"Not:A-Brand\";v=\"99\"",
    ),
    ("sec-ch-ua-mobile", "?0"),
    ("sec-ch-ua-platform", "\"Windows\""),
    ("sec-fetch-dest", "document"),
    ("sec-fetch-mode", "navigate"),
    ("sec-fetch-site", "same-origin"),
    ("sec-fetch-user", "?1"),
    ("upgrade-insecure-requests", "1"),
    ("cache-control", "max-age=0"),
];

/// Synthetic session tokens, stable for the lifetime of an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTokens {
    /// `ig_did`: 32 lowercase hex characters.
    pub device_id: String,
    /// `rur` region hint: 10 decimal digits.
    pub region_hint: String,
    /// `mid`: 26 alphanumeric characters.
    pub machine_id: String,
    /// `csrftoken`: 32 alphanumeric characters.
    pub csrf_token: String,
}

impl SessionTokens {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            device_id: random_string(rng, HEX, DEVICE_ID_LEN),
            region_hint: random_string(rng, DIGITS, REGION_HINT_LEN),
            machine_id: random_string(rng, ALNUM, MACHINE_ID_LEN),
            csrf_token: random_string(rng, ALNUM, CSRF_TOKEN_LEN),
        }
    }

    /// Render as a `Cookie` header value.
    pub fn cookie_header(&self) -> String {
        format!(
            "ig_did={}; mid={}; csrftoken={}; ds_user_id=; sessionid=; rur=\"RVA,{}\"",
            self.device_id, self.machine_id, self.csrf_token, self.region_hint
        )
    }
}

/// The request fingerprint presented to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestIdentity {
    user_agent: &'static str,
    tokens: SessionTokens,
}

impl RequestIdentity {
    /// Fresh tokens and a random user-agent.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            user_agent: pick_user_agent(rng),
            tokens: SessionTokens::generate(rng),
        }
    }

    /// A copy with a newly drawn user-agent and the same tokens.
    pub fn rotated<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        Self {
            user_agent: pick_user_agent(rng),
            tokens: self.tokens.clone(),
        }
    }

    /// Replace this identity with [`Self::rotated`].
    pub fn rotate<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        *self = self.rotated(rng);
    }

    pub fn user_agent(&self) -> &str {
        self.user_agent
    }

    pub fn tokens(&self) -> &SessionTokens {
        &self.tokens
    }

    /// Full header set for one request.
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in STATIC_HEADERS {
            headers.insert(
                HeaderName::from_static(*name),
                HeaderValue::from_static(*value),
            );
        }
        headers.insert(
            reqwest::header::USER_AGENT,
            HeaderValue::from_static(self.user_agent),
        );
        if let Ok(cookie) = HeaderValue::from_str(&self.tokens.cookie_header()) {
            headers.insert(reqwest::header::COOKIE, cookie);
        }
        headers
    }
}

fn pick_user_agent<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    USER_AGENTS.choose(rng).copied().unwrap_or(USER_AGENTS[0])
}

fn random_string<R: Rng + ?Sized>(rng: &mut R, alphabet: &[u8], len: usize) -> String {
    (0..len)
        .map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char)
        .collect()
}

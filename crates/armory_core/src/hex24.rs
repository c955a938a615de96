//! 24-character hexadecimal template identifiers.

use std::fmt;
use std::sync::OnceLock;

use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{CoreError, CoreErrorCode};

pub const HEX24_LEN: usize = 24;

/// Lowercase 24-hex identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TemplateId(String);

impl TemplateId {
    /// Strict parse: the trimmed input must be exactly 24 hex characters.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let trimmed = raw.trim();
        if !is_hex24(trimmed) {
            return Err(CoreError::new(
                CoreErrorCode::InvalidId,
                format!("{trimmed:?} is not a 24-character hex id"),
            ));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    /// Pulls the first 24-hex run out of any string form, e.g. `MongoId("…")`
    /// or `{"$oid": "…"}` rendered as text.
    pub fn extract(raw: &str) -> Option<Self> {
        hex24_regex()?
            .find(raw)
            .map(|m| Self(m.as_str().to_ascii_lowercase()))
    }

    pub fn mint<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let bytes: [u8; HEX24_LEN / 2] = rng.r#gen();
        let mut out = String::with_capacity(HEX24_LEN);
        for byte in bytes {
            out.push_str(&format!("{byte:02x}"));
        }
        Self(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TemplateId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for TemplateId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

pub fn is_hex24(raw: &str) -> bool {
    raw.len() == HEX24_LEN && raw.bytes().all(|b| b.is_ascii_hexdigit())
}

fn hex24_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[0-9A-Fa-f]{24}").ok()).as_ref()
}

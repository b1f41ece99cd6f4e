// Wire types for the portfolio REST API.
//
// Field names are camelCase on the wire. Timestamps arrive either as an
// ISO-8601 string or as a `[year, month, day, hour, minute, second]`
// array; both are folded into `DateTime<Utc>` during deserialization and
// never travel further as a union.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Server-assigned identifier, unique among resources of one kind.
pub type ResourceId = i64;

/// Author id stamped on blog posts created from this client.
pub const DEFAULT_AUTHOR_ID: &str = "admin";

// ── Projects ─────────────────────────────────────────────────────────

/// A showcase project as returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ResourceId,
    pub name: String,
    /// Legacy mirror of `name` kept by older backends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Rich-text markup. Sanitize before rendering.
    pub description: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub technologies: Vec<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,
}

/// Input for `POST /projects`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDraft {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,
}

/// Partial update for `PUT /projects/{id}`. Absent fields are left alone;
/// `Some(None)` on a URL clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technologies: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_url: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<Option<String>>,
}

impl ProjectPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.technologies.is_none()
            && self.live_url.is_none()
            && self.repo_url.is_none()
    }
}

// ── Blog posts ───────────────────────────────────────────────────────

/// A blog post as returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: ResourceId,
    pub title: String,
    /// Rich-text markup. Sanitize before rendering.
    pub content: String,
    #[serde(default)]
    pub author_id: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// Input for `POST /blog-posts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostDraft {
    pub title: String,
    pub content: String,
    pub author_id: String,
}

impl Default for BlogPostDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            author_id: DEFAULT_AUTHOR_ID.into(),
        }
    }
}

/// Partial update for `PUT /blog-posts/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
}

impl BlogPostPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.author_id.is_none()
    }
}

// ── Users & auth ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: ResourceId,
    pub username: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
}

// ── Helpers ──────────────────────────────────────────────────────────

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Serde adapter accepting both timestamp encodings the backend emits.
///
/// Strings may be RFC 3339 or offset-less ISO-8601 (read as UTC).
/// Arrays are `[year, month, day, hour, minute]` with optional trailing
/// seconds and nanoseconds, month 1-based, read as UTC. Always written
/// back as RFC 3339.
pub mod timestamp {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
        Text(String),
        Parts(Vec<i64>),
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        match Wire::deserialize(deserializer)? {
            Wire::Text(raw) => parse_text(&raw).map_err(de::Error::custom),
            Wire::Parts(parts) => from_parts(&parts).map_err(de::Error::custom),
        }
    }

    /// Parse the string encoding.
    pub fn parse_text(raw: &str) -> Result<DateTime<Utc>, String> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(dt.with_timezone(&Utc));
        }
        for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
                return Ok(naive.and_utc());
            }
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
            .ok_or_else(|| format!("unrecognized timestamp: {raw:?}"))
    }

    /// Build a timestamp from the numeric tuple encoding.
    pub fn from_parts(parts: &[i64]) -> Result<DateTime<Utc>, String> {
        if !(5..=7).contains(&parts.len()) {
            return Err(format!(
                "timestamp array needs 5 to 7 components, got {}",
                parts.len()
            ));
        }
        let field = |idx: usize| parts.get(idx).copied().unwrap_or(0);
        let small = |idx: usize| {
            u32::try_from(field(idx)).map_err(|_| format!("timestamp component {idx} out of range"))
        };

        let year = i32::try_from(field(0)).map_err(|_| "timestamp year out of range".to_string())?;
        let date = NaiveDate::from_ymd_opt(year, small(1)?, small(2)?)
            .ok_or_else(|| format!("invalid calendar date in {parts:?}"))?;
        let time = date
            .and_hms_nano_opt(small(3)?, small(4)?, small(5)?, small(6)?)
            .ok_or_else(|| format!("invalid time of day in {parts:?}"))?;
        Ok(time.and_utc())
    }
}

//! Core types for invite harvesting
//!
//! Defines the canonical link key, the fixed-shape validation record, and the
//! closed set of validation statuses shared by every pipeline stage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Group name used until a page yields a plausible one
pub const UNNAMED_GROUP_PLACEHOLDER: &str = "Unnamed Group";

/// Normalized invitation URL used as the deduplication key.
///
/// Only [`crate::scraping::LinkNormalizer`] can build one, so every value of
/// this type has already passed host, prefix, and invite-code checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CanonicalLink(String);

impl CanonicalLink {
    pub(crate) fn from_normalized(link: String) -> Self {
        Self(link)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The invite code (last path segment)
    pub fn invite_code(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }
}

impl fmt::Display for CanonicalLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalLink {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Category of a network-level failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkErrorKind {
    Timeout,
    HttpStatus(u16),
    Connection,
    Other,
}

impl fmt::Display for NetworkErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => f.write_str("Timeout"),
            Self::HttpStatus(code) => write!(f, "HTTP {}", code),
            Self::Connection => f.write_str("Connection"),
            Self::Other => f.write_str("Other"),
        }
    }
}

/// Terminal outcome of validating one link
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LinkStatus {
    /// Page resolved with a plausible group name
    Active,
    /// Page text says the link was reset, the group is gone, or it is full
    ExpiredOrFull,
    /// Request ended on a host other than the invitation host
    RedirectedAway { host: String },
    /// Page loaded without a confident name signal
    Inactive,
    NetworkError(NetworkErrorKind),
    ParsingError,
}

/// Coarse grouping of statuses used for summaries and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCategory {
    Active,
    ExpiredOrFull,
    Other,
}

impl LinkStatus {
    pub fn category(&self) -> StatusCategory {
        match self {
            Self::Active => StatusCategory::Active,
            // An invite that bounces off-site is as dead as an expired one
            Self::ExpiredOrFull | Self::RedirectedAway { .. } => StatusCategory::ExpiredOrFull,
            Self::Inactive | Self::NetworkError(_) | Self::ParsingError => StatusCategory::Other,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::NetworkError(_) | Self::ParsingError)
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("Active"),
            Self::ExpiredOrFull => f.write_str("Full or Expired"),
            Self::RedirectedAway { host } => write!(f, "Redirected Away ({})", host),
            Self::Inactive => f.write_str("Inactive"),
            Self::NetworkError(kind) => write!(f, "Network Error: {}", kind),
            Self::ParsingError => f.write_str("Parsing Error"),
        }
    }
}

/// Error returned when a status label is not one of the known labels
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown link status: {0:?}")]
pub struct UnknownStatus(pub String);

impl FromStr for LinkStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        match label {
            "Active" => return Ok(Self::Active),
            "Full or Expired" => return Ok(Self::ExpiredOrFull),
            "Inactive" => return Ok(Self::Inactive),
            "Parsing Error" => return Ok(Self::ParsingError),
            _ => {}
        }

        if let Some(host) = label
            .strip_prefix("Redirected Away (")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            if !host.is_empty() {
                return Ok(Self::RedirectedAway {
                    host: host.to_string(),
                });
            }
        }

        if let Some(kind) = label.strip_prefix("Network Error: ") {
            let kind = match kind {
                "Timeout" => Some(NetworkErrorKind::Timeout),
                "Connection" => Some(NetworkErrorKind::Connection),
                "Other" => Some(NetworkErrorKind::Other),
                other => other
                    .strip_prefix("HTTP ")
                    .and_then(|code| code.parse::<u16>().ok())
                    .map(NetworkErrorKind::HttpStatus),
            };
            if let Some(kind) = kind {
                return Ok(Self::NetworkError(kind));
            }
        }

        Err(UnknownStatus(s.to_string()))
    }
}

impl Serialize for LinkStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LinkStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(serde::de::Error::custom)
    }
}

/// Result of validating one canonical link.
///
/// Field names serialize to the export columns consumed by table and CSV
/// renderers downstream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationRecord {
    #[serde(rename = "Group Link")]
    pub link: CanonicalLink,
    #[serde(rename = "Group Name")]
    pub group_name: String,
    #[serde(rename = "Logo URL")]
    pub logo_url: String,
    #[serde(rename = "Status")]
    pub status: LinkStatus,
    #[serde(rename = "Fetched At")]
    pub fetched_at: DateTime<Utc>,
}

impl ValidationRecord {
    /// A record with placeholder name, no logo, and the given status
    pub fn new(link: CanonicalLink, status: LinkStatus) -> Self {
        Self {
            link,
            group_name: UNNAMED_GROUP_PLACEHOLDER.to_string(),
            logo_url: String::new(),
            status,
            fetched_at: Utc::now(),
        }
    }

    pub fn with_group_name(mut self, name: impl Into<String>) -> Self {
        self.group_name = name.into();
        self
    }

    pub fn with_logo_url(mut self, logo_url: impl Into<String>) -> Self {
        self.logo_url = logo_url.into();
        self
    }

    /// Whether the group name was resolved from the page
    pub fn has_group_name(&self) -> bool {
        !self.group_name.is_empty() && self.group_name != UNNAMED_GROUP_PLACEHOLDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels_parse_back() {
        let statuses = [
            LinkStatus::Active,
            LinkStatus::ExpiredOrFull,
            LinkStatus::RedirectedAway {
                host: "www.whatsapp.com".to_string(),
            },
            LinkStatus::Inactive,
            LinkStatus::NetworkError(NetworkErrorKind::Timeout),
            LinkStatus::NetworkError(NetworkErrorKind::HttpStatus(404)),
            LinkStatus::NetworkError(NetworkErrorKind::Connection),
            LinkStatus::ParsingError,
        ];

        for status in statuses {
            let label = status.to_string();
            assert_eq!(label.parse::<LinkStatus>().unwrap(), status, "label {:?}", label);
        }
    }

    #[test]
    fn test_unknown_status_rejected() {
        assert!("Expired (No Logo)".parse::<LinkStatus>().is_err());
        assert!("Network Error: HTTP abc".parse::<LinkStatus>().is_err());
        assert!("Redirected Away ()".parse::<LinkStatus>().is_err());
        assert!("".parse::<LinkStatus>().is_err());
    }

    #[test]
    fn test_status_categories() {
        assert_eq!(LinkStatus::Active.category(), StatusCategory::Active);
        assert_eq!(LinkStatus::ExpiredOrFull.category(), StatusCategory::ExpiredOrFull);
        assert_eq!(
            LinkStatus::RedirectedAway { host: "example.com".to_string() }.category(),
            StatusCategory::ExpiredOrFull
        );
        assert_eq!(LinkStatus::ParsingError.category(), StatusCategory::Other);
        assert!(LinkStatus::NetworkError(NetworkErrorKind::Other).is_error());
        assert!(!LinkStatus::Inactive.is_error());
    }

    #[test]
    fn test_record_serializes_export_columns() {
        let record = ValidationRecord::new(
            CanonicalLink::from_normalized("https://chat.whatsapp.com/ABCDEFGHIJ0123456".to_string()),
            LinkStatus::Active,
        )
        .with_group_name("Rustaceans");

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["Group Link"], "https://chat.whatsapp.com/ABCDEFGHIJ0123456");
        assert_eq!(json["Group Name"], "Rustaceans");
        assert_eq!(json["Logo URL"], "");
        assert_eq!(json["Status"], "Active");
        assert!(json.get("Fetched At").is_some());
    }

    #[test]
    fn test_invite_code_and_placeholder() {
        let link = CanonicalLink::from_normalized(
            "https://chat.whatsapp.com/ABCDEFGHIJ0123456".to_string(),
        );
        assert_eq!(link.invite_code(), "ABCDEFGHIJ0123456");

        let record = ValidationRecord::new(link, LinkStatus::Inactive);
        assert!(!record.has_group_name());
        assert!(record.with_group_name("Book Club").has_group_name());
    }
}

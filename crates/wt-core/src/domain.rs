//! Hostname extraction from visited URLs.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// A lowercase hostname extracted from a URL.
///
/// Only constructed through [`Domain::from_url`] or [`Domain::normalize`],
/// so every value is already normalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Domain(String);

impl Domain {
    /// Extracts the hostname of `url`.
    ///
    /// Returns `None` when the URL does not parse or has no host
    /// (`mailto:`, `data:` and friends). Callers treat that as an unknown
    /// domain rather than an error.
    pub fn from_url(url: &str) -> Option<Self> {
        let parsed = match Url::parse(url.trim()) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::debug!(url, %err, "could not extract domain");
                return None;
            }
        };
        parsed.host_str().and_then(Self::normalize)
    }

    /// Normalizes a bare hostname the same way extracted hosts are.
    pub fn normalize(host: &str) -> Option<Self> {
        let host = host.trim().trim_end_matches('.').to_ascii_lowercase();
        if host.is_empty() {
            None
        } else {
            Some(Self(host))
        }
    }

    /// Returns the hostname as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Domain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

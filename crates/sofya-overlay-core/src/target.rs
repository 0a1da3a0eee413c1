use std::fmt;

use serde::{Deserialize, Serialize};

/// Schemes that never host an overlay.
pub const DEFAULT_RESTRICTED_SCHEMES: &[&str] =
    &["chrome://", "chrome-extension://", "edge://", "about:"];

/// Identifier of a page context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PageId(pub u64);

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A page the coordinator can address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTarget {
    /// Page identifier.
    pub id: PageId,
    /// Page address.
    pub url: String,
}

impl PageTarget {
    /// Create a target from an id and address.
    pub fn new(id: PageId, url: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
        }
    }
}

/// Decides which pages may receive an overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetPolicy {
    restricted_schemes: Vec<String>,
}

impl TargetPolicy {
    /// Build a policy from a list of scheme prefixes (e.g. `chrome://`).
    pub fn new<I, S>(restricted_schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            restricted_schemes: restricted_schemes.into_iter().map(Into::into).collect(),
        }
    }

    /// A page is eligible iff it has an address that does not start with a
    /// restricted scheme. Comparison is case-insensitive.
    pub fn is_eligible(&self, url: &str) -> bool {
        let url = url.trim();
        if url.is_empty() {
            return false;
        }

        let lowered = url.to_ascii_lowercase();
        !self
            .restricted_schemes
            .iter()
            .any(|scheme| lowered.starts_with(&scheme.to_ascii_lowercase()))
    }
}

impl Default for TargetPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RESTRICTED_SCHEMES.iter().copied())
    }
}

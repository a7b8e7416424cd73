use serde::{Deserialize, Serialize};

/// An archive link found on a source page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedLink {
    /// Absolute URL of the archive
    pub url: String,
    /// Name the download is saved under inside the bundle
    pub filename: String,
    /// Name of the source the link came from
    pub origin: String,
}

impl ResolvedLink {
    pub fn new(
        url: impl Into<String>,
        filename: impl Into<String>,
        origin: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            filename: filename.into(),
            origin: origin.into(),
        }
    }
}

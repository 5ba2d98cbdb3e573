//! Handle → image resolution

use super::{AssetRef, AssetSource, AuthoritativeImages, LocalAssetDirectory};

/// Images chosen for one handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Every image from the authoritative export, in position order
    Authoritative(Vec<AssetRef>),
    /// A single synthesized URL for a local file
    Local(AssetRef),
    Unresolved,
}

/// Resolves handles against both asset sources, authoritative first
#[derive(Debug, Clone, Default)]
pub struct ImageResolver {
    authoritative: AuthoritativeImages,
    local: LocalAssetDirectory,
    base_url: String,
}

impl ImageResolver {
    pub fn new(
        authoritative: AuthoritativeImages,
        local: LocalAssetDirectory,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            authoritative,
            local,
            base_url: base_url.into(),
        }
    }

    pub fn resolve(&self, handle: &str) -> Resolution {
        let handle = handle.trim();
        if handle.is_empty() {
            return Resolution::Unresolved;
        }
        if let Some(refs) = self.authoritative.get(handle) {
            return Resolution::Authoritative(refs.to_vec());
        }
        match self.local.find(handle) {
            Some(filename) => Resolution::Local(AssetRef {
                url: self.local_url(filename),
                position: 1,
                source: AssetSource::Local,
            }),
            None => Resolution::Unresolved,
        }
    }

    /// Public URL for a local file: `{base_url}/{encoded filename}`.
    pub fn local_url(&self, filename: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(filename)
        )
    }
}

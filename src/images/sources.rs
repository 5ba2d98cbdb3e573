//! Asset catalogs: authoritative export and local image directory

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use tracing::{debug, info};

use super::{AssetRef, AssetSource, ImageError};
use crate::import::CsvImporter;
use crate::models::{Dataset, fields};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif"];

/// Derive the lookup key for a handle or file stem.
///
/// Lower-cases and collapses every run of non-alphanumeric characters into a
/// single hyphen, trimming hyphens at either end.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

/// Image URLs per handle taken from a previous, trusted export
#[derive(Debug, Clone, Default)]
pub struct AuthoritativeImages {
    by_handle: HashMap<String, Vec<AssetRef>>,
}

impl AuthoritativeImages {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ImageError> {
        let path = path.as_ref();
        let result = CsvImporter::new().read_path(path)?;
        let images = Self::from_dataset(&result.dataset);
        info!(
            path = %path.display(),
            handles = images.len(),
            "Loaded authoritative images"
        );
        Ok(images)
    }

    /// Collect `Image Src` values per handle.
    ///
    /// Rows with an empty handle belong to the last handle seen. Each list is
    /// ordered by `Image Position` (unpositioned rows last, in file order),
    /// de-duplicated by URL and renumbered from 1.
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let mut collected: BTreeMap<String, Vec<(Option<usize>, usize, String)>> = BTreeMap::new();
        let mut handle = String::new();
        for (seq, record) in dataset.records.iter().enumerate() {
            if record.has(fields::HANDLE) {
                handle = record.handle().trim().to_string();
            }
            let url = record.get(fields::IMAGE_SRC).trim();
            if handle.is_empty() || url.is_empty() {
                continue;
            }
            let position = record.get(fields::IMAGE_POSITION).trim().parse().ok();
            collected
                .entry(handle.clone())
                .or_default()
                .push((position, seq, url.to_string()));
        }

        let by_handle = collected
            .into_iter()
            .map(|(handle, mut entries)| {
                entries.sort_by_key(|(position, seq, _)| (position.is_none(), *position, *seq));
                let mut refs: Vec<AssetRef> = Vec::with_capacity(entries.len());
                for (_, _, url) in entries {
                    if refs.iter().any(|r| r.url == url) {
                        continue;
                    }
                    refs.push(AssetRef {
                        url,
                        position: refs.len() + 1,
                        source: AssetSource::Authoritative,
                    });
                }
                (handle, refs)
            })
            .collect();

        Self { by_handle }
    }

    pub fn get(&self, handle: &str) -> Option<&[AssetRef]> {
        self.by_handle
            .get(handle)
            .filter(|refs| !refs.is_empty())
            .map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.by_handle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_handle.is_empty()
    }
}

/// Listing of processed image files, keyed by slug of the file stem
#[derive(Debug, Clone, Default)]
pub struct LocalAssetDirectory {
    files: BTreeMap<String, String>,
}

impl LocalAssetDirectory {
    pub fn from_dir(path: impl AsRef<Path>) -> Result<Self, ImageError> {
        let path = path.as_ref();
        let directory_error = |source| ImageError::Directory {
            path: path.to_path_buf(),
            source,
        };

        let mut names = Vec::new();
        for entry in std::fs::read_dir(path).map_err(directory_error)? {
            let entry = entry.map_err(directory_error)?;
            if !entry.file_type().map_err(directory_error)?.is_file() {
                continue;
            }
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();

        let directory = Self::from_names(names);
        info!(path = %path.display(), files = directory.len(), "Indexed local images");
        Ok(directory)
    }

    /// Build a listing from bare filenames; the first file per slug wins.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut files = BTreeMap::new();
        for name in names {
            let name = name.into();
            let Some((stem, ext)) = name.rsplit_once('.') else {
                continue;
            };
            if !IMAGE_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext)) {
                debug!(file = %name, "Skipping non-image file");
                continue;
            }
            let key = slugify(stem);
            if key.is_empty() {
                continue;
            }
            files.entry(key).or_insert(name);
        }
        Self { files }
    }

    /// Filename stored for a handle, if any
    pub fn find(&self, handle: &str) -> Option<&str> {
        self.files.get(&slugify(handle)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Header;
    use tempfile::TempDir;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Widget A"), "widget-a");
        assert_eq!(slugify("--Omega__3 (180ct)--"), "omega-3-180ct");
        assert_eq!(slugify("widget-a"), "widget-a");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_authoritative_order_and_dedup() {
        let mut dataset = Dataset::new(Header::new([
            fields::HANDLE,
            fields::TITLE,
            fields::IMAGE_SRC,
            fields::IMAGE_POSITION,
        ]));
        let row = |v: [&str; 4]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        dataset.push_values(row(["drops", "Drops", "https://cdn.x/b.png", "2"]), 2);
        dataset.push_values(row(["", "", "https://cdn.x/c.png", ""]), 3);
        dataset.push_values(row(["drops", "", "https://cdn.x/a.png", "1"]), 4);
        dataset.push_values(row(["drops", "", "https://cdn.x/a.png", "3"]), 5);
        dataset.push_values(row(["mask", "Mask", "", ""]), 6);

        let images = AuthoritativeImages::from_dataset(&dataset);
        let refs = images.get("drops").unwrap();
        let urls: Vec<&str> = refs.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, ["https://cdn.x/a.png", "https://cdn.x/b.png", "https://cdn.x/c.png"]);
        assert_eq!(refs.iter().map(|r| r.position).collect::<Vec<_>>(), [1, 2, 3]);
        assert!(images.get("mask").is_none());
    }

    #[test]
    fn test_local_directory_listing() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Widget-A.PNG"), b"png").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"txt").unwrap();
        std::fs::create_dir(dir.path().join("nested.png")).unwrap();

        let local = LocalAssetDirectory::from_dir(dir.path()).unwrap();
        assert_eq!(local.len(), 1);
        assert_eq!(local.find("widget-a"), Some("Widget-A.PNG"));
        assert_eq!(local.find("Widget A"), Some("Widget-A.PNG"));
        assert_eq!(local.find("widget-b"), None);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = LocalAssetDirectory::from_dir(dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, ImageError::Directory { .. }));
    }
}

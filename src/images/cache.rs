//! Content-addressed cache naming and serving-path guard
//!
//! A cached image is named `sha1(remote_url) + extension`, so the filename
//! is a deterministic function of the source URL: probing before download
//! makes the cache idempotent, and identical URLs dedup naturally.

use std::path::{Component, Path, PathBuf};

use sha1::{Digest, Sha1};
use url::Url;

/// Extensions accepted as image files. Anything else falls back to `.jpg`.
const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "avif", "bmp", "svg",
];

/// Whether the URL path carries an extension from the image allow-list.
pub fn has_image_extension(url: &Url) -> bool {
    allowed_extension(url).is_some()
}

fn allowed_extension(url: &Url) -> Option<String> {
    let ext = Path::new(url.path()).extension()?.to_str()?.to_lowercase();
    IMAGE_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Cache filename for a remote image URL.
pub fn cache_filename(url: &Url) -> String {
    let mut hasher = Sha1::new();
    hasher.update(url.as_str().as_bytes());
    let hash = hex::encode(hasher.finalize());
    match allowed_extension(url) {
        Some(ext) => format!("{hash}.{ext}"),
        None => format!("{hash}.jpg"),
    }
}

/// Resolves a cached filename against the download root for serving.
///
/// Security contract with the file-serving collaborator: only ever resolve
/// paths that normalize to a single component under the root. Anything
/// with separators, parent references or an absolute form is rejected.
pub fn resolve_cached_path(root: &Path, filename: &str) -> Option<PathBuf> {
    if filename.is_empty() || filename.contains('\\') {
        return None;
    }
    let candidate = Path::new(filename);
    let mut components = candidate.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) if name.to_str() == Some(filename) => {}
        _ => return None,
    }

    let resolved = root.join(filename);
    // The joined path must still sit under the root.
    resolved.starts_with(root).then_some(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn filename_is_stable_for_the_same_url() {
        let a = cache_filename(&url("http://x/a.jpg"));
        let b = cache_filename(&url("http://x/a.jpg"));
        assert_eq!(a, b);
        assert!(a.ends_with(".jpg"));
        assert_eq!(a.len(), 40 + 4); // sha1 hex + ".jpg"
    }

    #[test]
    fn different_urls_get_different_names() {
        let a = cache_filename(&url("http://x/a.jpg"));
        let b = cache_filename(&url("http://x/b.jpg"));
        assert_ne!(a, b);
    }

    #[test]
    fn unknown_extension_defaults_to_jpg() {
        assert!(cache_filename(&url("http://x/cover.php?id=9")).ends_with(".jpg"));
        assert!(cache_filename(&url("http://x/cover")).ends_with(".jpg"));
        assert!(cache_filename(&url("http://x/cover.exe")).ends_with(".jpg"));
    }

    #[test]
    fn allowlisted_extensions_are_kept_lowercased() {
        assert!(cache_filename(&url("http://x/c.PNG")).ends_with(".png"));
        assert!(cache_filename(&url("http://x/c.webp")).ends_with(".webp"));
    }

    #[test]
    fn serving_guard_rejects_traversal() {
        let root = Path::new("/data/downloaded_images");
        assert!(resolve_cached_path(root, "abc.jpg").is_some());
        assert!(resolve_cached_path(root, "../secrets.txt").is_none());
        assert!(resolve_cached_path(root, "a/../../b.jpg").is_none());
        assert!(resolve_cached_path(root, "/etc/passwd").is_none());
        assert!(resolve_cached_path(root, "sub/dir.jpg").is_none());
        assert!(resolve_cached_path(root, "..").is_none());
        assert!(resolve_cached_path(root, "").is_none());
        assert!(resolve_cached_path(root, "a\\b.jpg").is_none());
    }
}

//! Deterministic local file names for cached media.
//!
//! Pure functions only; nothing here touches the filesystem.

use std::path::{Path, PathBuf};

use crate::cache::hash::url_tag;

/// Resolve where the media for (`title`, `source_url`) lives inside `cache_dir`.
///
/// The stem comes from the title: trimmed, whitespace runs collapsed to `_`,
/// then everything except letters, digits and `_` dropped. The extension is
/// taken from the last path segment of the URL. A title with nothing left
/// after cleaning falls back to `apod_<url tag>`.
///
/// ```
/// # use std::path::Path;
/// let path = apod_core::store::paths::resolve(
///     Path::new("/cache"),
///     " NGC #3521: Galaxy in a Bubble ",
///     "https://apod.nasa.gov/apod/image/2205/NGC3521LRGBHaAPOD-20.jpg",
/// );
/// assert!(path.ends_with("NGC_3521_Galaxy_in_a_Bubble.jpg"));
/// ```
pub fn resolve(cache_dir: &Path, title: &str, source_url: &str) -> PathBuf {
    let mut stem = file_stem(title);
    if stem.is_empty() {
        stem = format!("apod_{}", url_tag(source_url, 12));
    }
    cache_dir.join(format!("{stem}{}", file_extension(source_url)))
}

/// Variant of `path` used when another record already owns it.
///
/// Appends `_` and a short tag of `content_identity` to the stem.
pub fn disambiguate(path: &Path, content_identity: &str) -> PathBuf {
    let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let ext = path.extension().map(|e| format!(".{}", e.to_string_lossy())).unwrap_or_default();
    path.with_file_name(format!("{stem}_{}{ext}", url_tag(content_identity, 8)))
}

/// File stem derived from an APOD title.
pub fn file_stem(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect()
}

/// Extension (with leading `.`) of the last path segment of `url`.
///
/// Query strings and fragments are ignored; a host without a path has no
/// extension. Non-alphanumeric characters are dropped from the result.
pub fn file_extension(url: &str) -> String {
    let without_query = url.split(['?', '#']).next().unwrap_or_default();
    let path = match without_query.split_once("://") {
        Some((_, rest)) => rest.split_once('/').map(|(_, p)| p).unwrap_or_default(),
        None => without_query,
    };
    let segment = path.rsplit('/').next().unwrap_or_default();

    match segment.rfind('.') {
        Some(idx) => {
            let ext: String = segment[idx + 1..].chars().filter(|c| c.is_ascii_alphanumeric()).collect();
            if ext.is_empty() { String::new() } else { format!(".{ext}") }
        }
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NGC_URL: &str = "https://apod.nasa.gov/apod/image/2205/NGC3521LRGBHaAPOD-20.jpg";

    #[test]
    fn test_resolve_example_title() {
        let path = resolve(Path::new("/tmp/apod"), " NGC #3521: Galaxy in a Bubble ", NGC_URL);
        assert_eq!(path, PathBuf::from("/tmp/apod/NGC_3521_Galaxy_in_a_Bubble.jpg"));
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let dir = Path::new("/tmp/apod");
        assert_eq!(resolve(dir, "Orion Nebula", NGC_URL), resolve(dir, "Orion Nebula", NGC_URL));
    }

    #[test]
    fn test_stem_collapses_whitespace_runs() {
        assert_eq!(file_stem("  The\tMilky   Way \n"), "The_Milky_Way");
    }

    #[test]
    fn test_stem_keeps_unicode_letters() {
        assert_eq!(file_stem("Ørsted's Comet"), "Ørsteds_Comet");
    }

    #[test]
    fn test_extension_variants() {
        assert_eq!(file_extension(NGC_URL), ".jpg");
        assert_eq!(file_extension("https://img.youtube.com/vi/abc/0.JPEG?x=1#y"), ".JPEG");
        assert_eq!(file_extension("https://apod.nasa.gov/apod/image/noext"), "");
        assert_eq!(file_extension("https://apod.nasa.gov"), "");
        assert_eq!(file_extension("https://apod.nasa.gov/dir.d/file"), "");
        assert_eq!(file_extension("https://example.com/archive.tar.gz"), ".gz");
        assert_eq!(file_extension("https://example.com/trailing."), "");
        assert_eq!(file_extension("https://example.com/odd.jp-g"), ".jpg");
        assert_eq!(file_extension("https://example.com/space.jp%20g"), ".jp20g");
    }

    #[test]
    fn test_empty_stem_falls_back_to_url_tag() {
        let path = resolve(Path::new("/c"), " ?!# ", NGC_URL);
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("apod_"));
        assert!(name.ends_with(".jpg"));
        assert_eq!(name.len(), "apod_".len() + 12 + ".jpg".len());
        assert_eq!(path, resolve(Path::new("/c"), "", NGC_URL));
    }

    #[test]
    fn test_disambiguate() {
        let path = PathBuf::from("/c/Moon.jpg");
        let a = disambiguate(&path, "https://a/moon.jpg");
        let b = disambiguate(&path, "https://b/moon.jpg");

        assert_ne!(a, b);
        assert_eq!(a.parent(), path.parent());
        assert!(a.to_string_lossy().ends_with(".jpg"));
        assert!(a.file_name().unwrap().to_string_lossy().starts_with("Moon_"));
        assert_eq!(a, disambiguate(&path, "https://a/moon.jpg"));
    }
}

//! Path validation for the image-serving boundary.
//!
//! The HTTP layer that serves raw image bytes is out of scope, but the
//! boundary itself has one hard requirement: a requested path must never
//! escape the permitted corpus roots, whether by `..` components or by
//! symlinks. Canonicalizing before the prefix check covers both.

use std::path::{Path, PathBuf};

/// Validates a requested image path against a set of permitted roots.
///
/// Returns the canonical path when it names an existing regular file
/// strictly under one of the roots; `None` is both "not found" and
/// "forbidden" so callers cannot leak which of the two it was.
pub fn validate_image_path(roots: &[PathBuf], requested: &Path) -> Option<PathBuf> {
    let canonical = requested.canonicalize().ok()?;
    if !canonical.is_file() {
        return None;
    }
    let permitted = roots.iter().any(|root| {
        root.canonicalize()
            .map(|root| canonical.starts_with(&root))
            .unwrap_or(false)
    });
    permitted.then_some(canonical)
}

/// Content type for an image path, by extension.
pub fn content_type_for(path: &Path) -> Option<&'static str> {
    match path
        .extension()?
        .to_str()?
        .to_ascii_lowercase()
        .as_str()
    {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::content_type_for;
    use std::path::Path;

    #[test]
    fn content_types_by_extension() {
        assert_eq!(
            content_type_for(Path::new("pic.0164.jpg")),
            Some("image/jpeg")
        );
        assert_eq!(
            content_type_for(Path::new("grid.PNG")),
            Some("image/png")
        );
        assert_eq!(content_type_for(Path::new("notes.txt")), None);
        assert_eq!(content_type_for(Path::new("no_extension")), None);
    }
}

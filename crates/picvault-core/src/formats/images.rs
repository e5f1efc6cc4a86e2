//! Image entry classification.

use std::path::Path;

/// Extensions accepted as image entries during extraction.
///
/// Classification is purely by extension; directories and anything not on
/// this list are silently skipped during bulk extraction.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "jfif", "png", "gif", "webp", "bmp", "tiff", "tif", "svg", "avif",
];

/// Returns `true` if the entry name carries an image extension.
#[must_use]
pub fn is_image_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_formats_accepted() {
        for name in ["a.jpg", "b.JPEG", "c.png", "d.webp", "dir/e.AVIF", "f.tif"] {
            assert!(is_image_name(name), "{name} should classify as image");
        }
    }

    #[test]
    fn test_non_images_rejected() {
        for name in ["readme.txt", "archive.zip", "noext", "movie.mp4", ".jpg.exe"] {
            assert!(!is_image_name(name), "{name} should not classify as image");
        }
    }

    #[test]
    fn test_extension_only_not_fooled_by_dots() {
        assert!(is_image_name("weird.name.with.dots.gif"));
        assert!(!is_image_name("trailingdot.gif."));
    }
}

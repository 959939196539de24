//! Uploaded file storage with format-aware image compression.
//!
//! Files land at `{upload_dir}/{folder}/{unix_nanos}{ext}`. The value stored
//! in the database is `uploads/{folder}/{file}` and the public URL is that
//! path with a leading `/`, served by the static `/uploads` route.
//!
//! Raster images are shrunk before they are written:
//!
//! - anything larger than 1920px on a side is resized (nearest neighbour);
//! - PNGs with transparency are re-encoded as PNG;
//! - WebP is flattened onto white and encoded as JPEG quality 85;
//! - everything else is flattened and encoded as JPEG, stepping quality down
//!   from 85 by 10 (not below 40) until the result is at most 700 KB.
//!
//! A re-encode is only kept when it is smaller than the original. Undecodable
//! input is stored untouched.

use std::io::Cursor;
use std::path::{Component, Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, RgbImage};
use serde::Serialize;

use portfolio_core::error::PortfolioError;

/// Prefix of every stored upload path.
pub const STORED_PREFIX: &str = "uploads";

const ALLOWED_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "webp", "gif", "bmp", "tiff", "tif", "ico", "svg", "pdf", "doc", "docx",
];

const COMPRESSIBLE_EXTENSIONS: &[&str] =
    &["jpg", "jpeg", "png", "webp", "gif", "bmp", "tiff", "tif"];

const MAX_DIMENSION: u32 = 1920;
const TARGET_BYTES: usize = 700 * 1024;
const START_QUALITY: u8 = 85;
const MIN_QUALITY: u8 = 40;
const QUALITY_STEP: u8 = 10;

/// Where a stored file lives.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StoredFile {
    /// `uploads/{folder}/{file}`.
    pub path: String,
    /// `/uploads/{folder}/{file}`.
    pub url: String,
}

/// Lowercase extension of a client file name, without the dot.
pub fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .filter(|e| !e.is_empty())
}

pub fn is_allowed(ext: &str) -> bool {
    ALLOWED_EXTENSIONS.contains(&ext)
}

/// Keep only `[A-Za-z0-9_-]` in a folder name. Empty becomes "general".
pub fn sanitize_folder(folder: &str) -> String {
    let clean: String = folder
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if clean.is_empty() {
        "general".to_string()
    } else {
        clean
    }
}

/// Filesystem-backed upload directory.
#[derive(Clone, Debug)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validate, compress and write a file into `folder`.
    pub async fn save(
        &self,
        folder: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredFile, PortfolioError> {
        let ext = extension_of(file_name)
            .filter(|e| is_allowed(e))
            .ok_or_else(|| PortfolioError::Upload("file type not allowed".into()))?;

        let original_len = bytes.len();
        let (bytes, ext) = if COMPRESSIBLE_EXTENSIONS.contains(&ext.as_str()) {
            tokio::task::spawn_blocking(move || compress(bytes, ext))
                .await
                .map_err(|e| PortfolioError::Upload(format!("compression task failed: {}", e)))?
        } else {
            (bytes, ext)
        };

        let folder = sanitize_folder(folder);
        let dir = self.root.join(&folder);
        tokio::fs::create_dir_all(&dir).await?;

        let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let file = format!("{}.{}", nanos, ext);
        tokio::fs::write(dir.join(&file), &bytes).await?;

        tracing::debug!(
            folder = %folder,
            file = %file,
            original = original_len,
            stored = bytes.len(),
            "Stored upload"
        );

        let path = format!("{}/{}/{}", STORED_PREFIX, folder, file);
        Ok(StoredFile {
            url: format!("/{}", path),
            path,
        })
    }

    /// Map a stored path or URL onto the upload directory.
    ///
    /// Accepts `uploads/..`, `/uploads/..` and absolute URLs containing
    /// `/uploads`. Returns `None` for anything outside the upload directory.
    pub fn resolve(&self, stored: &str) -> Option<PathBuf> {
        let stored = stored.trim();
        let stored = if stored.starts_with("http://") || stored.starts_with("https://") {
            &stored[stored.find("/uploads")?..]
        } else {
            stored
        };
        let relative = stored
            .trim_start_matches('/')
            .strip_prefix(STORED_PREFIX)?
            .strip_prefix('/')?;

        let relative = Path::new(relative);
        let only_normal = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !only_normal || relative.as_os_str().is_empty() {
            return None;
        }
        Some(self.root.join(relative))
    }

    /// Remove a stored file. A file that is already gone is not an error.
    pub async fn delete(&self, stored: &str) -> Result<(), PortfolioError> {
        let path = self
            .resolve(stored)
            .ok_or_else(|| PortfolioError::Upload("invalid path".into()))?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Best-effort removal of a replaced or orphaned file. Empty paths are skipped.
    pub async fn remove_quietly(&self, stored: &str) {
        if stored.trim().is_empty() {
            return;
        }
        if let Err(e) = self.delete(stored).await {
            tracing::warn!(path = %stored, error = %e, "Failed to delete upload");
        }
    }
}

/// Shrink an image. Returns the bytes to store and their extension.
pub fn compress(original: Vec<u8>, ext: String) -> (Vec<u8>, String) {
    let img = match image::load_from_memory(&original) {
        Ok(img) => img,
        Err(e) => {
            tracing::debug!(ext = %ext, error = %e, "Upload is not a decodable image, storing as is");
            return (original, ext);
        }
    };

    let img = if img.width() > MAX_DIMENSION || img.height() > MAX_DIMENSION {
        img.resize(MAX_DIMENSION, MAX_DIMENSION, FilterType::Nearest)
    } else {
        img
    };

    let candidate = if ext == "png" && has_transparency(&img) {
        encode_png(&img).map(|b| (b, "png"))
    } else if ext == "webp" {
        encode_jpeg(&flatten_on_white(&img), START_QUALITY).map(|b| (b, "jpg"))
    } else {
        encode_jpeg_to_target(&flatten_on_white(&img)).map(|b| (b, "jpg"))
    };

    match candidate {
        Some((bytes, new_ext)) if bytes.len() < original.len() => (bytes, new_ext.to_string()),
        _ => (original, ext),
    }
}

fn has_transparency(img: &DynamicImage) -> bool {
    img.color().has_alpha() && img.to_rgba8().pixels().any(|p| p.0[3] < u8::MAX)
}

/// Composite onto an opaque white background.
fn flatten_on_white(img: &DynamicImage) -> RgbImage {
    let rgba = img.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, px) in rgba.enumerate_pixels() {
        let [r, g, b, a] = px.0;
        let a = a as u32;
        let blend = |c: u8| ((c as u32 * a + 255 * (255 - a)) / 255) as u8;
        out.put_pixel(x, y, image::Rgb([blend(r), blend(g), blend(b)]));
    }
    out
}

fn encode_jpeg(img: &RgbImage, quality: u8) -> Option<Vec<u8>> {
    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    match encoder.encode_image(img) {
        Ok(()) => Some(buf),
        Err(e) => {
            tracing::debug!(quality, error = %e, "JPEG encode failed");
            None
        }
    }
}

fn encode_jpeg_to_target(img: &RgbImage) -> Option<Vec<u8>> {
    let mut quality = START_QUALITY;
    loop {
        let bytes = encode_jpeg(img, quality)?;
        if bytes.len() <= TARGET_BYTES || quality <= MIN_QUALITY {
            return Some(bytes);
        }
        quality = quality.saturating_sub(QUALITY_STEP).max(MIN_QUALITY);
    }
}

fn encode_png(img: &DynamicImage) -> Option<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).ok()?;
    Some(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn png_bytes(img: &DynamicImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn noisy_rgba(w: u32, h: u32, alpha: u8) -> DynamicImage {
        let img = RgbaImage::from_fn(w, h, |x, y| {
            let v = ((x * 31 + y * 17) ^ (x * y)) as u8;
            Rgba([v, v.wrapping_mul(3), v.wrapping_add(90), alpha])
        });
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn test_extension_rules() {
        assert_eq!(extension_of("Photo.JPG").as_deref(), Some("jpg"));
        assert_eq!(extension_of("noext"), None);
        assert!(is_allowed("docx"));
        assert!(is_allowed("svg"));
        assert!(!is_allowed("exe"));
        assert!(!is_allowed("html"));
    }

    #[test]
    fn test_sanitize_folder() {
        assert_eq!(sanitize_folder("blogs"), "blogs");
        assert_eq!(sanitize_folder("../../etc"), "etc");
        assert_eq!(sanitize_folder(""), "general");
    }

    #[test]
    fn test_resolve_paths_and_urls() {
        let store = UploadStore::new("/srv/files");
        assert_eq!(
            store.resolve("uploads/blogs/1.jpg"),
            Some(PathBuf::from("/srv/files/blogs/1.jpg"))
        );
        assert_eq!(
            store.resolve("/uploads/blogs/1.jpg"),
            Some(PathBuf::from("/srv/files/blogs/1.jpg"))
        );
        assert_eq!(
            store.resolve("https://cdn.example.com/uploads/skills/2.png"),
            Some(PathBuf::from("/srv/files/skills/2.png"))
        );
        assert_eq!(store.resolve("uploads/../secret"), None);
        assert_eq!(store.resolve("etc/passwd"), None);
        assert_eq!(store.resolve("uploads/"), None);
    }

    #[test]
    fn test_opaque_png_becomes_smaller_jpeg() {
        let original = png_bytes(&noisy_rgba(300, 200, 255));
        let (bytes, ext) = compress(original.clone(), "png".into());
        assert_eq!(ext, "jpg");
        assert!(bytes.len() < original.len());
        assert!(image::load_from_memory(&bytes).is_ok());
    }

    #[test]
    fn test_transparent_png_stays_png() {
        let original = png_bytes(&noisy_rgba(64, 64, 128));
        let (bytes, ext) = compress(original.clone(), "png".into());
        assert_eq!(ext, "png");
        assert!(bytes.len() <= original.len());
    }

    #[test]
    fn test_large_image_is_resized() {
        let original = png_bytes(&noisy_rgba(2400, 1200, 255));
        let (bytes, _) = compress(original, "png".into());
        let img = image::load_from_memory(&bytes).unwrap();
        assert_eq!((img.width(), img.height()), (1920, 960));
    }

    #[test]
    fn test_undecodable_bytes_are_kept() {
        let (bytes, ext) = compress(b"not an image".to_vec(), "jpg".into());
        assert_eq!(bytes, b"not an image");
        assert_eq!(ext, "jpg");
    }

    #[test]
    fn test_flatten_blends_with_white() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 0])));
        assert_eq!(flatten_on_white(&img).get_pixel(0, 0).0, [255, 255, 255]);
    }

    #[tokio::test]
    async fn test_save_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path());

        let stored = store.save("docs", "cv.pdf", b"%PDF-1.4".to_vec()).await.unwrap();
        assert!(stored.path.starts_with("uploads/docs/"));
        assert!(stored.path.ends_with(".pdf"));
        assert_eq!(stored.url, format!("/{}", stored.path));

        let on_disk = store.resolve(&stored.path).unwrap();
        assert!(on_disk.exists());

        store.delete(&stored.url).await.unwrap();
        assert!(!on_disk.exists());
        // Already gone.
        store.delete(&stored.path).await.unwrap();
    }

    #[tokio::test]
    async fn test_save_rejects_disallowed_type() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path());
        let err = store.save("general", "run.exe", vec![0]).await.unwrap_err();
        assert!(matches!(err, PortfolioError::Upload(ref m) if m == "file type not allowed"));
    }
}

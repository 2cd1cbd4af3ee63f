//! File-backed gallery store.
//!
//! The upload directory is the only index: every listing enumerates it fresh,
//! keeping files whose extension is in [`IMAGE_EXTENSIONS`]. Mutations are
//! plain filesystem writes with no locking, so concurrent writers to the same
//! filename resolve as last-write-wins.

use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::error::{ImageFormatHint, UnsupportedError};
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, Frame, ImageFormat, Rgba, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use serde::Serialize;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::{fs, task};
use tracing::{debug, info, warn};

use crate::constants::{IMAGE_EXTENSIONS, images};

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Invalid file type: {0}")]
    InvalidFileType(String),

    #[error("Invalid filename")]
    InvalidFilename,

    #[error("Image {0} not found")]
    NotFound(String),

    #[error("Error processing {filename}: {message}")]
    Processing { filename: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A gallery entry as exposed by every listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageEntry {
    pub filename: String,
    pub url: String,
}

/// Raw upload as received from the client.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Name claimed by the client, before sanitization.
    pub name: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct UploadOutcome {
    pub uploaded: Vec<String>,
    pub errors: Vec<String>,
}

/// Clockwise rotation. Quarter turns are lossless pixel moves; any other
/// angle is resampled onto an expanded canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rotation {
    Identity,
    Clockwise90,
    Clockwise180,
    Clockwise270,
    /// Degrees in `(0, 360)`, never a multiple of 90.
    Arbitrary(f64),
}

impl Rotation {
    /// Positive degrees rotate clockwise. Values are normalized modulo 360;
    /// non-finite input is refused.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn from_degrees(degrees: f64) -> Option<Self> {
        if !degrees.is_finite() {
            return None;
        }

        let normalized = degrees.rem_euclid(360.0);

        Some(match normalized {
            d if d == 0.0 || d == 360.0 => Self::Identity,
            d if d == 90.0 => Self::Clockwise90,
            d if d == 180.0 => Self::Clockwise180,
            d if d == 270.0 => Self::Clockwise270,
            d => Self::Arbitrary(d),
        })
    }

    #[must_use]
    pub fn apply(self, img: DynamicImage) -> DynamicImage {
        match self {
            Self::Identity => img,
            Self::Clockwise90 => img.rotate90(),
            Self::Clockwise180 => img.rotate180(),
            Self::Clockwise270 => img.rotate270(),
            Self::Arbitrary(degrees) => rotate_expanded(&img, degrees),
        }
    }
}

/// Rotates clockwise about the centre onto a canvas sized to the rotated
/// bounding box. Uncovered pixels are transparent.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn rotate_expanded(img: &DynamicImage, degrees: f64) -> DynamicImage {
    let rgba = img.to_rgba8();
    let (w, h) = (rgba.width() as f32, rgba.height() as f32);

    let theta = degrees.to_radians() as f32;
    let (sin, cos) = (theta.sin().abs(), theta.cos().abs());
    let out_w = (w * cos + h * sin).ceil().max(1.0) as u32;
    let out_h = (w * sin + h * cos).ceil().max(1.0) as u32;

    // Applied right to left: centre on the origin, turn, re-centre on the canvas.
    let projection = Projection::translate(out_w as f32 / 2.0, out_h as f32 / 2.0)
        * Projection::rotate(theta)
        * Projection::translate(-w / 2.0, -h / 2.0);

    let mut out = RgbaImage::new(out_w, out_h);
    warp_into(
        &rgba,
        &projection,
        Interpolation::Bilinear,
        Rgba([0, 0, 0, 0]),
        &mut out,
    );

    DynamicImage::ImageRgba8(out)
}

pub struct ImageStore {
    root: PathBuf,
    public_prefix: String,
}

impl ImageStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, public_prefix: &str) -> Self {
        Self {
            root: root.into(),
            public_prefix: public_prefix.trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_dir(&self) -> Result<(), ImageError> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    #[must_use]
    pub fn url_for(&self, filename: &str) -> String {
        format!("{}/{}", self.public_prefix, urlencoding::encode(filename))
    }

    /// Directory order, unsorted. A missing directory lists as empty.
    pub async fn list(&self) -> Result<Vec<ImageEntry>, ImageError> {
        if !fs::try_exists(&self.root).await? {
            warn!(path = %self.root.display(), "Upload folder does not exist");
            return Ok(Vec::new());
        }

        self.scan().await
    }

    /// Ascending by filename. A missing directory is created and lists as
    /// empty.
    pub async fn list_sorted(&self) -> Result<Vec<ImageEntry>, ImageError> {
        if !fs::try_exists(&self.root).await? {
            warn!(path = %self.root.display(), "Upload folder does not exist, creating it");
            self.ensure_dir().await?;
            return Ok(Vec::new());
        }

        let mut images = self.scan().await?;
        images.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(images)
    }

    async fn scan(&self) -> Result<Vec<ImageEntry>, ImageError> {
        let mut dir = fs::read_dir(&self.root).await?;
        let mut images = Vec::new();

        while let Some(entry) = dir.next_entry().await? {
            let Ok(filename) = entry.file_name().into_string() else {
                continue;
            };

            if !is_allowed(&filename) {
                debug!(filename = %filename, "Skipping non-image file");
                continue;
            }

            // Follows symlinks, matching what the static file server will serve.
            match fs::metadata(entry.path()).await {
                Ok(meta) if meta.is_file() => {}
                _ => {
                    debug!(filename = %filename, "Skipping non-regular entry");
                    continue;
                }
            }

            images.push(ImageEntry {
                url: self.url_for(&filename),
                filename,
            });
        }

        debug!(count = images.len(), "Scanned upload folder");
        Ok(images)
    }

    /// Validates, downsizes and writes one upload, returning the stored name.
    /// An existing file with the same name is overwritten.
    pub async fn save(&self, upload: UploadedFile) -> Result<String, ImageError> {
        if upload.name.is_empty() {
            return Err(ImageError::InvalidFilename);
        }

        let filename = secure_filename(&upload.name)
            .filter(|name| is_allowed(name))
            .ok_or_else(|| ImageError::InvalidFileType(upload.name.clone()))?;

        let format = ImageFormat::from_path(&filename)
            .map_err(|e| processing_error(&filename, &e))?;

        let data = upload.data;
        let encoded = run_blocking(&filename, move || prepare_upload(&data, format)).await?;

        let path = self.root.join(&filename);
        let write = async {
            fs::create_dir_all(&self.root).await?;
            fs::write(&path, &encoded).await
        };
        write.await.map_err(|e| processing_error(&filename, &e))?;

        info!(filename = %filename, bytes = encoded.len(), "Stored uploaded image");
        Ok(filename)
    }

    /// Saves each upload independently. Parts with an empty name are skipped.
    pub async fn save_all(&self, uploads: Vec<UploadedFile>) -> UploadOutcome {
        let mut outcome = UploadOutcome::default();

        for upload in uploads {
            if upload.name.is_empty() {
                continue;
            }

            match self.save(upload).await {
                Ok(filename) => outcome.uploaded.push(filename),
                Err(e) => {
                    warn!(error = %e, "Upload rejected");
                    outcome.errors.push(e.to_string());
                }
            }
        }

        outcome
    }

    pub async fn delete(&self, filename: &str) -> Result<(), ImageError> {
        let path = self.resolve(filename)?;

        if !fs::try_exists(&path).await? {
            return Err(ImageError::NotFound(filename.to_string()));
        }

        fs::remove_file(&path).await?;
        info!(filename = %filename, "Deleted image");
        Ok(())
    }

    /// Rotates in place, expanding the canvas so nothing is cropped.
    pub async fn rotate(&self, filename: &str, rotation: Rotation) -> Result<(), ImageError> {
        let path = self.resolve(filename)?;

        if !fs::try_exists(&path).await? {
            return Err(ImageError::NotFound(filename.to_string()));
        }

        let format = ImageFormat::from_path(&path).map_err(|e| processing_error(filename, &e))?;
        let data = fs::read(&path).await?;

        let encoded = run_blocking(filename, move || {
            let img = image::load_from_memory(&data)?;
            encode(&rotation.apply(img), format, images::ROTATE_QUALITY)
        })
        .await?;

        fs::write(&path, encoded).await?;
        info!(filename = %filename, ?rotation, "Rotated image");
        Ok(())
    }

    /// Maps a stored filename to its path, refusing anything that could
    /// escape the upload directory.
    fn resolve(&self, filename: &str) -> Result<PathBuf, ImageError> {
        if filename.is_empty()
            || filename == "."
            || filename == ".."
            || filename.contains(['/', '\\', '\0'])
        {
            return Err(ImageError::InvalidFilename);
        }

        Ok(self.root.join(filename))
    }
}

async fn run_blocking<F>(filename: &str, job: F) -> Result<Vec<u8>, ImageError>
where
    F: FnOnce() -> image::ImageResult<Vec<u8>> + Send + 'static,
{
    task::spawn_blocking(job)
        .await
        .map_err(|e| processing_error(filename, &e))?
        .map_err(|e| processing_error(filename, &e))
}

fn processing_error(filename: &str, err: &impl std::fmt::Display) -> ImageError {
    ImageError::Processing {
        filename: filename.to_string(),
        message: err.to_string(),
    }
}

#[must_use]
pub fn is_allowed(filename: &str) -> bool {
    filename.rsplit_once('.').is_some_and(|(_, ext)| {
        let ext = ext.to_ascii_lowercase();
        IMAGE_EXTENSIONS.contains(&ext.as_str())
    })
}

/// Reduces a client-supplied name to a flat, ASCII-only filename.
///
/// Directory separators and whitespace collapse to `_`, other characters
/// outside `[A-Za-z0-9_.-]` are dropped, leading/trailing dots and underscores
/// are trimmed, and the extension is lowercased.
#[must_use]
pub fn secure_filename(name: &str) -> Option<String> {
    let flattened: String = name
        .chars()
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = flattened.split_whitespace().collect::<Vec<_>>().join("_");

    let cleaned: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    let cleaned = cleaned.trim_matches(|c| c == '.' || c == '_');
    if cleaned.is_empty() {
        return None;
    }

    Some(match cleaned.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}.{}", ext.to_ascii_lowercase()),
        None => cleaned.to_string(),
    })
}

/// Shrinks to fit a `max`x`max` box, preserving aspect ratio. Never upscales.
#[must_use]
pub fn fit_within(img: DynamicImage, max: u32) -> DynamicImage {
    if img.width() <= max && img.height() <= max {
        return img;
    }

    img.resize(max, max, FilterType::CatmullRom)
}

fn prepare_upload(data: &[u8], format: ImageFormat) -> image::ImageResult<Vec<u8>> {
    let img = image::load_from_memory(data)?;
    let img = fit_within(img, images::MAX_DIMENSION);
    encode(&img, format, images::UPLOAD_QUALITY)
}

/// Encodes `img` as `format`. `quality` applies to JPEG; PNG always uses the
/// best compression and WebP is written lossless.
pub fn encode(img: &DynamicImage, format: ImageFormat, quality: u8) -> image::ImageResult<Vec<u8>> {
    let mut out = Vec::new();

    match format {
        ImageFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut out, quality))?;
        }
        ImageFormat::Png => {
            let img = png_compatible(img);
            img.write_with_encoder(PngEncoder::new_with_quality(
                &mut out,
                CompressionType::Best,
                PngFilter::Adaptive,
            ))?;
        }
        ImageFormat::WebP => {
            let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
            rgba.write_with_encoder(WebPEncoder::new_lossless(&mut out))?;
        }
        ImageFormat::Gif => {
            let mut encoder = GifEncoder::new(&mut out);
            encoder.encode_frame(Frame::new(img.to_rgba8()))?;
        }
        other => {
            return Err(image::ImageError::Unsupported(UnsupportedError::from(
                ImageFormatHint::Exact(other),
            )));
        }
    }

    Ok(out)
}

fn png_compatible(img: &DynamicImage) -> Cow<'_, DynamicImage> {
    if matches!(img.color(), ColorType::Rgb32F | ColorType::Rgba32F) {
        Cow::Owned(DynamicImage::ImageRgba8(img.to_rgba8()))
    } else {
        Cow::Borrowed(img)
    }
}

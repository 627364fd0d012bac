//! Format-aware image recompression.
//!
//! JPEG is re-encoded at a fixed quality, PNG is quantized to an indexed
//! palette and GIF frames are re-encoded. Whatever happens, the caller gets
//! bytes no larger than the input: failures and size regressions fall back to
//! the original data.

use std::io::Cursor;

use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::codecs::jpeg::JpegEncoder;
use image::{AnimationDecoder, DynamicImage, ImageFormat};

/// Compression parameters.
#[derive(Debug, Clone, Copy)]
pub struct CompressionSettings {
    /// JPEG quality (1-100).
    pub jpeg_quality: u8,
    /// Minimum acceptable PNG quantization quality (0-100).
    pub png_quality_min: u8,
    /// Target PNG quantization quality (0-100).
    pub png_quality_max: u8,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self {
            jpeg_quality: 80,
            png_quality_min: 60,
            png_quality_max: 80,
        }
    }
}

/// Error recompressing an image.
#[derive(Debug, thiserror::Error)]
pub enum CompressError {
    #[error("unrecognized image format")]
    UnknownFormat,
    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),
    #[error("quantization failed: {0}")]
    Quantize(#[from] imagequant::Error),
    #[error("PNG encoding failed: {0}")]
    PngEncode(#[from] png::EncodingError),
}

/// Recompress `bytes`, returning the smaller of the result and the input.
///
/// Formats without a compression strategy are returned unchanged.
pub fn compress(bytes: &[u8], settings: &CompressionSettings) -> Vec<u8> {
    match try_compress(bytes, settings) {
        Ok(Some(compressed)) if compressed.len() < bytes.len() => {
            tracing::debug!(
                before = bytes.len(),
                after = compressed.len(),
                "Compressed image"
            );
            compressed
        }
        Ok(_) => bytes.to_vec(),
        Err(e) => {
            tracing::warn!(error = %e, "Image compression failed, keeping original bytes");
            bytes.to_vec()
        }
    }
}

/// Recompress according to the detected format.
///
/// Returns `Ok(None)` when the format is left as is.
fn try_compress(
    bytes: &[u8],
    settings: &CompressionSettings,
) -> Result<Option<Vec<u8>>, CompressError> {
    let format = image::guess_format(bytes).map_err(|_| CompressError::UnknownFormat)?;
    match format {
        ImageFormat::Jpeg => compress_jpeg(bytes, settings.jpeg_quality).map(Some),
        ImageFormat::Png => {
            compress_png(bytes, settings.png_quality_min, settings.png_quality_max).map(Some)
        }
        ImageFormat::Gif => compress_gif(bytes).map(Some),
        _ => Ok(None),
    }
}

fn compress_jpeg(bytes: &[u8], quality: u8) -> Result<Vec<u8>, CompressError> {
    let img = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)?;
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());

    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, quality);
    rgb.write_with_encoder(encoder)?;
    Ok(out)
}

fn compress_png(bytes: &[u8], quality_min: u8, quality_max: u8) -> Result<Vec<u8>, CompressError> {
    let rgba = image::load_from_memory_with_format(bytes, ImageFormat::Png)?.to_rgba8();
    let (width, height) = rgba.dimensions();

    let pixels: Vec<imagequant::RGBA> = rgba
        .pixels()
        .map(|p| imagequant::RGBA::new(p[0], p[1], p[2], p[3]))
        .collect();

    let mut attributes = imagequant::new();
    attributes.set_quality(quality_min, quality_max)?;
    let mut liq_image = attributes.new_image(pixels, width as usize, height as usize, 0.0)?;
    let mut quantized = attributes.quantize(&mut liq_image)?;
    quantized.set_dithering_level(1.0)?;
    let (palette, indices) = quantized.remapped(&mut liq_image)?;

    let mut rgb_palette = Vec::with_capacity(palette.len() * 3);
    let mut alpha = Vec::with_capacity(palette.len());
    for color in &palette {
        rgb_palette.extend_from_slice(&[color.r, color.g, color.b]);
        alpha.push(color.a);
    }

    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Indexed);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_palette(rgb_palette);
        if alpha.iter().any(|&a| a != u8::MAX) {
            encoder.set_trns(alpha);
        }
        encoder.set_compression(png::Compression::Best);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&indices)?;
        writer.finish()?;
    }
    Ok(out)
}

fn compress_gif(bytes: &[u8]) -> Result<Vec<u8>, CompressError> {
    let decoder = GifDecoder::new(Cursor::new(bytes))?;
    let frames = decoder.into_frames().collect_frames()?;

    let mut out = Vec::new();
    {
        let mut encoder = GifEncoder::new_with_speed(&mut out, 10);
        if frames.len() > 1 {
            encoder.set_repeat(Repeat::Infinite)?;
        }
        encoder.encode_frames(frames)?;
    }
    Ok(out)
}

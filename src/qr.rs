use std::path::Path;

use image::{Rgb, RgbImage};
use qrcode::types::QrError;
use qrcode::{Color, EcLevel, QrCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// QR error-correction level, config-file friendly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCorrection {
    L,
    M,
    Q,
    H,
}

impl From<ErrorCorrection> for EcLevel {
    fn from(level: ErrorCorrection) -> Self {
        match level {
            ErrorCorrection::L => EcLevel::L,
            ErrorCorrection::M => EcLevel::M,
            ErrorCorrection::Q => EcLevel::Q,
            ErrorCorrection::H => EcLevel::H,
        }
    }
}

/// Visual parameters for generated QR images.
///
/// One configured value is used everywhere a code is rendered, so single-file
/// and batch generation produce identical images for the same payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Target image width in pixels
    #[serde(default = "default_width")]
    pub width: u32,

    /// Quiet-zone margin in modules
    #[serde(default = "default_margin")]
    pub margin: u32,

    /// Error-correction level
    #[serde(default = "default_ec_level")]
    pub ec_level: ErrorCorrection,

    /// Foreground color as a hex string, e.g. "#000000"
    #[serde(default = "default_dark")]
    pub dark: String,

    /// Background color as a hex string, e.g. "#FFFFFF"
    #[serde(default = "default_light")]
    pub light: String,
}

fn default_width() -> u32 {
    300
}

fn default_margin() -> u32 {
    1
}

fn default_ec_level() -> ErrorCorrection {
    ErrorCorrection::H
}

fn default_dark() -> String {
    "#000000".to_string()
}

fn default_light() -> String {
    "#FFFFFF".to_string()
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: default_width(),
            margin: default_margin(),
            ec_level: default_ec_level(),
            dark: default_dark(),
            light: default_light(),
        }
    }
}

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("invalid hex color: {0}")]
    InvalidColor(String),

    #[error("QR encoding error: {0}")]
    Qr(#[from] QrError),

    #[error("image write error: {0}")]
    Image(#[from] image::ImageError),
}

/// QR-encoding collaborator boundary.
///
/// One attempt per call, no retry. Injected into the batch generator so the
/// core can be exercised without disk or image I/O.
pub trait QrEncoder: Send + Sync {
    fn encode_to_file(
        &self,
        path: &Path,
        payload: &str,
        options: &RenderOptions,
    ) -> Result<(), EncodeError>;
}

/// Production encoder: builds the QR symbol with the `qrcode` crate and
/// rasterizes it to a PNG with the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct PngQrEncoder;

impl QrEncoder for PngQrEncoder {
    fn encode_to_file(
        &self,
        path: &Path,
        payload: &str,
        options: &RenderOptions,
    ) -> Result<(), EncodeError> {
        let code = QrCode::with_error_correction_level(payload, options.ec_level.into())?;
        let img = rasterize(&code, options)?;
        img.save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }
}

/// Paint the module matrix into an RGB image.
///
/// Each module gets an integral pixel size, so the output is the largest
/// multiple of the module grid that fits the configured width (never below
/// one pixel per module).
fn rasterize(code: &QrCode, options: &RenderOptions) -> Result<RgbImage, EncodeError> {
    let dark = parse_hex_color(&options.dark)
        .ok_or_else(|| EncodeError::InvalidColor(options.dark.clone()))?;
    let light = parse_hex_color(&options.light)
        .ok_or_else(|| EncodeError::InvalidColor(options.light.clone()))?;

    let modules = code.width() as u32;
    let total = modules + 2 * options.margin;
    let scale = (options.width / total).max(1);
    let size = total * scale;

    let colors = code.to_colors();
    let mut img = RgbImage::from_pixel(size, size, light);

    for y in 0..modules {
        for x in 0..modules {
            if colors[(y * modules + x) as usize] == Color::Dark {
                let px = (x + options.margin) * scale;
                let py = (y + options.margin) * scale;
                for dy in 0..scale {
                    for dx in 0..scale {
                        img.put_pixel(px + dx, py + dy, dark);
                    }
                }
            }
        }
    }

    Ok(img)
}

fn parse_hex_color(value: &str) -> Option<Rgb<u8>> {
    let hex = value.strip_prefix('#').unwrap_or(value);
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Rgb([r, g, b]))
}

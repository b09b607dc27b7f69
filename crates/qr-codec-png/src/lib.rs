//! PNG bindings for the core codec: renders an encoded symbol to PNG bytes
//! through the `image` crate, and adapts already-decoded images into the raw
//! pixel buffers the core decoder consumes.

use std::io::Cursor;

use image::{DynamicImage, ImageBuffer, ImageFormat, Luma};
use qr_codec::{DecodeOptions, EccLevel, EncodeOptions, PixelBuf, QrCode};
use serde::{Deserialize, Serialize};

mod error;

pub use error::QrPngError;

/// Serializable error correction level for request payloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EccArg {
    Low,
    #[default]
    Medium,
    Quartile,
    High,
}

impl From<EccArg> for EccLevel {
    fn from(arg: EccArg) -> Self {
        match arg {
            EccArg::Low => EccLevel::Low,
            EccArg::Medium => EccLevel::Medium,
            EccArg::Quartile => EccLevel::Quartile,
            EccArg::High => EccLevel::High,
        }
    }
}

/// One PNG generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PngRequest {
    pub text: String,
    #[serde(default)]
    pub ecc: EccArg,
    #[serde(default = "default_border")]
    pub border: u32,
    #[serde(default = "default_scale")]
    pub scale: u32,
}

fn default_border() -> u32 {
    2
}

fn default_scale() -> u32 {
    8
}

/// Encodes the request text and renders a grayscale PNG.
pub fn render_png(req: &PngRequest) -> Result<Vec<u8>, QrPngError> {
    if req.text.is_empty() {
        return Err(QrPngError::InvalidRequest("empty text".into()));
    }
    let qr = QrCode::encode(
        &req.text,
        &EncodeOptions {
            ecc: req.ecc.into(),
            ..Default::default()
        },
    )?;
    let art = qr.to_bitmap(req.border, req.scale)?;
    let png = ImageBuffer::from_fn(art.width(), art.height(), |x, y| {
        if matches!(art.get(x as i32, y as i32), Ok(c) if c.is_dark()) {
            Luma([0u8])
        } else {
            Luma([255u8])
        }
    });
    let mut w = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(png).write_to(&mut w, ImageFormat::Png)?;
    Ok(w.into_inner())
}

/// Decodes a QR Code from an image the `image` crate has already loaded.
pub fn decode_image(img: &DynamicImage, opts: &DecodeOptions) -> Result<String, QrPngError> {
    let rgb = img.to_rgb8();
    let buf = PixelBuf {
        width: rgb.width() as usize,
        height: rgb.height() as usize,
        data: rgb.as_raw(),
    };
    Ok(qr_codec::decode(&buf, opts)?)
}

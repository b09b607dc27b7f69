use image::ImageError;
use qr_codec::QrError;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QrPngError {
    #[error("image error: {0}")]
    Image(#[from] ImageError),

    #[error("qr error: {0}")]
    Qr(#[from] QrError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

//! Shipping label generation.
//!
//! A label is the tracking code encoded as a QR PNG, base64 encoded so it can
//! be embedded as a data URI by the dashboard.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat, Luma};
use qrcode::QrCode;
use serde::Serialize;
use std::io::Cursor;

/// Minimum rendered size of the QR image in pixels
const MIN_LABEL_SIZE: u32 = 200;

#[derive(Debug, thiserror::Error)]
pub enum LabelError {
    #[error("QR encoding failed: {0}")]
    Encode(#[from] qrcode::types::QrError),

    #[error("PNG encoding failed: {0}")]
    Image(#[from] image::ImageError),
}

/// Generated QR label for a package
#[derive(Debug, Clone, Serialize)]
pub struct ShippingLabel {
    pub tracking_code: String,
    pub mime_type: &'static str,
    pub qr_png_base64: String,
    /// Ready to use as an `<img src>`
    pub data_uri: String,
}

/// Render the QR label for a tracking code.
pub fn qr_label(tracking_code: &str) -> Result<ShippingLabel, LabelError> {
    let code = QrCode::new(tracking_code.as_bytes())?;
    let img = code
        .render::<Luma<u8>>()
        .min_dimensions(MIN_LABEL_SIZE, MIN_LABEL_SIZE)
        .build();

    let mut png = Vec::new();
    DynamicImage::ImageLuma8(img).write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

    let mime_type = "image/png";
    let qr_png_base64 = STANDARD.encode(&png);
    Ok(ShippingLabel {
        tracking_code: tracking_code.to_string(),
        mime_type,
        data_uri: format!("data:{};base64,{}", mime_type, qr_png_base64),
        qr_png_base64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qr_label_is_png() {
        let label = qr_label("MIA-12345678").unwrap();
        let bytes = STANDARD.decode(&label.qr_png_base64).unwrap();

        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        assert_eq!(label.tracking_code, "MIA-12345678");
    }

    #[test]
    fn test_qr_label_data_uri() {
        let label = qr_label("BOG-00000042").unwrap();
        assert!(label.data_uri.starts_with("data:image/png;base64,iVBOR"));
        assert!(label.data_uri.ends_with(&label.qr_png_base64));
    }
}

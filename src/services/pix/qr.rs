// src/services/pix/qr.rs

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageBuffer, ImageOutputFormat, Luma};
use qrcode::{EcLevel, QrCode};

use crate::common::error::AppError;

pub const QR_MIN_SIZE: u32 = 256;

/// QR Code com correção de erro alta (H), para continuar legível impresso pequeno.
pub fn render_image(payload: &str) -> Result<ImageBuffer<Luma<u8>, Vec<u8>>, AppError> {
    let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::H)
        .map_err(|e| AppError::QrCodeError(e.to_string()))?;

    Ok(code
        .render::<Luma<u8>>()
        .min_dimensions(QR_MIN_SIZE, QR_MIN_SIZE)
        .build())
}

pub fn render_png(payload: &str) -> Result<Vec<u8>, AppError> {
    let image = DynamicImage::ImageLuma8(render_image(payload)?);
    let mut png = Vec::new();
    image
        .write_to(&mut png, ImageOutputFormat::Png)
        .map_err(|e| AppError::QrCodeError(e.to_string()))?;
    Ok(png)
}

pub fn render_data_url(payload: &str) -> Result<String, AppError> {
    let png = render_png(payload)?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
}

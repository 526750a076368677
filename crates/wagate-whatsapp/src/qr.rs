//! QR code rendering for the pairing bootstrap.

use qrcode::{Color, EcLevel, QrCode};

use wagate_core::error::GateError;

/// Render QR data for terminal display using Unicode half-block characters.
///
/// Each output line packs two module rows into `▀`, `▄`, `█`, and space,
/// halving the height compared to a naive renderer.
pub fn generate_qr_terminal(qr_data: &str) -> Result<String, GateError> {
    let code = QrCode::with_error_correction_level(qr_data.as_bytes(), EcLevel::L)
        .map_err(|e| GateError::Session(format!("QR generation failed: {e}")))?;

    let width = code.width();
    let modules: Vec<Color> = code.into_colors();
    let dark = |row: usize, col: usize| {
        row < width && col < width && modules[row * width + col] == Color::Dark
    };

    let mut out = String::new();
    for row in (0..width).step_by(2) {
        for col in 0..width {
            out.push(match (dark(row, col), dark(row + 1, col)) {
                (true, true) => '█',
                (true, false) => '▀',
                (false, true) => '▄',
                (false, false) => ' ',
            });
        }
        out.push('\n');
    }

    Ok(out)
}

/// Render QR data as PNG bytes (for the pairing endpoint).
pub fn generate_qr_image(qr_data: &str) -> Result<Vec<u8>, GateError> {
    use image::{ImageBuffer, Luma};

    let code = QrCode::with_error_correction_level(qr_data.as_bytes(), EcLevel::L)
        .map_err(|e| GateError::Session(format!("QR generation failed: {e}")))?;

    const MODULE_PX: u32 = 10;
    const QUIET_ZONE: u32 = 2;

    let modules = code.width() as u32;
    let size = (modules + QUIET_ZONE * 2) * MODULE_PX;

    let img = ImageBuffer::from_fn(size, size, |x, y| {
        let mx = x / MODULE_PX;
        let my = y / MODULE_PX;
        let in_quiet_zone = mx < QUIET_ZONE
            || my < QUIET_ZONE
            || mx >= modules + QUIET_ZONE
            || my >= modules + QUIET_ZONE;

        if in_quiet_zone {
            Luma([255u8])
        } else {
            match code[((mx - QUIET_ZONE) as usize, (my - QUIET_ZONE) as usize)] {
                Color::Dark => Luma([0u8]),
                Color::Light => Luma([255u8]),
            }
        }
    });

    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .map_err(|e| GateError::Session(format!("PNG encoding failed: {e}")))?;

    Ok(buf.into_inner())
}

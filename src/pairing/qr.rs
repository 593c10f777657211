//! QR rendering with half-block characters, two modules per text row.

use qrcode::types::QrError;
use qrcode::{Color, QrCode};

/// Light border around the code, in modules.
pub const QUIET_ZONE: usize = 2;

/// Render `data` as text rows. Light modules are drawn, dark ones left
/// blank, so the code reads correctly on a dark terminal background.
///
/// # Errors
///
/// Returns a [`QrError`] when the data does not fit in a QR code.
pub fn qr_rows(data: &str) -> Result<Vec<String>, QrError> {
    let code = QrCode::new(data.as_bytes())?;
    let width = code.width();
    let colors = code.to_colors();
    let size = width + 2 * QUIET_ZONE;

    let is_light = |x: usize, y: usize| -> bool {
        if y >= size {
            return false;
        }
        let inside = (QUIET_ZONE..width + QUIET_ZONE).contains(&x)
            && (QUIET_ZONE..width + QUIET_ZONE).contains(&y);
        if !inside {
            return true;
        }
        colors[(y - QUIET_ZONE) * width + (x - QUIET_ZONE)] == Color::Light
    };

    let rows = (0..size)
        .step_by(2)
        .map(|y| {
            (0..size)
                .map(|x| match (is_light(x, y), is_light(x, y + 1)) {
                    (true, true) => '█',
                    (true, false) => '▀',
                    (false, true) => '▄',
                    (false, false) => ' ',
                })
                .collect()
        })
        .collect();
    Ok(rows)
}

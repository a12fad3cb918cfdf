use image::Rgb;

/// Convert one full-range YCbCr sample to RGB using the JPEG (BT.601) coefficients.
///
/// Each channel is rounded half away from zero (`f64::round`) and clamped to
/// `[0, 255]` before narrowing, so out-of-gamut inputs saturate instead of wrapping.
pub fn ycbcr_to_rgb(y: u8, cb: u8, cr: u8) -> Rgb<u8> {
    let y = y as f64;
    let cb = cb as f64 - 128.0;
    let cr = cr as f64 - 128.0;

    let r = y + 1.402 * cr;
    let g = y - 0.344136 * cb - 0.714136 * cr;
    let b = y + 1.772 * cb;

    Rgb([to_channel(r), to_channel(g), to_channel(b)])
}

fn to_channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

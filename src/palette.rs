use crate::ir::Color;

/// Default qualitative palette of the interactive backend.
pub static INTERACTIVE: [Color; 10] = [
    Color(0x63, 0x6e, 0xfa),
    Color(0xef, 0x55, 0x3b),
    Color(0x00, 0xcc, 0x96),
    Color(0xab, 0x63, 0xfa),
    Color(0xff, 0xa1, 0x5a),
    Color(0x19, 0xd3, 0xf3),
    Color(0xff, 0x66, 0x92),
    Color(0xb6, 0xe8, 0x80),
    Color(0xff, 0x97, 0xff),
    Color(0xfe, 0xcb, 0x52),
];

/// Default qualitative palette of the static backend.
pub static STATIC: [Color; 10] = [
    Color(0x1f, 0x77, 0xb4),
    Color(0xff, 0x7f, 0x0e),
    Color(0x2c, 0xa0, 0x2c),
    Color(0xd6, 0x27, 0x28),
    Color(0x94, 0x67, 0xbd),
    Color(0x8c, 0x56, 0x4b),
    Color(0xe3, 0x77, 0xc2),
    Color(0x7f, 0x7f, 0x7f),
    Color(0xbc, 0xbd, 0x22),
    Color(0x17, 0xbe, 0xcf),
];

pub fn cycle(palette: &[Color], i: usize) -> Color {
    palette[i % palette.len()]
}

const VIRIDIS: [Color; 9] = [
    Color(0x44, 0x01, 0x54),
    Color(0x47, 0x2d, 0x7b),
    Color(0x3b, 0x52, 0x8b),
    Color(0x2c, 0x72, 0x8e),
    Color(0x21, 0x91, 0x8c),
    Color(0x28, 0xae, 0x80),
    Color(0x5e, 0xc9, 0x62),
    Color(0xad, 0xdc, 0x30),
    Color(0xfd, 0xe7, 0x25),
];

const COOLWARM: [Color; 9] = [
    Color(0x3b, 0x4c, 0xc0),
    Color(0x5d, 0x7c, 0xe6),
    Color(0x82, 0xa6, 0xfb),
    Color(0xaa, 0xc7, 0xfd),
    Color(0xdd, 0xdc, 0xdc),
    Color(0xf7, 0xb8, 0x9c),
    Color(0xf4, 0x98, 0x7a),
    Color(0xde, 0x60, 0x4d),
    Color(0xb4, 0x04, 0x26),
];

/// Drawn for cells whose value is undefined.
pub const NEUTRAL: Color = Color(0xd9, 0xd9, 0xd9);

fn interpolate(stops: &[Color], t: f64) -> Color {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.5 };
    let pos = t * (stops.len() - 1) as f64;
    let i = (pos.floor() as usize).min(stops.len() - 2);
    let w = pos - i as f64;
    let (a, b) = (stops[i], stops[i + 1]);
    let mix = |x: u8, y: u8| (x as f64 * (1.0 - w) + y as f64 * w).round() as u8;
    Color(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

pub fn viridis(t: f64) -> Color {
    interpolate(&VIRIDIS, t)
}

pub fn coolwarm(t: f64) -> Color {
    interpolate(&COOLWARM, t)
}

/// Parse a named or hex color.
pub fn parse_color(color_str: &str) -> Option<Color> {
    let color_str = color_str.trim();

    if color_str.starts_with('#') {
        return parse_hex_color(color_str);
    }

    match color_str.to_lowercase().as_str() {
        "white" => Some(Color(255, 255, 255)),
        "black" => Some(Color(0, 0, 0)),
        "red" => Some(Color(255, 0, 0)),
        "green" => Some(Color(0, 128, 0)),
        "blue" => Some(Color(0, 0, 255)),
        "orange" => Some(Color(255, 165, 0)),
        "purple" => Some(Color(128, 0, 128)),
        "gray" | "grey" => Some(Color(128, 128, 128)),
        "lightgray" | "lightgrey" => Some(Color(192, 192, 192)),
        _ => None,
    }
}

fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.trim_start_matches('#');
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Color(r, g, b))
        }
        3 => {
            let r = u8::from_str_radix(&hex[0..1], 16).ok()? * 17;
            let g = u8::from_str_radix(&hex[1..2], 16).ok()? * 17;
            let b = u8::from_str_radix(&hex[2..3], 16).ok()? * 17;
            Some(Color(r, g, b))
        }
        _ => None,
    }
}

//! Color literal resolution.
//!
//! Color literals are carried symbolically through compilation and resolved
//! here at population time, not at compile time.

/// Resolve a color literal to RGBA components in 0..=1.
///
/// Accepts `#RGB`, `#RRGGBB`, `#RRGGBBAA` and a small set of named colors.
pub fn resolve(literal: &str) -> Option<[f32; 4]> {
    let literal = literal.trim();
    if let Some(hex) = literal.strip_prefix('#') {
        return resolve_hex(hex);
    }
    named(literal)
}

fn resolve_hex(hex: &str) -> Option<[f32; 4]> {
    let nibble = |i: usize| u8::from_str_radix(hex.get(i..i + 1)?, 16).ok();
    let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    let (r, g, b, a) = match hex.len() {
        3 => {
            let (r, g, b) = (nibble(0)?, nibble(1)?, nibble(2)?);
            (r * 17, g * 17, b * 17, 255)
        }
        6 => (byte(0)?, byte(2)?, byte(4)?, 255),
        8 => (byte(0)?, byte(2)?, byte(4)?, byte(6)?),
        _ => return None,
    };
    Some([
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        a as f32 / 255.0,
    ])
}

fn named(name: &str) -> Option<[f32; 4]> {
    let rgba = match name.to_lowercase().as_str() {
        "white" => [1.0, 1.0, 1.0, 1.0],
        "black" => [0.0, 0.0, 0.0, 1.0],
        "red" => [1.0, 0.0, 0.0, 1.0],
        "green" => [0.0, 1.0, 0.0, 1.0],
        "blue" => [0.0, 0.0, 1.0, 1.0],
        "gray" | "grey" => [0.5, 0.5, 0.5, 1.0],
        "transparent" => [0.0, 0.0, 0.0, 0.0],
        _ => return None,
    };
    Some(rgba)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_colors_are_case_insensitive() {
        assert_eq!(resolve("White"), Some([1.0, 1.0, 1.0, 1.0]));
        assert_eq!(resolve("RED"), Some([1.0, 0.0, 0.0, 1.0]));
    }

    #[test]
    fn six_digit_hex() {
        assert_eq!(resolve("#ff0000"), Some([1.0, 0.0, 0.0, 1.0]));
        assert_eq!(resolve("#000000"), Some([0.0, 0.0, 0.0, 1.0]));
    }

    #[test]
    fn short_and_alpha_hex() {
        assert_eq!(resolve("#fff"), Some([1.0, 1.0, 1.0, 1.0]));
        assert_eq!(resolve("#ff000080"), resolve("#ff0000").map(|mut c| {
            c[3] = 128.0 / 255.0;
            c
        }));
    }

    #[test]
    fn unknown_literals_do_not_resolve() {
        assert_eq!(resolve("chartreuse-ish"), None);
        assert_eq!(resolve("#zzz"), None);
        assert_eq!(resolve("#12345"), None);
    }
}

//! Literal converters for the specialized value shapes.
//!
//! Each converter wraps the shared component sub-grammar (comma-separated
//! decimal numbers) and applies the shape rules:
//!
//! - vec2: exactly two components
//! - box4: one component broadcast to all four sides, two components
//!   interpreted as (horizontal, vertical), or four components verbatim

/// Parse the comma-separated component sub-grammar. `None` on any
/// malformed component or an empty literal.
fn parse_components(text: &str) -> Option<Vec<f32>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    text.split(',')
        .map(|part| part.trim().parse::<f32>().ok())
        .collect()
}

pub fn parse_float(text: &str) -> Option<f32> {
    match parse_components(text)?.as_slice() {
        [v] => Some(*v),
        _ => None,
    }
}

pub fn parse_vec2(text: &str) -> Option<[f32; 2]> {
    match parse_components(text)?.as_slice() {
        [x, y] => Some([*x, *y]),
        _ => None,
    }
}

pub fn parse_box4(text: &str) -> Option<[f32; 4]> {
    match parse_components(text)?.as_slice() {
        [u] => Some([*u, *u, *u, *u]),
        [h, v] => Some([*h, *v, *h, *v]),
        [a, b, c, d] => Some([*a, *b, *c, *d]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box4_broadcasts_single_component() {
        assert_eq!(parse_box4("4"), Some([4.0, 4.0, 4.0, 4.0]));
    }

    #[test]
    fn box4_mirrors_two_components() {
        assert_eq!(parse_box4("2,4"), Some([2.0, 4.0, 2.0, 4.0]));
    }

    #[test]
    fn box4_takes_four_components_verbatim() {
        assert_eq!(parse_box4("1,2,3,4"), Some([1.0, 2.0, 3.0, 4.0]));
    }

    #[test]
    fn box4_rejects_other_counts() {
        assert_eq!(parse_box4("1,2,3"), None);
        assert_eq!(parse_box4(""), None);
        assert_eq!(parse_box4("1,2,3,4,5"), None);
    }

    #[test]
    fn vec2_parses_fractional_components() {
        assert_eq!(parse_vec2("1.5,2.5"), Some([1.5, 2.5]));
        assert_eq!(parse_vec2(" 1.5 , 2.5 "), Some([1.5, 2.5]));
    }

    #[test]
    fn vec2_requires_exactly_two() {
        assert_eq!(parse_vec2("1.5"), None);
        assert_eq!(parse_vec2("1,2,3"), None);
    }

    #[test]
    fn malformed_component_fails_the_literal() {
        assert_eq!(parse_box4("1,x"), None);
        assert_eq!(parse_float("wide"), None);
    }

    #[test]
    fn float_is_a_single_component() {
        assert_eq!(parse_float("0.25"), Some(0.25));
        assert_eq!(parse_float("1,2"), None);
    }
}

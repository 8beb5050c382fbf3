//! Canonical decimal text for attribute components
//!
//! Attribute tuples are compared through their canonical text, so two values
//! that agree to six fractional digits are the same vertex.

/// Fractional digits kept by the canonical form
pub const FRACTION_DIGITS: usize = 6;

/// Format one component: six fractional digits, ties to even, trailing zeros
/// and a bare decimal point trimmed, negative zero written as `0`.
///
/// Unlike a `#.######` decimal pattern, values that round to zero from below
/// give `0` rather than `-0`, so `-0.0000001` and `0` share a key, and a
/// leading `0` is kept (`0.5`, not `.5`).
pub fn format_component(value: f32) -> String {
    let mut text = format!("{:.*}", FRACTION_DIGITS, value);

    if text.contains('.') {
        let trimmed = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(trimmed);
    }

    if text == "-0" {
        text.remove(0);
    }

    text
}

/// Canonical key of a whole tuple (components separated by single spaces)
pub fn canonical_key(components: &[f32]) -> String {
    let mut key = String::with_capacity(components.len() * 10);
    for (i, &c) in components.iter().enumerate() {
        if i > 0 {
            key.push(' ');
        }
        key.push_str(&format_component(c));
    }
    key
}

/// Parse a canonical key back into its components
///
/// Returns `None` if the component count differs from `N` or a component
/// is not a number.
pub fn parse_key<const N: usize>(key: &str) -> Option<[f32; N]> {
    let mut out = [0.0f32; N];
    let mut parts = key.split(' ');
    for slot in out.iter_mut() {
        *slot = parts.next()?.parse().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integers_have_no_fraction() {
        assert_eq!(format_component(1.0), "1");
        assert_eq!(format_component(-3.0), "-3");
        assert_eq!(format_component(0.0), "0");
        assert_eq!(format_component(100.0), "100");
    }

    #[test]
    fn test_trailing_zeros_trimmed() {
        assert_eq!(format_component(0.5), "0.5");
        assert_eq!(format_component(-0.25), "-0.25");
        assert_eq!(format_component(2.125), "2.125");
    }

    #[test]
    fn test_rounds_to_six_digits() {
        assert_eq!(format_component(1.2345678), "1.234568");
        assert_eq!(format_component(0.0009999), "0.001");
        assert_eq!(format_component(0.1), "0.1");
        assert_eq!(format_component(1e-7), "0");
    }

    #[test]
    fn test_negative_zero_normalized() {
        assert_eq!(format_component(-0.0), "0");
        assert_eq!(format_component(-1e-8), "0");
    }

    #[test]
    fn test_canonical_key() {
        assert_eq!(canonical_key(&[1.0, 0.5, -2.0]), "1 0.5 -2");
        assert_eq!(canonical_key(&[0.1234561, 0.1234559]), "0.123456 0.123456");
        assert_eq!(canonical_key(&[]), "");
    }

    #[test]
    fn test_close_values_share_a_key() {
        assert_eq!(
            canonical_key(&[1.0, 2.0, 3.0]),
            canonical_key(&[1.0000001, 2.0000002, 2.9999998])
        );
        assert_ne!(
            canonical_key(&[1.0, 2.0, 3.0]),
            canonical_key(&[1.00001, 2.0, 3.0])
        );
    }

    #[test]
    fn test_parse_key() {
        assert_eq!(parse_key::<3>("1 0.5 -2"), Some([1.0, 0.5, -2.0]));
        assert_eq!(parse_key::<2>("0.25 1"), Some([0.25, 1.0]));
        assert_eq!(parse_key::<3>("1 2"), None);
        assert_eq!(parse_key::<2>("1 2 3"), None);
        assert_eq!(parse_key::<2>("a b"), None);
    }
}

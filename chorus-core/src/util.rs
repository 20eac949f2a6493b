mod id;

pub use id::*;

/// Returns the position clamped into `0..=upper`, if it is a usable number at all.
pub fn clamp_position(position: f32, upper: Option<f32>) -> Option<f32> {
    if !position.is_finite() {
        return None;
    }

    let position = position.max(0.);

    Some(match upper {
        Some(upper) if upper.is_finite() && upper >= 0. => position.min(upper),
        _ => position,
    })
}

#[cfg(test)]
mod test {
    use super::clamp_position;

    #[test]
    fn clamps_positions() {
        assert_eq!(clamp_position(-3., Some(10.)), Some(0.));
        assert_eq!(clamp_position(12., Some(10.)), Some(10.));
        assert_eq!(clamp_position(4.5, None), Some(4.5));
        assert_eq!(clamp_position(f32::NAN, Some(10.)), None);
        assert_eq!(clamp_position(f32::INFINITY, None), None);
    }
}

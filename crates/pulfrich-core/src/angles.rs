//! Pure conversions between visual angle and linear extent.
//!
//! Single precision throughout; the same trig path is used for layout,
//! motion, and tests so results stay bit-reproducible.

/// Linear size subtended by `angle_deg` of visual angle at `distance_m`.
///
/// Treats the angle as a subtense centered on the line of sight, which is the
/// right model for bar width, bar height, and inter-bar spacing.
#[inline]
#[must_use]
pub fn size_from_angle(distance_m: f32, angle_deg: f32) -> f32 {
    2.0 * distance_m * (angle_deg.to_radians() * 0.5).tan()
}

/// Linear displacement of an angular offset `angle_deg` at `distance_m`.
///
/// Treats the angle as measured from the line of sight, which is the right
/// model for vertical offset and horizontal extents.
#[inline]
#[must_use]
pub fn offset_from_angle(distance_m: f32, angle_deg: f32) -> f32 {
    distance_m * angle_deg.to_radians().tan()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f32, b: f32, eps: f32) -> bool {
        (a - b).abs() <= eps
    }

    #[test]
    fn four_degrees_at_fifteen_meters() {
        // 2 * 15 * tan(2 deg)
        assert!(approx_eq(size_from_angle(15.0, 4.0), 1.0476, 1e-3));
    }

    #[test]
    fn subtense_is_twice_the_half_angle_offset() {
        let subtense = size_from_angle(10.0, 6.0);
        let half_offset = offset_from_angle(10.0, 3.0);
        assert!(approx_eq(subtense, 2.0 * half_offset, 1e-5));
    }

    #[test]
    fn monotonic_in_distance() {
        let mut previous_size = 0.0;
        let mut previous_offset = 0.0;
        for step in 1..100 {
            let distance = step as f32 * 0.5;
            let size = size_from_angle(distance, 4.0);
            let offset = offset_from_angle(distance, 4.0);
            assert!(size > previous_size, "size not monotonic at {distance}");
            assert!(offset > previous_offset, "offset not monotonic at {distance}");
            previous_size = size;
            previous_offset = offset;
        }
    }

    #[test]
    fn monotonic_in_angle() {
        let mut previous_size = 0.0;
        let mut previous_offset = 0.0;
        for step in 1..90 {
            let angle = step as f32;
            let size = size_from_angle(5.0, angle);
            let offset = offset_from_angle(5.0, angle * 0.5);
            assert!(size > previous_size, "size not monotonic at {angle}");
            assert!(offset > previous_offset, "offset not monotonic at {angle}");
            previous_size = size;
            previous_offset = offset;
        }
    }

    #[test]
    fn zero_angle_is_zero_extent() {
        assert_eq!(size_from_angle(12.0, 0.0), 0.0);
        assert_eq!(offset_from_angle(12.0, 0.0), 0.0);
    }
}

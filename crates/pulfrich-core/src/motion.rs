//! Constant angular-velocity motion with seamless wrap-around.

use crate::angles::offset_from_angle;
use crate::layout::{BandElement, Direction};

/// Horizontal displacement for one tick, in meters.
#[inline]
#[must_use]
pub fn step_meters(distance_m: f32, speed_deg_per_s: f32, dt: f32, direction: Direction) -> f32 {
    offset_from_angle(distance_m, speed_deg_per_s) * dt * direction.sign()
}

/// Advances every element by `dx` and relocates escapees behind the trailing
/// edge of the remaining set.
///
/// The wrap keeps a running extremum rather than a fixed respawn threshold:
/// at high speed or a long `dt`, several elements can cross the boundary in
/// one tick, and each must land one spacing behind the previous relocation
/// to keep the band evenly spaced.
pub fn advance(
    elements: &mut [BandElement],
    dx: f32,
    extent_m: f32,
    spacing_m: f32,
    direction: Direction,
) {
    if elements.is_empty() {
        return;
    }
    for element in elements.iter_mut() {
        element.x += dx;
    }
    match direction {
        Direction::Rightward => {
            let mut running_min = elements
                .iter()
                .map(|element| element.x)
                .fold(f32::INFINITY, f32::min);
            for element in elements.iter_mut() {
                if element.x > extent_m {
                    element.x = running_min - spacing_m;
                    running_min = element.x;
                }
            }
        }
        Direction::Leftward => {
            let mut running_max = elements
                .iter()
                .map(|element| element.x)
                .fold(f32::NEG_INFINITY, f32::max);
            for element in elements.iter_mut() {
                if element.x < -extent_m {
                    element.x = running_max + spacing_m;
                    running_max = element.x;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StimulusConfig;
    use crate::fov::FovHalves;
    use crate::layout::{BandPool, DerivedGeometry};

    fn band() -> (BandPool, DerivedGeometry) {
        let derived =
            DerivedGeometry::compute(&StimulusConfig::default(), 0.0, FovHalves::FALLBACK);
        let mut pool = BandPool::default();
        pool.resize(derived.required_count);
        pool.lay_out(&derived);
        (pool, derived)
    }

    fn assert_uniformly_spaced(elements: &[BandElement], spacing_m: f32) {
        let mut xs: Vec<f32> = elements.iter().map(|element| element.x).collect();
        xs.sort_by(|a, b| a.partial_cmp(b).expect("finite positions"));
        for pair in xs.windows(2) {
            let step = pair[1] - pair[0];
            assert!(
                (step - spacing_m).abs() < 1e-3,
                "spacing broke: step {step} vs {spacing_m}"
            );
        }
    }

    #[test]
    fn step_scales_with_distance_and_direction() {
        let forward = step_meters(10.0, 20.0, 0.5, Direction::Rightward);
        let backward = step_meters(10.0, 20.0, 0.5, Direction::Leftward);
        assert!(forward > 0.0);
        assert_eq!(forward, -backward);
        assert!(step_meters(20.0, 20.0, 0.5, Direction::Rightward) > forward);
    }

    #[test]
    fn escapee_is_relocated_same_tick() {
        let (mut pool, derived) = band();
        let dx = derived.spacing_m * 0.6;
        // Enough ticks that several elements must have crossed the far edge.
        for _ in 0..64 {
            advance(
                pool.elements_mut(),
                dx,
                derived.extent_m,
                derived.spacing_m,
                Direction::Rightward,
            );
            for element in pool.elements() {
                assert!(
                    element.x <= derived.extent_m + 1e-4,
                    "element left beyond the far edge"
                );
            }
        }
        assert_uniformly_spaced(pool.elements(), derived.spacing_m);
    }

    #[test]
    fn multiple_wraps_in_one_tick_stay_ordered() {
        let (mut pool, derived) = band();
        // A displacement worth several spacings forces simultaneous wraps.
        let dx = derived.spacing_m * 3.5;
        advance(
            pool.elements_mut(),
            dx,
            derived.extent_m,
            derived.spacing_m,
            Direction::Rightward,
        );
        assert_uniformly_spaced(pool.elements(), derived.spacing_m);
        let mut xs: Vec<f32> = pool.elements().iter().map(|element| element.x).collect();
        xs.sort_by(|a, b| a.partial_cmp(b).expect("finite positions"));
        for pair in xs.windows(2) {
            assert!(pair[1] - pair[0] > derived.spacing_m * 0.5, "elements coincide");
        }
    }

    #[test]
    fn leftward_wrap_mirrors_rightward() {
        let (mut pool, derived) = band();
        let dx = -derived.spacing_m * 2.5;
        for _ in 0..32 {
            advance(
                pool.elements_mut(),
                dx,
                derived.extent_m,
                derived.spacing_m,
                Direction::Leftward,
            );
            for element in pool.elements() {
                assert!(element.x >= -derived.extent_m - 1e-4);
            }
        }
        assert_uniformly_spaced(pool.elements(), derived.spacing_m);
    }

    #[test]
    fn count_is_preserved_across_ticks() {
        let (mut pool, derived) = band();
        let before = pool.len();
        for _ in 0..1000 {
            advance(
                pool.elements_mut(),
                derived.spacing_m * 0.9,
                derived.extent_m,
                derived.spacing_m,
                Direction::Rightward,
            );
        }
        assert_eq!(pool.len(), before);
    }
}

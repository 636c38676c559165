//! Band layout: derived geometry and the element pool.

use serde::{Deserialize, Serialize};

use crate::StimulusConfig;
use crate::angles::{offset_from_angle, size_from_angle};
use crate::fov::FovHalves;

/// Angular floor guarding the spacing computation against a zero divisor.
const MIN_SPACING_DEG: f32 = 1e-3;
/// tan(theta) diverges toward 90 degrees; extents are clamped below that.
const MAX_EXTENT_DEG: f32 = 85.0;
/// Extra elements beyond the exact cover so wrap never opens a visible gap
/// under floating-point rounding.
const WRAP_MARGIN: usize = 3;
/// Near-zero depth keeps bar volumes non-degenerate on solid primitives.
pub const DEPTH_EPSILON: f32 = 1e-4;

/// Horizontal drift direction of the band.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Rightward,
    Leftward,
}

impl Direction {
    /// Normalizes the external integer convention: any non-negative input
    /// drifts rightward.
    #[must_use]
    pub const fn from_raw(raw: i32) -> Self {
        if raw >= 0 {
            Self::Rightward
        } else {
            Self::Leftward
        }
    }

    /// Sign multiplier applied to per-tick displacement.
    #[must_use]
    pub const fn sign(self) -> f32 {
        match self {
            Self::Rightward => 1.0,
            Self::Leftward => -1.0,
        }
    }
}

/// Per-trial parameters accepted through `configure`, already normalized.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TrialGeometry {
    /// Signed depth offset relative to the configured base distance.
    pub signed_offset_m: f32,
    /// Normalized drift direction.
    pub direction: Direction,
    /// Angular speed after the configured floor.
    pub speed_deg_per_s: f32,
}

/// Geometry derived from config, trial parameters, and the cached FOV.
///
/// Recomputed wholesale on every configure; never mutated in between.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DerivedGeometry {
    /// Clamped viewing distance of the band plane.
    pub distance_m: f32,
    /// Horizontal half field of view used for this trial.
    pub half_h_deg: f32,
    /// Vertical half field of view used for this trial.
    pub half_v_deg: f32,
    /// Bar width in meters at `distance_m`.
    pub bar_width_m: f32,
    /// Bar height in meters at `distance_m`.
    pub bar_height_m: f32,
    /// Center-to-center spacing between neighboring bars.
    pub spacing_m: f32,
    /// Half width of the covered strip, padding included.
    pub extent_m: f32,
    /// Vertical offset of every bar in the band's local frame.
    pub y_offset_m: f32,
    /// Number of elements needed to cover the strip seamlessly.
    pub required_count: usize,
}

impl DerivedGeometry {
    /// Computes the geometry for one trial.
    #[must_use]
    pub fn compute(config: &StimulusConfig, signed_offset_m: f32, fov: FovHalves) -> Self {
        let distance_m = (config.base_distance_m + signed_offset_m).max(config.min_distance_m);
        let spacing_deg = (config.bar_width_deg + config.gap_deg).max(MIN_SPACING_DEG);
        let spacing_m = size_from_angle(distance_m, spacing_deg);
        let extent_deg = (fov.half_h_deg + config.spawn_padding_deg).min(MAX_EXTENT_DEG);
        let extent_m = offset_from_angle(distance_m, extent_deg);
        let required_count = ((2.0 * extent_m / spacing_m).ceil() as usize + WRAP_MARGIN).max(1);

        Self {
            distance_m,
            half_h_deg: fov.half_h_deg,
            half_v_deg: fov.half_v_deg,
            bar_width_m: size_from_angle(distance_m, config.bar_width_deg),
            bar_height_m: size_from_angle(distance_m, config.visual_height_deg),
            spacing_m,
            extent_m,
            y_offset_m: offset_from_angle(distance_m, config.y_offset_deg),
            required_count,
        }
    }
}

/// One bar, expressed in the band's local frame (X horizontal, Y vertical,
/// the viewpoint looking down local -Z).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandElement {
    pub x: f32,
    pub y: f32,
    pub tilt_deg: f32,
    pub color: [f32; 3],
}

impl BandElement {
    const fn at(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            tilt_deg: 0.0,
            color: [1.0, 1.0, 1.0],
        }
    }
}

/// Ordered, index-stable pool of band elements.
///
/// Resizing only ever appends to or truncates from the tail, so surviving
/// indices keep their identity and the appearance arrays stay aligned.
#[derive(Debug, Clone, Default)]
pub struct BandPool {
    elements: Vec<BandElement>,
}

impl BandPool {
    /// Grows or shrinks the pool to `count` without reordering survivors.
    pub fn resize(&mut self, count: usize) {
        if count < self.elements.len() {
            self.elements.truncate(count);
        } else {
            while self.elements.len() < count {
                self.elements.push(BandElement::at(0.0, 0.0));
            }
        }
    }

    /// Positions every element on the uniform grid `-extent + i * spacing`.
    ///
    /// Tilt and color are left untouched; they belong to the appearance
    /// generator.
    pub fn lay_out(&mut self, geometry: &DerivedGeometry) {
        for (index, element) in self.elements.iter_mut().enumerate() {
            element.x = -geometry.extent_m + index as f32 * geometry.spacing_m;
            element.y = geometry.y_offset_m;
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    #[must_use]
    pub fn elements(&self) -> &[BandElement] {
        &self.elements
    }

    #[must_use]
    pub fn elements_mut(&mut self) -> &mut [BandElement] {
        &mut self.elements
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(offset_m: f32) -> DerivedGeometry {
        DerivedGeometry::compute(&StimulusConfig::default(), offset_m, FovHalves::FALLBACK)
    }

    #[test]
    fn distance_is_floored() {
        let derived = geometry(-100.0);
        assert_eq!(derived.distance_m, 0.05);
        assert!(derived.spacing_m > 0.0);
        assert!(derived.required_count >= 1);
    }

    #[test]
    fn count_covers_extent_with_margin() {
        let derived = geometry(0.0);
        let covered = (derived.required_count - WRAP_MARGIN) as f32 * derived.spacing_m;
        assert!(covered >= 2.0 * derived.extent_m);
        assert!(covered < 2.0 * derived.extent_m + derived.spacing_m);
    }

    #[test]
    fn count_is_stable_as_distance_shrinks() {
        // Spacing and extent scale together, so the count stays put while the
        // band slides toward the floor.
        let far = geometry(0.0);
        let near = geometry(-14.0);
        assert_eq!(far.required_count, near.required_count);
    }

    #[test]
    fn direction_normalization() {
        assert_eq!(Direction::from_raw(1), Direction::Rightward);
        assert_eq!(Direction::from_raw(0), Direction::Rightward);
        assert_eq!(Direction::from_raw(-1), Direction::Leftward);
        assert_eq!(Direction::Rightward.sign(), 1.0);
        assert_eq!(Direction::Leftward.sign(), -1.0);
    }

    #[test]
    fn resize_keeps_tail_discipline() {
        let mut pool = BandPool::default();
        pool.resize(4);
        let derived = geometry(0.0);
        pool.lay_out(&derived);
        pool.elements_mut()[1].tilt_deg = 9.0;

        pool.resize(6);
        assert_eq!(pool.len(), 6);
        assert_eq!(pool.elements()[1].tilt_deg, 9.0, "survivor must keep index");

        pool.resize(2);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.elements()[1].tilt_deg, 9.0);
    }

    #[test]
    fn layout_spans_the_strip_uniformly() {
        let derived = geometry(0.0);
        let mut pool = BandPool::default();
        pool.resize(derived.required_count);
        pool.lay_out(&derived);

        let elements = pool.elements();
        assert!((elements[0].x + derived.extent_m).abs() < 1e-4);
        for pair in elements.windows(2) {
            let step = pair[1].x - pair[0].x;
            assert!((step - derived.spacing_m).abs() < 1e-4);
        }
        let last = elements[elements.len() - 1].x;
        let expected = -derived.extent_m + (elements.len() - 1) as f32 * derived.spacing_m;
        assert!((last - expected).abs() < 1e-4);
    }
}

//! Field-of-view derivation for the active viewpoint.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Viewpoint parameters read from the host at the start of each configure.
///
/// Owned by the host's camera; the engine never mutates it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ViewingContext {
    /// Vertical field of view of the rendering camera.
    pub vertical_fov_deg: f32,
    /// Width over height of the rendered viewport.
    pub aspect_ratio: f32,
    /// World-space viewpoint position.
    pub position: [f32; 3],
    /// Unit forward axis of the viewpoint.
    pub forward: [f32; 3],
}

impl Default for ViewingContext {
    fn default() -> Self {
        Self {
            vertical_fov_deg: 90.0,
            aspect_ratio: 1.0,
            position: [0.0, 0.0, 0.0],
            forward: [0.0, 0.0, 1.0],
        }
    }
}

/// Half field of view on both axes, cached per configure.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FovHalves {
    /// Half of the vertical field of view, degrees.
    pub half_v_deg: f32,
    /// Horizontal half field of view derived from the vertical one and the
    /// aspect ratio, degrees.
    pub half_h_deg: f32,
}

impl FovHalves {
    /// Used when no viewing context has been supplied; wide enough that the
    /// band still fills typical headset optics.
    pub const FALLBACK: Self = Self {
        half_v_deg: 45.0,
        half_h_deg: 60.0,
    };

    /// Derives both half angles from the supplied context.
    #[must_use]
    pub fn from_context(context: &ViewingContext) -> Self {
        let half_v_deg = context.vertical_fov_deg * 0.5;
        let half_h_deg = (half_v_deg.to_radians().tan() * context.aspect_ratio)
            .atan()
            .to_degrees();
        Self {
            half_v_deg,
            half_h_deg,
        }
    }

    /// Prefers the supplied context and falls back with a warning when the
    /// host has not provided one yet. Degraded geometry beats a crash here.
    #[must_use]
    pub fn from_optional(context: Option<&ViewingContext>) -> Self {
        match context {
            Some(context) => Self::from_context(context),
            None => {
                warn!(
                    half_v_deg = Self::FALLBACK.half_v_deg,
                    half_h_deg = Self::FALLBACK.half_h_deg,
                    "no viewing context available; using fallback field of view",
                );
                Self::FALLBACK
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_aspect_keeps_axes_equal() {
        let halves = FovHalves::from_context(&ViewingContext {
            vertical_fov_deg: 80.0,
            aspect_ratio: 1.0,
            ..ViewingContext::default()
        });
        assert!((halves.half_v_deg - 40.0).abs() < 1e-5);
        assert!((halves.half_h_deg - 40.0).abs() < 1e-3);
    }

    #[test]
    fn wider_aspect_widens_horizontal_half() {
        let narrow = FovHalves::from_context(&ViewingContext {
            vertical_fov_deg: 60.0,
            aspect_ratio: 1.0,
            ..ViewingContext::default()
        });
        let wide = FovHalves::from_context(&ViewingContext {
            vertical_fov_deg: 60.0,
            aspect_ratio: 1.8,
            ..ViewingContext::default()
        });
        assert!(wide.half_h_deg > narrow.half_h_deg);
        assert_eq!(wide.half_v_deg, narrow.half_v_deg);
    }

    #[test]
    fn missing_context_falls_back() {
        let halves = FovHalves::from_optional(None);
        assert_eq!(halves.half_v_deg, 45.0);
        assert_eq!(halves.half_h_deg, 60.0);
    }
}

//! Core engine for the Pulfrich stimulus band.
//!
//! Drives a seamlessly wrapping strip of tilted, colored bars at a controlled
//! angular velocity and apparent depth. The host supplies a viewpoint and a
//! rendering backend; trial sequencing, response capture, and logging live in
//! the application crate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod angles;
pub mod appearance;
pub mod backend;
pub mod engine;
pub mod fov;
pub mod layout;
pub mod motion;

pub use appearance::{AppearanceGenerator, AppearancePolicy};
pub use backend::{
    BackendError, BandAnchor, ColorRgba, InstanceHandle, InstanceTransform, RenderBackend,
};
pub use engine::BandStimulus;
pub use fov::{FovHalves, ViewingContext};
pub use layout::{BandElement, BandPool, DerivedGeometry, Direction, TrialGeometry};

/// Errors raised while validating a stimulus configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Indicates an invalid configuration value.
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Static configuration for the stimulus band.
///
/// All angular quantities are in degrees of visual angle; linear quantities
/// are in meters at the viewpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StimulusConfig {
    /// Reference viewing distance of the band plane.
    pub base_distance_m: f32,
    /// Floor applied to the per-trial distance so the band never reaches the
    /// viewpoint.
    pub min_distance_m: f32,
    /// Floor applied to the per-trial angular speed.
    pub min_speed_deg_per_s: f32,
    /// Width of one bar.
    pub bar_width_deg: f32,
    /// Height of one bar.
    pub visual_height_deg: f32,
    /// Gap between neighboring bars.
    pub gap_deg: f32,
    /// Extra angular margin past the half field of view that the band covers,
    /// so wrapping happens offscreen.
    pub spawn_padding_deg: f32,
    /// Vertical angular offset of the whole band.
    pub y_offset_deg: f32,
    /// Per-trial tilt and color policy.
    pub appearance: AppearancePolicy,
    /// Optional seed for reproducible sessions.
    pub rng_seed: Option<u64>,
}

impl Default for StimulusConfig {
    fn default() -> Self {
        Self {
            base_distance_m: 15.0,
            min_distance_m: 0.05,
            min_speed_deg_per_s: 0.01,
            bar_width_deg: 1.0,
            visual_height_deg: 4.0,
            gap_deg: 2.0,
            spawn_padding_deg: 5.0,
            y_offset_deg: 0.0,
            appearance: AppearancePolicy::default(),
            rng_seed: None,
        }
    }
}

impl StimulusConfig {
    /// Validates the configuration before the engine accepts it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_distance_m > 0.0) {
            return Err(ConfigError::Invalid("base_distance_m must be positive"));
        }
        if !(self.min_distance_m > 0.0) {
            return Err(ConfigError::Invalid("min_distance_m must be positive"));
        }
        if !(self.min_speed_deg_per_s > 0.0) {
            return Err(ConfigError::Invalid("min_speed_deg_per_s must be positive"));
        }
        if !(self.bar_width_deg > 0.0) || !(self.visual_height_deg > 0.0) {
            return Err(ConfigError::Invalid("bar dimensions must be positive"));
        }
        if self.gap_deg < 0.0 || self.spawn_padding_deg < 0.0 {
            return Err(ConfigError::Invalid(
                "gap_deg and spawn_padding_deg must be non-negative",
            ));
        }
        if !self.y_offset_deg.is_finite() {
            return Err(ConfigError::Invalid("y_offset_deg must be finite"));
        }
        self.appearance.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        StimulusConfig::default().validate().expect("default config");
    }

    #[test]
    fn rejects_degenerate_geometry() {
        let config = StimulusConfig {
            bar_width_deg: 0.0,
            ..StimulusConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::Invalid("bar dimensions must be positive"))
        );

        let config = StimulusConfig {
            min_distance_m: -1.0,
            ..StimulusConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_negative_gap() {
        let config = StimulusConfig {
            gap_deg: -0.5,
            ..StimulusConfig::default()
        };
        assert!(config.validate().is_err());
    }
}

//! Seeded per-trial appearance: bar tilt and color.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::ConfigError;
use crate::layout::BandElement;

/// Mixing constant separating streams drawn from the same session seed.
const SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// Palette and jitter policy shared by every bar in a trial.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppearancePolicy {
    /// Candidate base colors (linear RGB). When empty, the base color is
    /// sampled in HSV instead.
    pub palette: Vec<[f32; 3]>,
    /// Inclusive tilt range applied per bar, degrees about the view axis.
    pub tilt_range_deg: [f32; 2],
    /// Saturation range for a sampled base color.
    pub saturation_range: [f32; 2],
    /// Value range for a sampled base color.
    pub value_range: [f32; 2],
    /// Per-bar hue jitter, wrapped modulo 1.
    pub hue_jitter: f32,
    /// Per-bar saturation jitter, clamped to [0, 1].
    pub saturation_jitter: f32,
    /// Per-bar value jitter, clamped to [0, 1].
    pub value_jitter: f32,
    /// Whether a changed trial seed forces regeneration even when the
    /// element count is unchanged.
    pub regenerate_on_seed_change: bool,
}

impl Default for AppearancePolicy {
    fn default() -> Self {
        Self {
            palette: Vec::new(),
            tilt_range_deg: [-30.0, 30.0],
            saturation_range: [0.5, 0.9],
            value_range: [0.6, 1.0],
            hue_jitter: 0.04,
            saturation_jitter: 0.1,
            value_jitter: 0.1,
            regenerate_on_seed_change: false,
        }
    }
}

impl AppearancePolicy {
    /// Validates ranges and jitter bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tilt_range_deg[0] > self.tilt_range_deg[1] {
            return Err(ConfigError::Invalid("tilt range is inverted"));
        }
        for range in [self.saturation_range, self.value_range] {
            if range[0] > range[1] || range[0] < 0.0 || range[1] > 1.0 {
                return Err(ConfigError::Invalid(
                    "saturation/value ranges must be ordered within [0, 1]",
                ));
            }
        }
        if self.hue_jitter < 0.0 || self.saturation_jitter < 0.0 || self.value_jitter < 0.0 {
            return Err(ConfigError::Invalid("jitter bounds must be non-negative"));
        }
        Ok(())
    }
}

/// Generates tilt/color arrays aligned 1:1 with the element pool.
///
/// Regeneration is gated on the element count (and optionally the trial
/// seed), so trials that keep their geometry never show a color flash.
#[derive(Debug, Clone, Default)]
pub struct AppearanceGenerator {
    last_count: Option<usize>,
    last_seed: Option<u64>,
    tilts: Vec<f32>,
    colors: Vec<[f32; 3]>,
}

impl AppearanceGenerator {
    /// Regenerates when the gate demands it; returns whether it did.
    pub fn maybe_regenerate(
        &mut self,
        policy: &AppearancePolicy,
        count: usize,
        trial_seed: u64,
    ) -> bool {
        let count_changed = self.last_count != Some(count);
        let seed_changed =
            policy.regenerate_on_seed_change && self.last_seed != Some(trial_seed);
        if !count_changed && !seed_changed {
            return false;
        }
        self.regenerate(policy, count, trial_seed);
        true
    }

    fn regenerate(&mut self, policy: &AppearancePolicy, count: usize, trial_seed: u64) {
        // Local stream: reproducible from (seed, count), independent of any
        // shared RNG the host may run.
        let mut rng = SmallRng::seed_from_u64(trial_seed ^ (count as u64).wrapping_mul(SEED_MIX));
        let [base_h, base_s, base_v] = Self::base_hsv(policy, &mut rng);

        self.tilts.clear();
        self.colors.clear();
        let [tilt_min, tilt_max] = policy.tilt_range_deg;
        for _ in 0..count {
            self.tilts.push(rng.random_range(tilt_min..=tilt_max));
            let h = (base_h + jitter(&mut rng, policy.hue_jitter)).rem_euclid(1.0);
            let s = (base_s + jitter(&mut rng, policy.saturation_jitter)).clamp(0.0, 1.0);
            let v = (base_v + jitter(&mut rng, policy.value_jitter)).clamp(0.0, 1.0);
            self.colors.push(hsv_to_rgb(h, s, v));
        }
        self.last_count = Some(count);
        self.last_seed = Some(trial_seed);
    }

    fn base_hsv(policy: &AppearancePolicy, rng: &mut SmallRng) -> [f32; 3] {
        if policy.palette.is_empty() {
            let [s_min, s_max] = policy.saturation_range;
            let [v_min, v_max] = policy.value_range;
            [
                rng.random_range(0.0..1.0),
                rng.random_range(s_min..=s_max),
                rng.random_range(v_min..=v_max),
            ]
        } else {
            let index = rng.random_range(0..policy.palette.len());
            let [r, g, b] = policy.palette[index];
            rgb_to_hsv(r, g, b)
        }
    }

    /// Writes the generated tilt/color onto the pool by index.
    pub fn apply(&self, elements: &mut [BandElement]) {
        for (index, element) in elements.iter_mut().enumerate() {
            if let (Some(&tilt), Some(&color)) = (self.tilts.get(index), self.colors.get(index)) {
                element.tilt_deg = tilt;
                element.color = color;
            }
        }
    }

    #[must_use]
    pub fn tilts(&self) -> &[f32] {
        &self.tilts
    }

    #[must_use]
    pub fn colors(&self) -> &[[f32; 3]] {
        &self.colors
    }

    /// Element count of the last generation, if any.
    #[must_use]
    pub const fn generated_count(&self) -> Option<usize> {
        self.last_count
    }
}

fn jitter(rng: &mut SmallRng, bound: f32) -> f32 {
    if bound <= 0.0 {
        0.0
    } else {
        rng.random_range(-bound..=bound)
    }
}

/// HSV (h in [0,1)) to linear RGB.
#[must_use]
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [f32; 3] {
    let h = h.rem_euclid(1.0) * 6.0;
    let sector = h.floor();
    let f = h - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match sector as i32 {
        0 => [v, t, p],
        1 => [q, v, p],
        2 => [p, v, t],
        3 => [p, q, v],
        4 => [t, p, v],
        _ => [v, p, q],
    }
}

/// Linear RGB to HSV (h in [0,1)).
#[must_use]
pub fn rgb_to_hsv(r: f32, g: f32, b: f32) -> [f32; 3] {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    let h = if delta <= f32::EPSILON {
        0.0
    } else if max == r {
        ((g - b) / delta).rem_euclid(6.0) / 6.0
    } else if max == g {
        ((b - r) / delta + 2.0) / 6.0
    } else {
        ((r - g) / delta + 4.0) / 6.0
    };
    let s = if max <= f32::EPSILON { 0.0 } else { delta / max };
    [h, s, max]
}

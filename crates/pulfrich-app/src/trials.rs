//! Trial sequencing with randomized ordering and block bookkeeping.

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Binary forced-choice answer: did the band appear behind or in front of
/// the reference plane?
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    Behind,
    Before,
}

impl Response {
    /// Label written to the trial log.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Behind => "BEHIND",
            Self::Before => "BEFORE",
        }
    }
}

/// One presentation in the session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    /// Zero-based position in the shuffled sequence.
    pub index: usize,
    /// Block (repeat) this trial belongs to.
    pub block: usize,
    /// Signed depth offset relative to the base distance.
    pub offset_m: f32,
    /// Raw direction handed to the engine; non-negative drifts rightward.
    pub direction: i32,
    /// Angular speed of the band.
    pub speed_deg_per_s: f32,
}

/// Declarative description of a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionPlan {
    /// Depth offsets presented once per block.
    pub offsets_m: Vec<f32>,
    /// Number of blocks; every offset appears once per block.
    pub repeats: usize,
    /// Angular speed shared by all trials.
    pub speed_deg_per_s: f32,
    /// Alternate drift direction between successive trials.
    pub alternate_direction: bool,
    /// Seed for the per-block shuffle; entropy when absent.
    pub shuffle_seed: Option<u64>,
}

impl Default for SessionPlan {
    fn default() -> Self {
        Self {
            offsets_m: vec![-1.0, -0.5, -0.25, 0.0, 0.25, 0.5, 1.0],
            repeats: 2,
            speed_deg_per_s: 20.0,
            alternate_direction: true,
            shuffle_seed: None,
        }
    }
}

impl SessionPlan {
    /// Expands the plan into a shuffled trial sequence.
    ///
    /// Each block is an independent shuffle of the full offset list, so every
    /// offset is seen once per block and no offset is starved by the
    /// randomization.
    #[must_use]
    pub fn build(&self) -> Vec<Trial> {
        let mut rng = match self.shuffle_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::seed_from_u64(rand::random()),
        };
        let mut trials = Vec::with_capacity(self.offsets_m.len() * self.repeats);
        for block in 0..self.repeats {
            let mut offsets = self.offsets_m.clone();
            offsets.shuffle(&mut rng);
            for offset_m in offsets {
                let index = trials.len();
                let direction = if self.alternate_direction && index % 2 == 1 {
                    -1
                } else {
                    1
                };
                trials.push(Trial {
                    index,
                    block,
                    offset_m,
                    direction,
                    speed_deg_per_s: self.speed_deg_per_s,
                });
            }
        }
        trials
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(seed: u64) -> SessionPlan {
        SessionPlan {
            shuffle_seed: Some(seed),
            ..SessionPlan::default()
        }
    }

    #[test]
    fn every_offset_appears_once_per_block() {
        let plan = plan(3);
        let trials = plan.build();
        assert_eq!(trials.len(), plan.offsets_m.len() * plan.repeats);
        for block in 0..plan.repeats {
            let mut seen: Vec<f32> = trials
                .iter()
                .filter(|trial| trial.block == block)
                .map(|trial| trial.offset_m)
                .collect();
            seen.sort_by(|a, b| a.partial_cmp(b).expect("finite offsets"));
            let mut expected = plan.offsets_m.clone();
            expected.sort_by(|a, b| a.partial_cmp(b).expect("finite offsets"));
            assert_eq!(seen, expected);
        }
    }

    #[test]
    fn same_seed_reproduces_the_order() {
        assert_eq!(plan(11).build(), plan(11).build());
    }

    #[test]
    fn different_seeds_usually_differ() {
        assert_ne!(plan(1).build(), plan(2).build());
    }

    #[test]
    fn direction_alternates_when_enabled() {
        let trials = plan(5).build();
        for trial in &trials {
            let expected = if trial.index % 2 == 1 { -1 } else { 1 };
            assert_eq!(trial.direction, expected);
        }
    }

    #[test]
    fn indexes_are_sequential() {
        let trials = plan(9).build();
        for (position, trial) in trials.iter().enumerate() {
            assert_eq!(trial.index, position);
        }
    }
}

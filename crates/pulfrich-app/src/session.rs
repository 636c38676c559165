//! Runs a full session: configure per trial, tick per frame, log responses.

use anyhow::{Result, bail};
use tracing::info;

use pulfrich_core::BandStimulus;

use crate::log::TrialLog;
use crate::trials::{Response, Trial};

/// Summary of a completed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOutcome {
    pub trials_run: usize,
    pub behind_count: usize,
    pub before_count: usize,
}

/// Drives the engine through a trial sequence at a fixed frame rate.
pub struct SessionRunner {
    engine: BandStimulus,
    frame_rate_hz: f32,
    trial_duration_s: f32,
}

impl SessionRunner {
    #[must_use]
    pub fn new(engine: BandStimulus, frame_rate_hz: f32, trial_duration_s: f32) -> Self {
        Self {
            engine,
            frame_rate_hz,
            trial_duration_s,
        }
    }

    /// Presents every trial and records one response each.
    ///
    /// `responder` is the response-capture seam: it receives the trial and
    /// the realized viewing distance once the presentation ends.
    pub fn run(
        &mut self,
        trials: &[Trial],
        log: &mut TrialLog,
        mut responder: impl FnMut(&Trial, f32) -> Response,
    ) -> Result<SessionOutcome> {
        let dt = 1.0 / self.frame_rate_hz;
        let frames_per_trial = (self.trial_duration_s * self.frame_rate_hz).ceil() as usize;
        let mut behind_count = 0;
        let mut before_count = 0;

        for trial in trials {
            self.engine
                .configure(trial.offset_m, trial.direction, trial.speed_deg_per_s);
            if !self.engine.is_enabled() {
                bail!("stimulus engine disabled during trial {}", trial.index + 1);
            }
            for _ in 0..frames_per_trial {
                self.engine.tick(dt);
            }
            let distance_m = self
                .engine
                .geometry()
                .map(|geometry| geometry.distance_m)
                .unwrap_or_default();
            let response = responder(trial, distance_m);
            match response {
                Response::Behind => behind_count += 1,
                Response::Before => before_count += 1,
            }
            log.record(trial.index, distance_m, response)?;
            info!(
                trial = trial.index + 1,
                block = trial.block,
                distance_m,
                response = response.label(),
                "trial complete"
            );
        }

        Ok(SessionOutcome {
            trials_run: trials.len(),
            behind_count,
            before_count,
        })
    }

    /// Access to the engine, for viewpoint updates between blocks.
    pub fn engine_mut(&mut self) -> &mut BandStimulus {
        &mut self.engine
    }
}

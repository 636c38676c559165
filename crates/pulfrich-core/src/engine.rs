//! The stimulus band engine: configure per trial, tick per frame.

use tracing::{debug, error, info};

use crate::appearance::AppearanceGenerator;
use crate::backend::{BackendError, BandAnchor, InstanceHandle, InstanceTransform, RenderBackend};
use crate::fov::{FovHalves, ViewingContext};
use crate::layout::{BandElement, BandPool, DEPTH_EPSILON, DerivedGeometry, Direction, TrialGeometry};
use crate::motion;
use crate::{ConfigError, StimulusConfig};

/// Drives the repeating band of tilted, colored bars.
///
/// Single-threaded and frame-synchronous: the host calls [`configure`] once
/// per trial between frames and [`tick`] once per rendered frame. A
/// configure fully rebuilds state before returning, so the per-frame update
/// never observes a torn trial.
///
/// [`configure`]: BandStimulus::configure
/// [`tick`]: BandStimulus::tick
pub struct BandStimulus {
    config: StimulusConfig,
    backend: Box<dyn RenderBackend>,
    viewpoint: Option<ViewingContext>,
    fov: FovHalves,
    pool: BandPool,
    appearance: AppearanceGenerator,
    instances: Vec<InstanceHandle>,
    geometry: Option<DerivedGeometry>,
    trial: Option<TrialGeometry>,
    session_seed: u64,
    trial_counter: u64,
    enabled: bool,
}

impl BandStimulus {
    /// Builds an engine around a validated configuration and a backend.
    pub fn new(
        config: StimulusConfig,
        backend: Box<dyn RenderBackend>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let session_seed = match config.rng_seed {
            Some(seed) => seed,
            None => rand::random(),
        };
        Ok(Self {
            config,
            backend,
            viewpoint: None,
            fov: FovHalves::FALLBACK,
            pool: BandPool::default(),
            appearance: AppearanceGenerator::default(),
            instances: Vec::new(),
            geometry: None,
            trial: None,
            session_seed,
            trial_counter: 0,
            enabled: true,
        })
    }

    /// Host pushes the current viewing context; read at the next configure.
    pub fn update_viewpoint(&mut self, context: ViewingContext) {
        self.viewpoint = Some(context);
    }

    /// Configures the band for one trial.
    ///
    /// `direction` follows the external convention: any non-negative value
    /// drifts rightward. Speed is floored at the configured minimum. The call
    /// is synchronous; on return the band is fully laid out for the trial.
    pub fn configure(&mut self, signed_offset_m: f32, direction: i32, speed_deg_per_s: f32) {
        if !self.enabled {
            return;
        }
        let trial = TrialGeometry {
            signed_offset_m,
            direction: Direction::from_raw(direction),
            speed_deg_per_s: speed_deg_per_s.max(self.config.min_speed_deg_per_s),
        };
        self.fov = FovHalves::from_optional(self.viewpoint.as_ref());
        let geometry = DerivedGeometry::compute(&self.config, trial.signed_offset_m, self.fov);

        if let Err(err) = self.rebuild_instances(geometry.required_count) {
            error!(error = %err, backend = self.backend.name(), "band rebuild failed; disabling stimulus");
            self.disable();
            return;
        }

        self.pool.resize(geometry.required_count);
        self.pool.lay_out(&geometry);

        self.trial_counter += 1;
        let trial_seed = self.session_seed.wrapping_add(self.trial_counter);
        let regenerated = self.appearance.maybe_regenerate(
            &self.config.appearance,
            geometry.required_count,
            trial_seed,
        );
        self.appearance.apply(self.pool.elements_mut());

        self.anchor_band(&geometry);
        self.push_colors();
        self.push_transforms(&geometry);

        debug!(
            distance_m = geometry.distance_m,
            elements = geometry.required_count,
            regenerated,
            "band configured"
        );
        self.geometry = Some(geometry);
        self.trial = Some(trial);
    }

    /// Advances the band by `dt` seconds; drives motion and wrap only.
    pub fn tick(&mut self, dt: f32) {
        if !self.enabled {
            return;
        }
        let (Some(geometry), Some(trial)) = (self.geometry, self.trial) else {
            return;
        };
        let dx = motion::step_meters(
            geometry.distance_m,
            trial.speed_deg_per_s,
            dt,
            trial.direction,
        );
        motion::advance(
            self.pool.elements_mut(),
            dx,
            geometry.extent_m,
            geometry.spacing_m,
            trial.direction,
        );
        self.push_transforms(&geometry);
    }

    /// Whether the engine is still live; a missing visual template turns it
    /// into a permanent no-op.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Geometry of the current trial, if one is configured.
    #[must_use]
    pub const fn geometry(&self) -> Option<DerivedGeometry> {
        self.geometry
    }

    /// Normalized parameters of the current trial, if one is configured.
    #[must_use]
    pub const fn trial(&self) -> Option<TrialGeometry> {
        self.trial
    }

    /// Field of view cached by the last configure.
    #[must_use]
    pub const fn fov(&self) -> FovHalves {
        self.fov
    }

    /// Read-only view of the element pool.
    #[must_use]
    pub fn elements(&self) -> &[BandElement] {
        self.pool.elements()
    }

    /// Backend handles in element order; test hook.
    #[must_use]
    pub fn instance_handles(&self) -> &[InstanceHandle] {
        &self.instances
    }

    /// Static configuration the engine was built with.
    #[must_use]
    pub const fn config(&self) -> &StimulusConfig {
        &self.config
    }

    /// Tears down every instance and refuses further work.
    fn disable(&mut self) {
        for handle in self.instances.drain(..) {
            let _ = self.backend.destroy_instance(handle);
        }
        self.pool.resize(0);
        self.geometry = None;
        self.trial = None;
        self.enabled = false;
        info!("stimulus band disabled");
    }

    /// Grows or shrinks the backend instance list in lockstep with the pool,
    /// tail-only so indices stay stable.
    fn rebuild_instances(&mut self, count: usize) -> Result<(), BackendError> {
        while self.instances.len() < count {
            let handle = self.backend.create_instance()?;
            self.instances.push(handle);
        }
        while self.instances.len() > count {
            if let Some(handle) = self.instances.pop() {
                self.backend.destroy_instance(handle)?;
            }
        }
        Ok(())
    }

    fn anchor_band(&mut self, geometry: &DerivedGeometry) {
        let view = self.viewpoint.unwrap_or_default();
        let position = [
            view.position[0] + view.forward[0] * geometry.distance_m,
            view.position[1] + view.forward[1] * geometry.distance_m,
            view.position[2] + view.forward[2] * geometry.distance_m,
        ];
        self.backend.set_band_anchor(BandAnchor {
            position,
            forward: view.forward,
        });
    }

    fn push_colors(&mut self) {
        for (element, handle) in self.pool.elements().iter().zip(&self.instances) {
            let [r, g, b] = element.color;
            if let Err(err) = self.backend.set_color(*handle, [r, g, b, 1.0]) {
                debug!(error = %err, "color override rejected");
            }
        }
    }

    fn push_transforms(&mut self, geometry: &DerivedGeometry) {
        for (element, handle) in self.pool.elements().iter().zip(&self.instances) {
            let transform = InstanceTransform {
                position: [element.x, element.y, 0.0],
                tilt_deg: element.tilt_deg,
                scale: [geometry.bar_width_m, geometry.bar_height_m, DEPTH_EPSILON],
            };
            if let Err(err) = self.backend.set_transform(*handle, transform) {
                debug!(error = %err, "transform update rejected");
            }
        }
    }
}

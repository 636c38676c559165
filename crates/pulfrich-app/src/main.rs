use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use pulfrich_app::{Response, SessionPlan, SessionRunner, TrialLog};
use pulfrich_core::{BandStimulus, StimulusConfig, ViewingContext};
use pulfrich_render::{HeadlessBackend, HeadlessConfig};

fn main() -> Result<()> {
    init_tracing();

    let plan = load_plan()?;
    let trials = plan.build();
    info!(
        trials = trials.len(),
        blocks = plan.repeats,
        speed_deg_per_s = plan.speed_deg_per_s,
        "session plan ready"
    );

    let config = StimulusConfig::default();
    let base_distance_m = config.base_distance_m;
    let backend = HeadlessBackend::new(HeadlessConfig::default());
    let mut engine = BandStimulus::new(config, Box::new(backend))?;
    engine.update_viewpoint(ViewingContext {
        vertical_fov_deg: 90.0,
        aspect_ratio: 1.2,
        position: [0.0, 1.6, 0.0],
        forward: [0.0, 0.0, 1.0],
    });

    let mut runner = SessionRunner::new(engine, 90.0, 1.5);
    let log_path = PathBuf::from("trials.csv");
    let mut log = TrialLog::create(&log_path)?;

    // Stand-in observer until the HMD response pad is wired up: nearer bands
    // read as "before" the reference plane.
    let outcome = runner.run(&trials, &mut log, |_trial, distance_m| {
        if distance_m < base_distance_m {
            Response::Before
        } else {
            Response::Behind
        }
    })?;
    let rows = log.finish()?;

    info!(
        trials = outcome.trials_run,
        behind = outcome.behind_count,
        before = outcome.before_count,
        rows,
        log = %log_path.display(),
        "session complete"
    );
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// First CLI argument names a JSON session plan; defaults otherwise.
fn load_plan() -> Result<SessionPlan> {
    match std::env::args().nth(1) {
        Some(path) => read_plan(Path::new(&path)),
        None => Ok(SessionPlan::default()),
    }
}

fn read_plan(path: &Path) -> Result<SessionPlan> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading session plan {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing session plan {}", path.display()))
}

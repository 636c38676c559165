//! Session plumbing around the stimulus band engine: trial sequencing,
//! response bookkeeping, and the CSV trial log.

pub mod log;
pub mod session;
pub mod trials;

pub use log::TrialLog;
pub use session::{SessionOutcome, SessionRunner};
pub use trials::{Response, SessionPlan, Trial};

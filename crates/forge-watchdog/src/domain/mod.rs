//! Domain layer - pure logic with no I/O

pub mod drift;
pub mod entities;
pub mod retry;

pub use drift::{
    height_drift, missed_block_drift, reduce_peer_heights, version_drift, ReloadAssessment,
};
pub use entities::{CommandOutput, CycleReport, ForgingRequest, HeightSample, NodeStatus, Phase};
pub use retry::{
    retry, AttemptError, RetryExhausted, RetryOutcome, RetryPolicy, DEFAULT_MAX_ATTEMPTS,
    READINESS_DELAY, READINESS_MAX_ATTEMPTS,
};

//! A/B testing for SiteIQ: test lifecycle, sticky visitor assignment,
//! click/conversion tracking, two-proportion significance and recurring
//! scheduled tasks.

mod bait;
mod engine;
mod error;
mod persist;
mod scheduler;
mod stats;
mod types;

pub use bait::{generate_bait_variants, generate_optimized_content, BaitTemplate};
pub use engine::{AssignmentMap, ExperimentEngine, ResultMap};
pub use error::{ExperimentError, Result};
pub use persist::{
    load_state, save_state, ASSIGNMENTS_KEY, EXPERIMENTS_KEY, EXPERIMENT_SCHEMA_VERSION,
    RESULTS_KEY,
};
pub use scheduler::{DailyJob, SchedulerConfig, TaskScheduler};
pub use stats::{erf, normal_cdf, two_proportion_confidence};
pub use types::{
    Experiment, GoalMetric, TestDefinition, TestReport, TestStatus, TestType, Variant,
    VariantReport, VariantResult, DEFAULT_SIGNIFICANCE_THRESHOLD,
};

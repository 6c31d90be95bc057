//! dbtlens engine - Core analysis logic
//!
//! This crate implements the analysis passes over the project graph:
//! - Rule evaluation (threshold classification over graph shape + telemetry)
//! - Recommendation aggregation (grouping, ranking, prioritization)

pub mod recommendations;
pub mod rules;

pub use recommendations::generate_recommendations;
pub use rules::{
    check_dead_models, check_deep_dependency_chains, check_fan_out_heavy_models,
    check_heavy_non_incremental_models, run_all_rules,
};

pub mod coverage_rule;
pub mod design_ir;
pub mod design_job;
pub mod error;
pub mod generation;
pub mod llm_config;
pub mod model_id;
pub mod profile;

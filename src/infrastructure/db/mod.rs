pub mod connection;
pub mod design_jobs;
pub mod ir_versions;
pub mod profiles;

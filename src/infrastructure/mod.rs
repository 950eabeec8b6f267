pub mod config;
pub mod db;
pub mod ir_schema;
pub mod llm_clients;
pub mod rules;

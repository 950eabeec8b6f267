pub mod use_cases;

pub use use_cases::design::{DesignOutcome, DesignUseCase, GenerationOrchestrator, LatestVersion};
pub use use_cases::profiles::ProfileUseCase;

use std::sync::{Arc, Mutex};

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::application::{DesignUseCase, GenerationOrchestrator, ProfileUseCase};
use crate::domain::error::{AppError, Result};
use crate::infrastructure::config::{AppConfig, LlmSettingsStore};
use crate::infrastructure::db::connection::init_design_db;
use crate::infrastructure::db::design_jobs::DesignJobRepository;
use crate::infrastructure::db::ir_versions::IrVersionRepository;
use crate::infrastructure::db::profiles::ProfileRepository;
use crate::infrastructure::llm_clients::ProviderRegistry;
use crate::infrastructure::rules::CoverageRuleLoader;
use crate::interfaces::http::{add_log, start_server, HttpState};

pub fn run() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to start async runtime");
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(serve()) {
        error!(error = %e, "Server stopped with an error");
        std::process::exit(1);
    }
}

/// Loads configuration, wires repositories and providers, and serves HTTP
/// until shutdown.
pub async fn serve() -> Result<()> {
    let config = AppConfig::load()?;

    let pool = init_design_db(&config.database_url).await.map_err(|e| {
        error!(error = %e, database_url = %config.database_url, "Failed to open database");
        e
    })?;

    let settings_path = config.resolve_llm_settings_path();
    info!("LLM settings file: {}", settings_path.display());
    let settings = Arc::new(LlmSettingsStore::new(settings_path));
    let registry = Arc::new(ProviderRegistry::new(&config, settings.clone()));

    let profile_repository = Arc::new(ProfileRepository::new(pool.clone()));
    let design = DesignUseCase::new(
        profile_repository.clone(),
        Arc::new(DesignJobRepository::new(pool.clone())),
        Arc::new(IrVersionRepository::new(pool)),
        CoverageRuleLoader::new(config.rules_dir.clone()),
        GenerationOrchestrator::new(registry.clone()),
    );

    let logs = Arc::new(Mutex::new(Vec::new()));
    add_log(
        &logs,
        "INFO",
        "Server",
        &format!("Listening on {}:{}", config.host, config.port),
    );
    let state = HttpState {
        profiles: Arc::new(ProfileUseCase::new(profile_repository)),
        design: Arc::new(design),
        registry,
        settings,
        logs,
    };

    info!("Starting HTTP server on {}:{}", config.host, config.port);
    let server = start_server(state, &config).map_err(|e| {
        error!(error = %e, "Failed to bind HTTP server");
        AppError::from(e)
    })?;
    server.await?;
    Ok(())
}

use crate::application::{DesignUseCase, ProfileUseCase};
use crate::domain::design_ir::DesignIr;
use crate::domain::error::{AppError, ErrorKind};
use crate::domain::generation::DesignRequest;
use crate::domain::llm_config::dedup_and_sort_models;
use crate::domain::profile::{ProfileInput, ProfileUpdate};
use crate::infrastructure::config::{AppConfig, LlmSettingsStore, LlmSettingsUpdate};
use crate::infrastructure::llm_clients::ProviderRegistry;
use actix_cors::Cors;
use actix_web::http::StatusCode;
use actix_web::{dev::Server, get, post, put, web, App, HttpResponse, HttpServer, Responder};
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

const JSON_BODY_LIMIT: usize = 1024 * 1024;
const MAX_LOG_ENTRIES: usize = 100;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub source: String,
    pub message: String,
}

pub struct HttpState {
    pub profiles: Arc<ProfileUseCase>,
    pub design: Arc<DesignUseCase>,
    pub registry: Arc<ProviderRegistry>,
    pub settings: Arc<LlmSettingsStore>,
    pub logs: Arc<Mutex<Vec<LogEntry>>>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SaveIrRequest {
    pub ir: DesignIr,
}

#[derive(Serialize)]
pub struct SaveIrResponse {
    pub version_no: i64,
}

#[derive(Deserialize)]
pub struct ListJobsQuery {
    pub limit: Option<i64>,
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

#[get("/models")]
async fn list_models(data: web::Data<HttpState>) -> impl Responder {
    match data.registry.list_all_models().await {
        Ok(models) => {
            let models = dedup_and_sort_models(models);
            add_log(
                &data.logs,
                "INFO",
                "HttpApi",
                &format!("Listed {} models", models.len()),
            );
            HttpResponse::Ok().json(models)
        }
        Err(e) => failure(&data, "Failed to list models", e),
    }
}

#[get("/settings/llm")]
async fn get_llm_settings(data: web::Data<HttpState>) -> impl Responder {
    HttpResponse::Ok().json(data.settings.summary())
}

#[put("/settings/llm")]
async fn update_llm_settings(
    data: web::Data<HttpState>,
    req: web::Json<LlmSettingsUpdate>,
) -> impl Responder {
    match data.settings.update(req.into_inner()) {
        Ok(summary) => {
            add_log(&data.logs, "INFO", "HttpApi", "LLM settings updated");
            HttpResponse::Ok().json(summary)
        }
        Err(e) => failure(&data, "Failed to update LLM settings", e),
    }
}

#[get("/profiles")]
async fn list_profiles(data: web::Data<HttpState>) -> impl Responder {
    match data.profiles.list_profiles().await {
        Ok(profiles) => HttpResponse::Ok().json(profiles),
        Err(e) => failure(&data, "Failed to list profiles", e),
    }
}

#[post("/profiles")]
async fn create_profile(
    data: web::Data<HttpState>,
    req: web::Json<ProfileInput>,
) -> impl Responder {
    match data.profiles.create_profile(req.into_inner()).await {
        Ok(profile) => HttpResponse::Created().json(profile),
        Err(e) => failure(&data, "Failed to create profile", e),
    }
}

#[get("/profiles/{profile_id}")]
async fn get_profile(data: web::Data<HttpState>, path: web::Path<i64>) -> impl Responder {
    match data.profiles.get_profile(path.into_inner()).await {
        Ok(profile) => HttpResponse::Ok().json(profile),
        Err(e) => failure(&data, "Failed to fetch profile", e),
    }
}

#[put("/profiles/{profile_id}")]
async fn update_profile(
    data: web::Data<HttpState>,
    path: web::Path<i64>,
    req: web::Json<ProfileUpdate>,
) -> impl Responder {
    match data
        .profiles
        .update_profile(path.into_inner(), req.into_inner())
        .await
    {
        Ok(profile) => HttpResponse::Ok().json(profile),
        Err(e) => failure(&data, "Failed to update profile", e),
    }
}

#[post("/design")]
async fn generate_design(
    data: web::Data<HttpState>,
    req: web::Json<DesignRequest>,
) -> impl Responder {
    let request = req.into_inner();
    add_log(
        &data.logs,
        "INFO",
        "HttpApi",
        &format!(
            "Generating design (suite={} coverage={} model={})",
            request.suite_name,
            request.coverage_level,
            request.model.as_deref().unwrap_or("default")
        ),
    );

    match data.design.generate(request).await {
        Ok(outcome) => HttpResponse::Ok().json(outcome),
        Err(e) => failure(&data, "Design generation failed", e),
    }
}

#[get("/design")]
async fn list_design_jobs(
    data: web::Data<HttpState>,
    query: web::Query<ListJobsQuery>,
) -> impl Responder {
    match data.design.list_jobs(query.limit).await {
        Ok(jobs) => HttpResponse::Ok().json(jobs),
        Err(e) => failure(&data, "Failed to list design jobs", e),
    }
}

#[get("/design/{design_id}")]
async fn get_design_job(data: web::Data<HttpState>, path: web::Path<String>) -> impl Responder {
    let design_id = match parse_design_id(&path) {
        Ok(id) => id,
        Err(e) => return error_response(&e),
    };
    match data.design.get_job(&design_id).await {
        Ok(job) => HttpResponse::Ok().json(job),
        Err(e) => failure(&data, "Failed to fetch design job", e),
    }
}

#[post("/ir/{design_id}/save")]
async fn save_ir(
    data: web::Data<HttpState>,
    path: web::Path<String>,
    req: web::Json<SaveIrRequest>,
) -> impl Responder {
    let design_id = match parse_design_id(&path) {
        Ok(id) => id,
        Err(e) => return error_response(&e),
    };
    match data.design.save_edit(&design_id, req.into_inner().ir).await {
        Ok(version_no) => {
            add_log(
                &data.logs,
                "INFO",
                "HttpApi",
                &format!("Saved {} as version {}", design_id, version_no),
            );
            HttpResponse::Ok().json(SaveIrResponse { version_no })
        }
        Err(e) => failure(&data, "Failed to save design", e),
    }
}

#[get("/ir/{design_id}/latest")]
async fn latest_ir(data: web::Data<HttpState>, path: web::Path<String>) -> impl Responder {
    let design_id = match parse_design_id(&path) {
        Ok(id) => id,
        Err(e) => return error_response(&e),
    };
    match data.design.latest(&design_id).await {
        Ok(latest) => HttpResponse::Ok().json(latest),
        Err(e) => failure(&data, "Failed to fetch latest design", e),
    }
}

#[get("/logs")]
async fn get_logs(data: web::Data<HttpState>) -> impl Responder {
    let logs = match data.logs.lock() {
        Ok(logs) => logs.clone(),
        Err(_) => Vec::new(),
    };
    HttpResponse::Ok().json(logs)
}

fn parse_design_id(raw: &str) -> Result<String, AppError> {
    Uuid::parse_str(raw.trim())
        .map(|id| id.to_string())
        .map_err(|_| AppError::ValidationError(format!("Invalid designId: {}", raw)))
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::BadInput | ErrorKind::NotConfigured => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::UpstreamUnavailable | ErrorKind::UpstreamGarbage => StatusCode::BAD_GATEWAY,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn error_response(error: &AppError) -> HttpResponse {
    let kind = error.kind();
    HttpResponse::build(status_for(kind)).json(json!({
        "error": error.to_string(),
        "kind": kind,
    }))
}

fn failure(data: &HttpState, context: &str, error: AppError) -> HttpResponse {
    let level = match error.kind() {
        ErrorKind::Internal | ErrorKind::UpstreamUnavailable | ErrorKind::UpstreamGarbage => {
            "ERROR"
        }
        _ => "WARN",
    };
    add_log(
        &data.logs,
        level,
        "HttpApi",
        &format!("{}: {}", context, error),
    );
    error_response(&error)
}

pub fn add_log_entry(
    logs: &Mutex<Vec<LogEntry>>,
    level: &str,
    source: &str,
    message: &str,
) -> LogEntry {
    let entry = LogEntry {
        time: Local::now().format("%H:%M:%S").to_string(),
        level: level.to_string(),
        source: source.to_string(),
        message: message.to_string(),
    };
    if let Ok(mut logs) = logs.lock() {
        logs.push(entry.clone());
        if logs.len() > MAX_LOG_ENTRIES {
            logs.remove(0);
        }
    }
    entry
}

pub fn add_log(logs: &Mutex<Vec<LogEntry>>, level: &str, source: &str, message: &str) {
    add_log_entry(logs, level, source, message);
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_BODY_LIMIT)
        .error_handler(|err, _req| {
            let error = AppError::ValidationError(err.to_string());
            let response = error_response(&error);
            actix_web::error::InternalError::from_response(err, response).into()
        })
}

/// Registers every route. Shared by the server and the route tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config()).service(health).service(
        web::scope("/api")
            .service(list_models)
            .service(get_llm_settings)
            .service(update_llm_settings)
            .service(list_profiles)
            .service(create_profile)
            .service(get_profile)
            .service(update_profile)
            .service(generate_design)
            .service(list_design_jobs)
            .service(get_design_job)
            .service(save_ir)
            .service(latest_ir)
            .service(get_logs),
    );
}

fn build_cors(allowed_origins: &[String]) -> Cors {
    if allowed_origins.is_empty() {
        return Cors::permissive();
    }
    allowed_origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allow_any_method()
        .allow_any_header()
}

pub fn start_server(state: HttpState, config: &AppConfig) -> std::io::Result<Server> {
    let state = web::Data::new(state);
    let allowed_origins = config.allowed_origins();

    let server = HttpServer::new(move || {
        App::new()
            .wrap(build_cors(&allowed_origins))
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run();

    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::GenerationOrchestrator;
    use crate::domain::generation::ProviderResponse;
    use crate::domain::llm_config::{LLMProvider, ModelInfo};
    use crate::infrastructure::config::LlmSettings;
    use crate::infrastructure::db::connection::init_design_db;
    use crate::infrastructure::db::design_jobs::DesignJobRepository;
    use crate::infrastructure::db::ir_versions::IrVersionRepository;
    use crate::infrastructure::db::profiles::ProfileRepository;
    use crate::infrastructure::llm_clients::LLMClient;
    use crate::infrastructure::rules::CoverageRuleLoader;
    use actix_web::test;
    use async_trait::async_trait;
    use serde_json::Value;

    struct CannedClient;

    #[async_trait]
    impl LLMClient for CannedClient {
        fn provider(&self) -> LLMProvider {
            LLMProvider::Local
        }

        fn is_available(&self) -> bool {
            true
        }

        async fn list_models(&self) -> crate::domain::error::Result<Vec<ModelInfo>> {
            Ok(vec![
                ModelInfo::new(LLMProvider::Local, "phi4mini", "phi4mini"),
                ModelInfo::new(LLMProvider::Local, "llama3", "llama3"),
            ])
        }

        async fn generate(
            &self,
            model: &str,
            _system: &str,
            _user: &str,
            _schema: &Value,
        ) -> crate::domain::error::Result<ProviderResponse> {
            let reply = json!({
                "suite": { "name": "Login", "coverage_level": "smoke", "assumptions": [], "notes": "" },
                "rows": [
                    { "Case": "Valid login", "Step": "submit", "Expected": "dashboard",
                      "Tag": "normal", "Priority": "High", "remarks": "" }
                ]
            });
            Ok(ProviderResponse {
                response_text: reply.to_string(),
                request_payload: json!({ "model": model }),
            })
        }
    }

    async fn state() -> web::Data<HttpState> {
        let pool = init_design_db("sqlite::memory:").await.unwrap();
        let profile_repo = Arc::new(ProfileRepository::new(pool.clone()));
        let clients: Vec<Arc<dyn LLMClient>> = vec![Arc::new(CannedClient)];
        let registry = Arc::new(ProviderRegistry::with_clients(clients));
        let design = DesignUseCase::new(
            profile_repo.clone(),
            Arc::new(DesignJobRepository::new(pool.clone())),
            Arc::new(IrVersionRepository::new(pool)),
            CoverageRuleLoader::default(),
            GenerationOrchestrator::new(registry.clone()),
        );
        web::Data::new(HttpState {
            profiles: Arc::new(ProfileUseCase::new(profile_repo)),
            design: Arc::new(design),
            registry,
            settings: Arc::new(LlmSettingsStore::in_memory(LlmSettings::default())),
            logs: Arc::new(Mutex::new(Vec::new())),
        })
    }

    #[actix_web::test]
    async fn test_health() {
        let app = test::init_service(App::new().configure(configure)).await;
        let req = test::TestRequest::get().uri("/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "ok");
    }

    #[actix_web::test]
    async fn test_design_round_trip_over_http() {
        let app = test::init_service(
            App::new().app_data(state().await).configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/profiles")
            .set_json(json!({ "name": "Web" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let profile: Value = test::read_body_json(resp).await;

        let req = test::TestRequest::post()
            .uri("/api/design")
            .set_json(json!({
                "profile_id": profile["id"],
                "suite_name": "Login",
                "coverage_level": "smoke",
                "element_steps_text": "open login, submit"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let outcome: Value = test::read_body_json(resp).await;
        let design_id = outcome["design_id"].as_str().unwrap().to_string();
        assert!(outcome["ir"]["rows"][0]["id"]
            .as_str()
            .unwrap()
            .starts_with("row_"));

        let req = test::TestRequest::post()
            .uri(&format!("/api/ir/{}/save", design_id))
            .set_json(json!({ "ir": outcome["ir"] }))
            .to_request();
        let saved: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(saved["version_no"], 2);

        let req = test::TestRequest::get()
            .uri(&format!("/api/ir/{}/latest", design_id))
            .to_request();
        let latest: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(latest["version_no"], 2);
        assert_eq!(latest["ir"], outcome["ir"]);

        let req = test::TestRequest::get()
            .uri(&format!("/api/design/{}", design_id))
            .to_request();
        let job: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(job["status"], "success");
    }

    #[actix_web::test]
    async fn test_error_mapping() {
        let app = test::init_service(
            App::new().app_data(state().await).configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/profiles/7").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["kind"], "not_found");

        let req = test::TestRequest::get()
            .uri("/api/ir/not-a-uuid/latest")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let missing = Uuid::new_v4();
        let req = test::TestRequest::get()
            .uri(&format!("/api/ir/{}/latest", missing))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::post()
            .uri("/api/design")
            .set_json(json!({ "profile_id": 1, "suite_name": "Login" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["kind"], "bad_input");
    }

    #[actix_web::test]
    async fn test_models_and_settings() {
        let app = test::init_service(
            App::new().app_data(state().await).configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/models").to_request();
        let models: Value = test::call_and_read_body_json(&app, req).await;
        let ids: Vec<&str> = models
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["local:llama3", "local:phi4mini"]);

        let req = test::TestRequest::put()
            .uri("/api/settings/llm")
            .set_json(json!({ "gemini_api_key": "  g-key  " }))
            .to_request();
        let summary: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(summary["gemini_configured"], true);
        assert_eq!(summary["openai_configured"], false);
        assert!(summary.get("gemini_api_key").is_none());

        let req = test::TestRequest::put()
            .uri("/api/settings/llm")
            .set_json(json!({ "openai_base_url": "ftp://example.com" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}

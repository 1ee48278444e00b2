use std::sync::Arc;

use chat_backend::ChatBackend;
use chat_backend_http::{HttpBackend, HttpBackendConfig, HTTP_BACKEND_ID};
use chat_backend_mock::{MockBackend, MOCK_BACKEND_ID};

pub const DEFAULT_BACKEND_ID: &str = MOCK_BACKEND_ID;
pub const BACKEND_ENV_VAR: &str = "PERSONA_CHAT_BACKEND";
pub const CONFIG_PATH_ENV_VAR: &str = "PERSONA_CHAT_CONFIG_PATH";

pub fn backend_from_env() -> Result<Arc<dyn ChatBackend>, String> {
    let backend_id = std::env::var(BACKEND_ENV_VAR)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());

    backend_for_id(backend_id.as_deref().unwrap_or(DEFAULT_BACKEND_ID))
}

pub fn backend_for_id(backend_id: &str) -> Result<Arc<dyn ChatBackend>, String> {
    match backend_id {
        MOCK_BACKEND_ID => Ok(Arc::new(MockBackend::default())),
        HTTP_BACKEND_ID => {
            let config_path = std::env::var(CONFIG_PATH_ENV_VAR)
                .ok()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or_else(|| {
                    format!("{BACKEND_ENV_VAR}={HTTP_BACKEND_ID} requires {CONFIG_PATH_ENV_VAR}")
                })?;

            let config = HttpBackendConfig::from_json_file(&config_path)
                .map_err(|error| error.message().to_string())?;
            let backend = HttpBackend::new(config).map_err(|error| error.message().to_string())?;
            Ok(Arc::new(backend))
        }
        unknown => Err(format!(
            "Unsupported backend '{unknown}'. Available backends: {MOCK_BACKEND_ID}, {HTTP_BACKEND_ID}"
        )),
    }
}

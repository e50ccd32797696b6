use serde::Serialize;
use thiserror::Error;

/// Boolean-flag body for the backend's resource release endpoint.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct FreeRequest {
    pub unload_models: bool,
    pub free_memory: bool,
}

impl Default for FreeRequest {
    fn default() -> Self {
        Self {
            unload_models: true,
            free_memory: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Backend request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Backend returned status {0}")]
    Status(reqwest::StatusCode),
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Client for the executor backend. Failures are surfaced to the host for
/// a dialog; they never touch profiler state.
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    http: reqwest::Client,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    /// Asks the backend to unload models and free device memory.
    pub async fn free_resources(&self, request: &FreeRequest) -> BackendResult<()> {
        let response = self
            .http
            .post(format!("{}/free", self.base_url))
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BackendError::Status(response.status()));
        }
        Ok(())
    }
}

// HTTP gateways for the portal API
//
// Stateless request/response calls with no caching and no retry: every
// catalog or history fetch re-reads the server. Path construction goes
// through pure helpers so routes never drift between calls.

use portal_common::config::PortalConfig;
use portal_common::types::{
    Challenge, ChallengeSummary, ExecutionOutput, Submission, SubmissionOutcome,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::error;

use crate::transcript;

pub const CHALLENGES_PATH: &str = "/api/programming-challenges";
pub const EXECUTE_PATH: &str = "/api/execute-code";
pub const SUBMISSIONS_PATH: &str = "/api/code-submissions";

/// Generic localized message used when an error response carries no
/// readable message field.
const FALLBACK_SERVER_MESSAGE: &str = "Erro no servidor";

/// Route to a single challenge's detail (test cases included)
pub fn challenge_detail_path(challenge_id: i64) -> String {
    format!("{}/{}", CHALLENGES_PATH, challenge_id)
}

/// Route to the submission history of a challenge
pub fn challenge_history_path(challenge_id: i64) -> String {
    format!("{}/challenge/{}", SUBMISSIONS_PATH, challenge_id)
}

/// Join the configured base URL with an API path
pub fn join_url(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

/// Extract the human-readable message of an error response body.
/// The portal uses `message`; older routes use `error`.
pub fn error_message(body: &serde_json::Value) -> Option<String> {
    body.get("message")
        .or_else(|| body.get("error"))
        .and_then(|value| value.as_str())
        .map(str::to_string)
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("falha de transporte: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("servidor respondeu {status}: {message}")]
    Server { status: u16, message: String },
}

#[derive(Debug, Serialize)]
struct ExecuteRequest<'a> {
    code: &'a str,
    input: &'a str,
}

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    challenge_id: i64,
    code: &'a str,
}

/// HTTP client over the portal's challenge endpoints.
///
/// Holds no per-call state; the request deadline is fixed at construction
/// so no call can stay outstanding past the configured timeout.
pub struct PortalApi {
    http: reqwest::Client,
    base_url: String,
}

impl PortalApi {
    pub fn new(config: &PortalConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    /// GET /api/programming-challenges
    pub async fn list_challenges(&self) -> Result<Vec<ChallengeSummary>, GatewayError> {
        let response = self.http.get(self.url(CHALLENGES_PATH)).send().await?;
        Self::read_json(response).await
    }

    /// GET /api/programming-challenges/{id}
    pub async fn get_challenge(&self, challenge_id: i64) -> Result<Challenge, GatewayError> {
        let response = self
            .http
            .get(self.url(&challenge_detail_path(challenge_id)))
            .send()
            .await?;
        Self::read_json(response).await
    }

    /// POST /api/execute-code
    ///
    /// Formative feedback only: never scored, never persisted. Infallible
    /// by contract: a transport or server failure settles as a synthetic
    /// `success: false` output so the workspace always has something to
    /// render.
    pub async fn execute_code(&self, code: &str, input: &str) -> ExecutionOutput {
        let call = async {
            let response = self
                .http
                .post(self.url(EXECUTE_PATH))
                .json(&ExecuteRequest { code, input })
                .send()
                .await?;
            Self::read_json::<ExecutionOutput>(response).await
        };

        match call.await {
            Ok(output) => output,
            Err(e) => {
                error!(error = %e, "Execution gateway call failed");
                ExecutionOutput {
                    success: false,
                    output: String::new(),
                    error: Some(transcript::RUN_FAILED.to_string()),
                }
            }
        }
    }

    /// POST /api/code-submissions
    pub async fn submit_solution(
        &self,
        challenge_id: i64,
        code: &str,
    ) -> Result<SubmissionOutcome, GatewayError> {
        let response = self
            .http
            .post(self.url(SUBMISSIONS_PATH))
            .json(&SubmitRequest { challenge_id, code })
            .send()
            .await?;
        Self::read_json(response).await
    }

    /// GET /api/code-submissions/challenge/{challenge_id}
    ///
    /// Server order is preserved; the caller treats it as
    /// submission-chronological for display.
    pub async fn list_submissions(
        &self,
        challenge_id: i64,
    ) -> Result<Vec<Submission>, GatewayError> {
        let response = self
            .http
            .get(self.url(&challenge_history_path(challenge_id)))
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, GatewayError> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|body| error_message(&body))
                .unwrap_or_else(|| FALLBACK_SERVER_MESSAGE.to_string());

            return Err(GatewayError::Server {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

// src/service.rs

use reqwest::Client;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Instant;

use crate::config::ServiceConfig;
use crate::errors::{CoachError, Result};
use crate::protocol::{AnalysisResult, CodeResult, Problem, RawAnalysis, ServiceFailure};

/// The external service that explains problems and writes solutions.
pub trait AnalysisService: Send + Sync {
    /// Asks for an explanation, approach and complexity analysis of `problem`.
    fn analyze(&self, problem: &Problem) -> impl Future<Output = Result<AnalysisResult>> + Send;

    /// Asks for a solution to `problem`.
    fn generate_code(&self, problem: &Problem) -> impl Future<Output = Result<CodeResult>> + Send;
}

/// Talks to the analysis service over plain HTTP.
pub struct HttpAnalysisClient {
    client: Client,
    config: ServiceConfig,
}

impl HttpAnalysisClient {
    pub fn new(client: Client, config: ServiceConfig) -> Self {
        Self { client, config }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// POSTs `problem` to `path` and returns the JSON body, rejecting
    /// non-2xx statuses and error bodies.
    async fn post<T: DeserializeOwned>(&self, path: &str, problem: &Problem) -> Result<T> {
        let url = self.endpoint(path);
        log::info!("POST {} for \"{}\"", url, problem.title);

        let start = Instant::now();
        let resp = self.client.post(&url).json(problem).send().await?;
        let status = resp.status();
        log::debug!("{} answered {} in {}ms", url, status, start.elapsed().as_millis());

        if !status.is_success() {
            let error_body = resp
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error body".to_string());
            return Err(CoachError::ApiError {
                status: status.as_u16(),
                body: error_body,
            });
        }

        let body: serde_json::Value = resp.json().await?;
        if let Some(failure) = ServiceFailure::detect(&body) {
            return Err(failure.into_error());
        }
        Ok(serde_json::from_value(body)?)
    }
}

impl AnalysisService for HttpAnalysisClient {
    async fn analyze(&self, problem: &Problem) -> Result<AnalysisResult> {
        let raw: RawAnalysis = self.post("analyze", problem).await?;
        raw.validate()
    }

    async fn generate_code(&self, problem: &Problem) -> Result<CodeResult> {
        let raw: serde_json::Value = self.post("generate-code", problem).await?;
        match raw.get("code").and_then(|c| c.as_str()) {
            Some(code) => Ok(CodeResult {
                code: code.to_string(),
            }),
            None => Err(CoachError::UnexpectedResponse(
                "code generation response has no `code` string".to_string(),
            )),
        }
    }
}

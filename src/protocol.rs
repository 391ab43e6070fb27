// src/protocol.rs
//! Wire types shared by the panel, the page and the analysis service.
//!
//! Page messages are JSON objects tagged by `action`. Everything the
//! panel POSTs to the service is a [`Problem`] serialised as-is.

use serde::{Deserialize, Serialize};

use crate::errors::{CoachError, Result};

pub const PROBLEM_ELEMENTS_NOT_FOUND: &str = "Problem elements not found";
pub const EXTRACTION_FAILED: &str = "Extraction failed";

/// A request from the extension context to a tab's content script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum PageRequest {
    #[serde(rename = "getProblem")]
    GetProblem,
    #[serde(rename = "pasteCode")]
    PasteCode { code: String },
}

/// The extracted problem text. This is also the POST body for both service endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub title: String,
    pub description: String,
}

/// What a content script answers with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageResponse {
    Problem(Problem),
    Failure {
        error: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },
    Pasted {
        ok: bool,
    },
}

impl PageResponse {
    pub fn failure(error: &str) -> Self {
        PageResponse::Failure {
            error: error.to_string(),
            details: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub explanation: String,
    pub approach: String,
    pub time_complexity: String,
    pub space_complexity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hints: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeResult {
    pub code: String,
}

/// Analysis response as received, before its shape has been checked.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawAnalysis {
    explanation: Option<String>,
    approach: Option<String>,
    time_complexity: Option<String>,
    space_complexity: Option<String>,
    /// Kept loose: models sometimes answer with a list of hints.
    hints: Option<serde_json::Value>,
}

impl RawAnalysis {
    pub(crate) fn validate(self) -> Result<AnalysisResult> {
        let mut missing = Vec::new();
        for (name, field) in [
            ("explanation", &self.explanation),
            ("approach", &self.approach),
            ("time_complexity", &self.time_complexity),
            ("space_complexity", &self.space_complexity),
        ] {
            if field.is_none() {
                missing.push(name);
            }
        }
        if !missing.is_empty() {
            return Err(CoachError::UnexpectedResponse(format!(
                "analysis is missing {}",
                missing.join(", ")
            )));
        }

        Ok(AnalysisResult {
            explanation: self.explanation.unwrap_or_default(),
            approach: self.approach.unwrap_or_default(),
            time_complexity: self.time_complexity.unwrap_or_default(),
            space_complexity: self.space_complexity.unwrap_or_default(),
            hints: self.hints.as_ref().and_then(hints_text),
        })
    }
}

fn hints_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(items) => {
            let lines: Vec<&str> = items.iter().filter_map(|i| i.as_str()).collect();
            (!lines.is_empty()).then(|| lines.join("\n"))
        }
        _ => None,
    }
}

/// The error body the analysis service sends back with a 200 when the model misbehaves.
#[derive(Debug, Deserialize)]
pub(crate) struct ServiceFailure {
    pub error: String,
    #[serde(default)]
    pub exception: Option<String>,
}

impl ServiceFailure {
    /// Returns the failure if `value` is an error body rather than a result.
    pub(crate) fn detect(value: &serde_json::Value) -> Option<Self> {
        value.get("error")?;
        serde_json::from_value(value.clone()).ok()
    }

    pub(crate) fn into_error(self) -> CoachError {
        match self.exception {
            Some(exception) if !exception.is_empty() => {
                CoachError::ApiResponse(format!("{} ({})", self.error, exception))
            }
            _ => CoachError::ApiResponse(self.error),
        }
    }
}

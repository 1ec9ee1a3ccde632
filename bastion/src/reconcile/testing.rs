//! In-memory transport for unit tests

use super::transport::{RawResponse, Transport};
use crate::api::ApiError;
use async_trait::async_trait;
use reqwest::Method;
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub path: String,
    pub method: Method,
    pub body: Option<serde_json::Value>,
}

/// Answers requests from a script, in order, and records every call
pub struct RecordingTransport {
    api_version: String,
    responses: Mutex<VecDeque<RawResponse>>,
    calls: Mutex<Vec<Call>>,
}

impl RecordingTransport {
    pub fn new(api_version: &str) -> Self {
        Self {
            api_version: api_version.to_string(),
            responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn respond(self, response: RawResponse) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn methods(&self) -> Vec<Method> {
        self.calls().into_iter().map(|c| c.method).collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn request(
        &self,
        path: &str,
        method: Method,
        body: Option<serde_json::Value>,
    ) -> Result<RawResponse, ApiError> {
        self.calls.lock().unwrap().push(Call {
            path: path.to_string(),
            method: method.clone(),
            body,
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ApiError::InvalidConfig(format!("unscripted {} {}", method, path)))
    }

    fn api_version(&self) -> &str {
        &self.api_version
    }
}

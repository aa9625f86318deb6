//! Recording gateway for unit tests

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::Method;

use gantry_core::config::Config;
use gantry_core::{HostError, HostResult};

use crate::client::GitLabClient;
use crate::gateway::{ApiRequest, ApiResponse, Gateway};

type Handler = Box<dyn Fn(&ApiRequest) -> HostResult<ApiResponse> + Send + Sync>;

/// Gateway that answers from a closure and records every request
pub struct MockGateway {
    handler: Handler,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockGateway {
    pub fn new(
        handler: impl Fn(&ApiRequest) -> HostResult<ApiResponse> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// `(method, path)` of every request, in order
    pub fn calls(&self) -> Vec<(Method, String)> {
        self.requests()
            .into_iter()
            .map(|r| (r.method, r.path))
            .collect()
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn send(&self, request: &ApiRequest) -> HostResult<ApiResponse> {
        self.requests.lock().unwrap().push(request.clone());
        (self.handler)(request)
    }
}

/// 200 with a JSON body
pub fn ok(body: serde_json::Value) -> HostResult<ApiResponse> {
    Ok(ApiResponse::new(200, body.to_string()))
}

/// 201 with a JSON body
pub fn created(body: serde_json::Value) -> HostResult<ApiResponse> {
    Ok(ApiResponse::new(201, body.to_string()))
}

/// Error response with the given status
pub fn status(code: u16) -> HostResult<ApiResponse> {
    Err(HostError::from_status(code, format!("{} status", code)))
}

/// Config with zero retry delay
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.retry.delay_ms = 0;
    config
}

/// Client over `gateway` using [`test_config`]
pub fn client(gateway: &Arc<MockGateway>) -> GitLabClient {
    client_with(gateway, test_config())
}

/// Client over `gateway` using a custom config
pub fn client_with(gateway: &Arc<MockGateway>, config: Config) -> GitLabClient {
    GitLabClient::with_gateway(&config, gateway.clone())
}

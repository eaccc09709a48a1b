//! 测试用的内存传输层。

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use crate::{
    api::{ApiRequest, RawResponse, Transport},
    error::{CatalogError, Result},
    timer,
};

#[derive(Clone)]
enum Reply {
    Response(RawResponse),
    Failure,
}

/// 按端点描述（[`ApiRequest::endpoint`]）返回预设响应，未预设的端点返回 404。
#[derive(Clone, Default)]
pub(crate) struct MockTransport {
    replies: Arc<DashMap<String, Reply>>,
    delays: Arc<DashMap<String, Duration>>,
    calls: Arc<Mutex<Vec<ApiRequest>>>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn json(self, endpoint: &str, body: Value) -> Self {
        self.raw(endpoint, 200, &body.to_string())
    }

    pub(crate) fn raw(self, endpoint: &str, status: u16, body: &str) -> Self {
        self.replies.insert(
            endpoint.to_string(),
            Reply::Response(RawResponse {
                status,
                body: body.to_string(),
            }),
        );
        self
    }

    pub(crate) fn fail(self, endpoint: &str) -> Self {
        self.replies.insert(endpoint.to_string(), Reply::Failure);
        self
    }

    pub(crate) fn delay(self, endpoint: &str, delay: Duration) -> Self {
        self.delays.insert(endpoint.to_string(), delay);
        self
    }

    pub(crate) fn called_endpoints(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(ApiRequest::endpoint)
            .collect()
    }

    pub(crate) fn last_body(&self) -> Option<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find_map(|call| call.body.clone())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse> {
        let endpoint = request.endpoint();
        self.calls.lock().unwrap().push(request.clone());

        let delay = self.delays.get(&endpoint).map(|d| *d);
        if let Some(delay) = delay {
            timer::sleep(delay).await;
        }

        let reply = self.replies.get(&endpoint).map(|r| r.clone());
        match reply {
            Some(Reply::Response(response)) => Ok(response),
            Some(Reply::Failure) => Err(CatalogError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "模拟的连接失败",
            ))),
            None => Ok(RawResponse {
                status: 404,
                body: String::new(),
            }),
        }
    }
}

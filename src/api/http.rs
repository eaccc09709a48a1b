//! 基于 `reqwest` 的传输层实现。

use async_trait::async_trait;
use reqwest::Client;

use crate::{
    api::{ApiRequest, Method, RawResponse, Transport},
    config::CatalogConfig,
    error::Result,
};

/// 通过 HTTP 访问上游 API。
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http_client: Client,
    base_url: String,
    lang: String,
}

impl ReqwestTransport {
    /// 根据配置创建传输层。
    pub fn new(config: &CatalogConfig) -> Self {
        Self {
            http_client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            lang: config.lang.clone(),
        }
    }

    fn url_for(&self, request: &ApiRequest) -> String {
        format!("{}/{}", self.base_url, request.path.trim_start_matches('/'))
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse> {
        let url = self.url_for(request);
        let builder = match request.method {
            Method::Get => self.http_client.get(&url),
            Method::Post => self.http_client.post(&url),
        };

        let mut builder = builder
            .query(&request.query)
            .query(&[("lang", self.lang.as_str())]);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        tracing::trace!(
            "[HTTP] {} -> {} ({} 字节)",
            request.endpoint(),
            status,
            body.len()
        );

        Ok(RawResponse { status, body })
    }
}

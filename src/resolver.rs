//! 多端点解析器。
//!
//! 上游同一份数据可能挂在好几个不同的路径下。解析器按顺序逐个尝试候选端点，
//! 返回第一个可用的 JSON 响应。单个候选的失败只会被记录，不会向上抛出。

use std::{sync::Arc, time::Duration};

use futures::future::{AbortRegistration, Abortable};
use serde_json::Value;

use crate::{
    api::{ApiRequest, Transport},
    error::{CatalogError, Result},
    timer,
};

/// 按顺序尝试候选端点的解析器。克隆开销很小。
#[derive(Clone)]
pub struct Resolver {
    transport: Arc<dyn Transport>,
    request_timeout: Duration,
}

impl Resolver {
    /// 创建解析器。每个候选端点最多等待 `request_timeout`。
    pub fn new(transport: Arc<dyn Transport>, request_timeout: Duration) -> Self {
        Self {
            transport,
            request_timeout,
        }
    }

    /// 发送单个请求并解析为 JSON。
    ///
    /// 以下情况都视为失败：传输错误、超时、非 2xx 状态码、空响应体、非 JSON 响应体。
    pub async fn fetch(&self, request: &ApiRequest) -> Result<Value> {
        let response =
            timer::with_timeout(self.request_timeout, self.transport.send(request)).await??;

        if !response.is_success() {
            return Err(CatalogError::Status(response.status));
        }
        if response.body.trim().is_empty() {
            return Err(CatalogError::EmptyBody);
        }
        Ok(serde_json::from_str(&response.body)?)
    }

    /// 返回第一个成功的候选端点的响应，全部失败时返回 `None`。
    pub async fn resolve(&self, candidates: &[ApiRequest]) -> Option<Value> {
        self.resolve_where(candidates, |_| true).await
    }

    /// 与 [`resolve`](Self::resolve) 相同，但响应还必须满足 `accept`。
    ///
    /// 不满足条件的响应与失败同等对待，继续尝试下一个候选。
    pub async fn resolve_where<F>(&self, candidates: &[ApiRequest], accept: F) -> Option<Value>
    where
        F: Fn(&Value) -> bool,
    {
        for candidate in candidates {
            let endpoint = candidate.endpoint();
            tracing::debug!("[Resolver] 正在尝试端点: {}", endpoint);

            match self.fetch(candidate).await {
                Ok(payload) if accept(&payload) => {
                    tracing::debug!("[Resolver] 端点 {} 返回了可用数据。", endpoint);
                    return Some(payload);
                }
                Ok(_) => {
                    tracing::debug!("[Resolver] 端点 {} 的响应不满足条件，继续。", endpoint);
                }
                Err(CatalogError::Timeout(ms)) => {
                    tracing::warn!("[Resolver] 端点 {} 在 {} 毫秒后超时。", endpoint, ms);
                }
                Err(e) => {
                    tracing::debug!("[Resolver] 端点 {} 失败: {}", endpoint, e);
                }
            }
        }

        tracing::warn!("[Resolver] {} 个候选端点全部失败。", candidates.len());
        None
    }

    /// 可取消的 [`resolve_where`](Self::resolve_where)。
    ///
    /// 对应的 `AbortHandle` 被触发时返回 [`CatalogError::Cancelled`]。
    pub async fn resolve_abortable<F>(
        &self,
        candidates: &[ApiRequest],
        accept: F,
        registration: AbortRegistration,
    ) -> Result<Option<Value>>
    where
        F: Fn(&Value) -> bool,
    {
        Abortable::new(self.resolve_where(candidates, accept), registration)
            .await
            .map_err(|_| CatalogError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockTransport;
    use futures::future::AbortHandle;
    use serde_json::json;
    use tracing_test::traced_test;

    fn candidates(endpoints: &[&str]) -> Vec<ApiRequest> {
        endpoints.iter().map(|e| ApiRequest::get(*e)).collect()
    }

    fn resolver(mock: &MockTransport) -> Resolver {
        Resolver::new(Arc::new(mock.clone()), Duration::from_secs(10))
    }

    #[tokio::test]
    async fn test_first_successful_candidate_wins() {
        let mock = MockTransport::new()
            .raw("a", 500, "")
            .json("b", json!({"data": {"title": "B"}}))
            .json("c", json!({"data": {"title": "C"}}));

        let payload = resolver(&mock).resolve(&candidates(&["a", "b", "c"])).await;
        assert_eq!(payload.unwrap()["data"]["title"], "B");
        assert_eq!(mock.called_endpoints(), vec!["a", "b"]);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_failures_are_logged_not_raised() {
        let mock = MockTransport::new()
            .raw("a", 500, "")
            .raw("b", 200, "   ")
            .raw("c", 200, "<html>not json</html>")
            .fail("d")
            .json("e", json!({"data": {"title": "E"}}));

        let payload = resolver(&mock)
            .resolve(&candidates(&["a", "b", "c", "d", "e"]))
            .await;

        assert_eq!(payload.unwrap()["data"]["title"], "E");
        assert!(logs_contain("端点 a 失败"));
        assert!(logs_contain("端点 b 失败"));
        assert!(logs_contain("端点 c 失败"));
        assert!(logs_contain("端点 d 失败"));
    }

    #[tokio::test]
    async fn test_all_failing_returns_none() {
        let mock = MockTransport::new().raw("a", 404, "").raw("b", 200, "");
        assert!(resolver(&mock).resolve(&candidates(&["a", "b"])).await.is_none());
        assert!(resolver(&mock).resolve(&[]).await.is_none());
    }

    #[tokio::test]
    async fn test_resolve_where_skips_rejected_payloads() {
        let mock = MockTransport::new()
            .json("chapters/9", json!({"data": []}))
            .json("episodes/9", json!({"data": [{"episode": 1}]}));

        let payload = resolver(&mock)
            .resolve_where(&candidates(&["chapters/9", "episodes/9"]), |p| {
                p["data"].as_array().is_some_and(|l| !l.is_empty())
            })
            .await;
        assert_eq!(payload.unwrap()["data"][0]["episode"], 1);
    }

    #[tokio::test(start_paused = true)]
    #[traced_test]
    async fn test_slow_candidate_times_out_and_next_is_tried() {
        let mock = MockTransport::new()
            .json("slow", json!({"title": "slow"}))
            .delay("slow", Duration::from_secs(60))
            .json("fast", json!({"title": "fast"}));

        let payload = resolver(&mock)
            .resolve(&candidates(&["slow", "fast"]))
            .await;
        assert_eq!(payload.unwrap()["title"], "fast");
        assert!(logs_contain("超时"));
    }

    #[tokio::test]
    async fn test_resolution_can_be_cancelled() {
        let mock = MockTransport::new().json("a", json!({"title": "A"}));
        let (handle, registration) = AbortHandle::new_pair();
        handle.abort();

        let result = resolver(&mock)
            .resolve_abortable(&candidates(&["a"]), |_| true, registration)
            .await;
        assert!(matches!(result, Err(CatalogError::Cancelled)));
        assert!(mock.called_endpoints().is_empty());
    }
}

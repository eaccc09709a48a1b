//! 跨平台的计时工具。
//!
//! 原生平台使用 tokio 的计时器，浏览器中使用 `setTimeout`。

use std::time::Duration;

use futures::future::{self, Either};

use crate::error::{CatalogError, Result};

/// 异步等待一段时间。
#[cfg(not(target_arch = "wasm32"))]
pub async fn sleep(duration: Duration) {
    tokio::time::sleep(duration).await;
}

/// 异步等待一段时间。
#[cfg(target_arch = "wasm32")]
pub async fn sleep(duration: Duration) {
    let millis = i32::try_from(duration.as_millis()).unwrap_or(i32::MAX);
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        let scheduled = web_sys::window().is_some_and(|window| {
            window
                .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis)
                .is_ok()
        });
        if !scheduled {
            // 没有 window（例如在 Worker 中）时立即返回
            let _ = resolve.call0(&wasm_bindgen::JsValue::NULL);
        }
    });
    let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
}

/// 为一个 future 加上超时。
///
/// # 返回
/// 超时前完成时返回其输出，否则返回 [`CatalogError::Timeout`]。
pub async fn with_timeout<F: Future>(duration: Duration, fut: F) -> Result<F::Output> {
    let fut = std::pin::pin!(fut);
    let timer = std::pin::pin!(sleep(duration));

    match future::select(fut, timer).await {
        Either::Left((output, _)) => Ok(output),
        Either::Right(((), _)) => Err(CatalogError::Timeout(
            u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        )),
    }
}

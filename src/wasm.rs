// 浏览器绑定。页面脚本只和这里的类型打交道，返回值都是普通的 JS 对象。

use std::sync::{Arc, Mutex, PoisonError};

use futures::lock::Mutex as AsyncMutex;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::{
    CatalogClient, CatalogConfig, CatalogItem, EpisodeRef, SeriesDetail, ViewState,
    links::{SearchLink, WatchLink},
    model::catalog::FeedKind,
    player::{controller::EpisodeController, progress::wait_until_ready, source::PlayerCaps},
    search::{SearchOutcome, SearchSession},
    timer,
};

/// 模块加载时安装 panic 钩子和日志输出。
#[wasm_bindgen(start)]
pub fn main_js() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();
    Ok(())
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    Ok(serde_wasm_bindgen::to_value(value)?)
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// [`SearchOutcome`] 的 JS 形状：`{ kind, query?, suggestions?, items?, recommendations? }`。
#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
enum JsOutcome {
    Cleared,
    TooShort,
    Superseded,
    Results {
        query: String,
        suggestions: Vec<String>,
        items: ViewState<Vec<CatalogItem>>,
        recommendations: Option<ViewState<Vec<CatalogItem>>>,
    },
}

impl From<SearchOutcome> for JsOutcome {
    fn from(outcome: SearchOutcome) -> Self {
        match outcome {
            SearchOutcome::Cleared => JsOutcome::Cleared,
            SearchOutcome::TooShort => JsOutcome::TooShort,
            SearchOutcome::Superseded => JsOutcome::Superseded,
            SearchOutcome::Results {
                query,
                suggestions,
                items,
                recommendations,
            } => JsOutcome::Results {
                query,
                suggestions,
                items,
                recommendations,
            },
        }
    }
}

/// 页面使用的目录客户端，每个页面创建一个。
#[wasm_bindgen]
pub struct WasmCatalogClient {
    client: CatalogClient,
    session: SearchSession,
}

#[wasm_bindgen]
impl WasmCatalogClient {
    /// `config_js` 可以为 `undefined`，此时使用默认配置。
    #[wasm_bindgen(constructor)]
    pub fn new(config_js: JsValue) -> Result<WasmCatalogClient, JsValue> {
        let config: CatalogConfig = if config_js.is_undefined() || config_js.is_null() {
            CatalogConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config_js)?
        };
        let client = CatalogClient::new(config).map_err(js_error)?;
        let session = client.search_session();
        Ok(Self { client, session })
    }

    /// 首页三个栏目，`{ for_you, new_releases, rank }`。
    pub async fn home(&self) -> Result<JsValue, JsValue> {
        to_js(&self.client.home().await)
    }

    /// 单个栏目，`kind` 为 `for-you`、`new` 或 `rank`。
    pub async fn feed(&self, kind: String) -> Result<JsValue, JsValue> {
        let kind: FeedKind = kind.parse().map_err(js_error)?;
        to_js(&self.client.feed(kind).await)
    }

    /// 不经过防抖的搜索。
    pub async fn search(&self, query: String) -> Result<JsValue, JsValue> {
        to_js(&self.client.search(&query).await)
    }

    /// 带防抖的输入处理，每次 `input` 事件调用一次。
    #[wasm_bindgen(js_name = searchInput)]
    pub async fn search_input(&self, text: String) -> Result<JsValue, JsValue> {
        to_js(&JsOutcome::from(self.session.input(&text).await))
    }

    /// 按下回车时立即搜索，取代正在等待的输入。
    #[wasm_bindgen(js_name = searchSubmit)]
    pub async fn search_submit(&self, text: String) -> Result<JsValue, JsValue> {
        to_js(&JsOutcome::from(self.session.submit(&text).await))
    }

    /// 搜索建议（字符串数组）。
    pub async fn suggestions(&self, query: String) -> Result<JsValue, JsValue> {
        to_js(&self.client.suggestions(&query).await)
    }

    /// 搜索框为空时展示的推荐内容。
    pub async fn recommendations(&self) -> Result<JsValue, JsValue> {
        to_js(&self.client.recommendations().await)
    }

    /// 记录用户点击的条目（`CatalogItem` 对象）。
    pub fn select(&self, item_js: JsValue) -> Result<(), JsValue> {
        let item = serde_wasm_bindgen::from_value(item_js)?;
        self.client.select(&item);
        Ok(())
    }

    /// 参数为 `location.search`。
    pub async fn detail(&self, query: String) -> Result<JsValue, JsValue> {
        to_js(&self.client.detail(&query).await)
    }

    /// 内嵌的章节列表不会传给 JS，这里会重新加载一次详情作为后备来源。
    pub async fn episodes(&self, series_id: String) -> Result<JsValue, JsValue> {
        let detail = self.client.detail_by_id(&series_id).await;
        let episodes = match detail.ready() {
            Some(detail) => self.client.episodes(detail).await,
            None => {
                let bare = SeriesDetail {
                    requested_id: series_id.clone(),
                    item: crate::normalize::item::map_item(&serde_json::Value::Null),
                    embedded_chapters: Vec::new(),
                };
                self.client.episodes(&bare).await
            }
        };
        to_js(&episodes)
    }

    /// 剧集列表的一页。`episodes_js` 为 [`episodes`](Self::episodes) 返回的数组。
    #[wasm_bindgen(js_name = episodePage)]
    pub fn episode_page(&self, episodes_js: JsValue, page: usize) -> Result<JsValue, JsValue> {
        let episodes: Vec<EpisodeRef> = serde_wasm_bindgen::from_value(episodes_js)?;
        to_js(&self.client.episode_page(&episodes, page))
    }

    /// 搜索页的链接。
    #[wasm_bindgen(js_name = searchHref)]
    pub fn search_href(query: String) -> String {
        SearchLink { query }.href()
    }

    /// 为播放页创建控制器。
    pub fn player(&self) -> WasmEpisodeController {
        WasmEpisodeController::new(self.client.player(), self.client.config().clone())
    }
}

/// 播放页的控制器。
#[wasm_bindgen]
pub struct WasmEpisodeController {
    controller: AsyncMutex<EpisodeController>,
    config: CatalogConfig,
    notices: Arc<Mutex<Vec<String>>>,
}

impl WasmEpisodeController {
    fn new(controller: EpisodeController, config: CatalogConfig) -> Self {
        let notices = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&notices);
        let controller = controller.with_notice_sink(move |notice| {
            sink.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(notice.message());
        });
        Self {
            controller: AsyncMutex::new(controller),
            config,
            notices,
        }
    }
}

fn link_href(link: Option<WatchLink>) -> Option<String> {
    link.map(|link| link.href())
}

#[wasm_bindgen]
impl WasmEpisodeController {
    /// 加载剧集列表并定位到 `episode` 集，返回控制器状态。
    pub async fn load(&self, series_id: String, episode: u32) -> Result<JsValue, JsValue> {
        let state = self.controller.lock().await.load(&series_id, episode).await;
        to_js(&state)
    }

    /// 排序后的剧集列表。
    pub async fn episodes(&self) -> Result<JsValue, JsValue> {
        to_js(&self.controller.lock().await.episodes())
    }

    /// `caps_js` 形如 `{ hlsLibrary, nativeHls }`。
    #[wasm_bindgen(js_name = preparePlayback)]
    pub async fn prepare_playback(&self, caps_js: JsValue) -> Result<JsValue, JsValue> {
        let caps: PlayerCaps = serde_wasm_bindgen::from_value(caps_js)?;
        to_js(&self.controller.lock().await.prepare_playback(caps).await)
    }

    /// 上一集的链接，不存在时为 `undefined`。
    pub async fn previous(&self) -> Option<String> {
        link_href(self.controller.lock().await.previous())
    }

    /// 下一集的链接，不存在时为 `undefined`。
    pub async fn next(&self) -> Option<String> {
        link_href(self.controller.lock().await.next())
    }

    /// 视频的 `ended` 事件。等待自动跳转延迟后返回下一集的链接。
    ///
    /// 等待期间不持有锁，用户在此期间手动换集时返回 `undefined`。
    #[wasm_bindgen(js_name = onEnded)]
    pub async fn on_ended(&self) -> Option<String> {
        let (target, delay) = {
            let mut controller = self.controller.lock().await;
            (controller.on_ended()?, controller.auto_advance_delay())
        };
        timer::sleep(delay).await;
        link_href(self.controller.lock().await.advance(target))
    }

    /// 视频的 `timeupdate` 事件，返回是否写入了进度。
    #[wasm_bindgen(js_name = reportPosition)]
    pub async fn report_position(&self, elapsed: f64, duration: f64) -> bool {
        self.controller
            .lock()
            .await
            .report_position(elapsed, duration)
    }

    /// 续播位置（秒），不需要续播时为 `undefined`。
    #[wasm_bindgen(js_name = resumePosition)]
    pub async fn resume_position(&self, duration: f64) -> Option<f64> {
        self.controller.lock().await.resume_position(duration)
    }

    /// 轮询 `is_ready` 直到播放器可以跳转，然后返回续播位置。
    ///
    /// `is_ready` 是返回布尔值的函数，例如 `() => video.readyState >= 1`。
    #[wasm_bindgen(js_name = resumeWhenReady)]
    pub async fn resume_when_ready(&self, is_ready: js_sys::Function, duration: f64) -> Option<f64> {
        let probe = || {
            is_ready
                .call0(&JsValue::NULL)
                .is_ok_and(|value| value.is_truthy())
        };
        let ready = wait_until_ready(
            probe,
            self.config.ready_poll_interval(),
            self.config.ready_poll_timeout(),
        )
        .await;
        if !ready {
            tracing::warn!("[Player] 等待播放器就绪超时，跳过续播。");
            return None;
        }
        self.controller.lock().await.resume_position(duration)
    }

    /// 取出并清空尚未展示的提示。
    #[wasm_bindgen(js_name = takeNotices)]
    pub fn take_notices(&self) -> Vec<String> {
        std::mem::take(&mut *self.notices.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// 页面卸载时调用，保存最后的进度。
    pub async fn dispose(&self) {
        self.controller.lock().await.dispose();
    }
}

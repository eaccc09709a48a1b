//! 剧集导航控制器。
//!
//! 状态转移由纯函数 [`reduce`] 计算，[`EpisodeController`] 只负责执行它给出的副作用
//! （提示、保存进度、跳转）。生命周期为 `new → load → (导航)* → dispose`。

use std::{sync::Arc, time::Duration};

use serde::Serialize;
use serde_json::Value;

use crate::{
    api,
    config::CatalogConfig,
    links::WatchLink,
    model::{
        episode::EpisodeRef,
        playback::PlaybackSource,
        view::{Affordance, ViewState},
    },
    normalize::{envelope::unwrap_episode_list, episode::build_episode_list},
    player::{
        progress::{ProgressTracker, wait_until_ready},
        source::{self, PlayerCaps, PlayerSetup},
    },
    resolver::Resolver,
    storage::KeyValueStore,
    timer,
};

/// 播放页上显示给用户的提示。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerNotice {
    /// 即将自动播放下一集。
    LoadingNext,
    /// 已经是最后一集。
    LastEpisode,
    /// 这部剧没有可用的集数。
    NoEpisodes,
    /// 请求的集数不存在，已改为播放第 1 集。
    EpisodeNotFound {
        /// 请求的集数。
        requested: u32,
    },
    /// 从上次的位置继续播放。
    Resumed {
        /// 已保存的百分比。
        percent: String,
    },
}

impl PlayerNotice {
    /// 面向用户的提示文本。
    pub fn message(&self) -> String {
        match self {
            PlayerNotice::LoadingNext => "Memutar episode berikutnya...".to_string(),
            PlayerNotice::LastEpisode => "Ini adalah episode terakhir".to_string(),
            PlayerNotice::NoEpisodes => "Tidak ada episode tersedia untuk drama ini.".to_string(),
            PlayerNotice::EpisodeNotFound { requested } => {
                format!("Episode {requested} tidak valid, menggunakan episode 1")
            }
            PlayerNotice::Resumed { percent } => format!("Dilanjutkan dari {percent}%"),
        }
    }
}

/// 控制器的状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ControllerState {
    /// 尚未加载。
    Uninitialized,
    /// 正在获取剧集列表。
    Loading,
    /// 正在播放 `current`（排序后列表中的下标）。
    Ready {
        /// 当前集的下标。
        current: usize,
    },
    /// `current` 已播完，正在等待自动跳到下一集。
    Advancing {
        /// 播完的集的下标。
        current: usize,
    },
    /// 没有可用的集数。
    Empty,
    /// 已销毁，不再响应任何事件。
    Disposed,
}

impl ControllerState {
    /// 正在播放（或刚播完）的集的下标。
    pub fn current_index(&self) -> Option<usize> {
        match *self {
            ControllerState::Ready { current } | ControllerState::Advancing { current } => {
                Some(current)
            }
            _ => None,
        }
    }
}

/// 输入给 [`reduce`] 的事件。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerEvent {
    /// 开始加载。
    LoadStarted,
    /// 剧集列表已就绪，`requested` 为链接中请求的集数。
    Loaded {
        /// 请求的集数（从 1 开始）。
        requested: u32,
    },
    /// 用户点击"上一集"。
    Previous,
    /// 用户点击"下一集"。
    Next,
    /// 当前集播放结束。
    Ended,
    /// 自动跳转的等待时间已过。
    AdvanceElapsed,
    /// 页面卸载。
    Dispose,
}

/// [`reduce`] 要求执行的副作用。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// 显示提示。
    Notify(PlayerNotice),
    /// 立即保存当前进度。
    SaveProgress,
    /// 跳转到指定下标的集。
    Navigate(usize),
    /// 等待自动跳转的延迟后发送 [`ControllerEvent::AdvanceElapsed`]。
    ScheduleAdvance(usize),
}

/// 一次状态转移的结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// 新状态。
    pub state: ControllerState,
    /// 需要执行的副作用，按顺序执行。
    pub effects: Vec<Effect>,
}

impl Transition {
    fn stay(state: ControllerState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }
}

/// 计算状态转移。`len` 是剧集列表的长度。
///
/// 不可能的导航（第一集的"上一集"、最后一集的"下一集"）不会改变状态，也没有副作用。
/// [`ControllerEvent::AdvanceElapsed`] 只在 [`ControllerState::Advancing`] 中生效。
pub fn reduce(state: ControllerState, len: usize, event: ControllerEvent) -> Transition {
    use ControllerEvent as E;
    use ControllerState as S;

    match (state, event) {
        (S::Disposed, _) => Transition::stay(S::Disposed),
        (S::Ready { .. } | S::Advancing { .. }, E::Dispose) => Transition {
            state: S::Disposed,
            effects: vec![Effect::SaveProgress],
        },
        (_, E::Dispose) => Transition::stay(S::Disposed),
        (_, E::LoadStarted) => Transition::stay(S::Loading),

        (S::Loading, E::Loaded { .. }) if len == 0 => Transition {
            state: S::Empty,
            effects: vec![Effect::Notify(PlayerNotice::NoEpisodes)],
        },
        (S::Loading, E::Loaded { requested }) => {
            let index = requested.saturating_sub(1) as usize;
            if index < len {
                Transition::stay(S::Ready { current: index })
            } else {
                Transition {
                    state: S::Ready { current: 0 },
                    effects: vec![Effect::Notify(PlayerNotice::EpisodeNotFound { requested })],
                }
            }
        }

        // 手动导航会取消等待中的自动跳转。
        (S::Ready { current } | S::Advancing { current }, E::Previous) if current > 0 => {
            Transition {
                state: S::Ready {
                    current: current - 1,
                },
                effects: vec![Effect::SaveProgress, Effect::Navigate(current - 1)],
            }
        }
        (S::Ready { current } | S::Advancing { current }, E::Next) if current + 1 < len => {
            Transition {
                state: S::Ready {
                    current: current + 1,
                },
                effects: vec![Effect::SaveProgress, Effect::Navigate(current + 1)],
            }
        }
        (S::Advancing { current }, E::AdvanceElapsed) if current + 1 < len => Transition {
            state: S::Ready {
                current: current + 1,
            },
            effects: vec![Effect::SaveProgress, Effect::Navigate(current + 1)],
        },
        (S::Ready { current }, E::Ended) if current + 1 < len => Transition {
            state: S::Advancing { current },
            effects: vec![
                Effect::Notify(PlayerNotice::LoadingNext),
                Effect::ScheduleAdvance(current + 1),
            ],
        },
        (S::Ready { .. }, E::Ended) => Transition {
            state,
            effects: vec![Effect::Notify(PlayerNotice::LastEpisode)],
        },

        (state, _) => Transition::stay(state),
    }
}

/// 通知回调。
pub type NoticeSink = Box<dyn Fn(&PlayerNotice) + Send + Sync>;

/// 一次播放准备的结果。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreparedPlayback {
    /// 播放地址。
    pub source: PlaybackSource,
    /// 选用的播放方式。
    pub setup: PlayerSetup,
}

/// 播放页的导航控制器。
pub struct EpisodeController {
    resolver: Resolver,
    config: Arc<CatalogConfig>,
    series_id: Option<String>,
    episodes: Vec<EpisodeRef>,
    state: ControllerState,
    progress: ProgressTracker,
    notice_sink: Option<NoticeSink>,
}

impl EpisodeController {
    /// 创建控制器。进度写入 `progress_store`。
    pub fn new(
        resolver: Resolver,
        config: Arc<CatalogConfig>,
        progress_store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let progress = ProgressTracker::new(progress_store, &config);
        Self {
            resolver,
            config,
            series_id: None,
            episodes: Vec::new(),
            state: ControllerState::Uninitialized,
            progress,
            notice_sink: None,
        }
    }

    /// 设置提示回调。
    pub fn with_notice_sink(mut self, sink: impl Fn(&PlayerNotice) + Send + Sync + 'static) -> Self {
        self.notice_sink = Some(Box::new(sink));
        self
    }

    /// 当前状态。
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// 排序后的剧集列表。
    pub fn episodes(&self) -> &[EpisodeRef] {
        &self.episodes
    }

    /// 当前集。
    pub fn current(&self) -> Option<&EpisodeRef> {
        self.state
            .current_index()
            .and_then(|current| self.episodes.get(current))
    }

    /// "上一集"是否可用。
    pub fn can_go_previous(&self) -> bool {
        matches!(self.state.current_index(), Some(current) if current > 0)
    }

    /// "下一集"是否可用。
    pub fn can_go_next(&self) -> bool {
        matches!(self.state.current_index(), Some(current) if current + 1 < self.episodes.len())
    }

    /// 获取剧集列表并定位到 `requested` 集。
    ///
    /// 所有候选端点都没有返回非空列表时进入 [`ControllerState::Empty`]。
    pub async fn load(&mut self, series_id: &str, requested: u32) -> ControllerState {
        self.dispatch(ControllerEvent::LoadStarted);

        let candidates = api::episode_candidates(series_id, None);
        let payload = self
            .resolver
            .resolve_where(&candidates, |p| !unwrap_episode_list(p).is_empty())
            .await;
        let chapters: &[Value] = payload.as_ref().map(unwrap_episode_list).unwrap_or(&[]);

        self.finish_load(series_id, chapters, requested)
    }

    /// 使用已经拿到的原始章节列表完成加载。
    pub fn load_from(&mut self, series_id: &str, chapters: &[Value], requested: u32) -> ControllerState {
        self.dispatch(ControllerEvent::LoadStarted);
        self.finish_load(series_id, chapters, requested)
    }

    fn finish_load(&mut self, series_id: &str, chapters: &[Value], requested: u32) -> ControllerState {
        self.series_id = Some(series_id.to_string());
        self.episodes = build_episode_list(chapters);
        tracing::info!(
            "[Player] {} 共加载 {} 集，请求第 {} 集。",
            series_id,
            self.episodes.len(),
            requested
        );
        self.dispatch(ControllerEvent::Loaded { requested });
        self.state
    }

    /// 跳到上一集。不存在上一集时返回 `None`。
    pub fn previous(&mut self) -> Option<WatchLink> {
        self.navigate(ControllerEvent::Previous)
    }

    /// 跳到下一集。不存在下一集时返回 `None`。
    pub fn next(&mut self) -> Option<WatchLink> {
        self.navigate(ControllerEvent::Next)
    }

    /// 当前集播放结束。
    ///
    /// 存在下一集时提示并进入 [`ControllerState::Advancing`]，返回将要跳转的下标；
    /// 否则提示已是最后一集并返回 `None`。调用方等待
    /// [`auto_advance_delay`](Self::auto_advance_delay) 后用这个下标调用 [`advance`](Self::advance)。
    pub fn on_ended(&mut self) -> Option<usize> {
        self.dispatch(ControllerEvent::Ended)
            .into_iter()
            .find_map(|effect| match effect {
                Effect::ScheduleAdvance(index) => Some(index),
                _ => None,
            })
    }

    /// 自动跳转的等待时间已过，跳到 `target`。
    ///
    /// 等待期间用户手动换过集、页面已销毁，或者 `target` 不是当前等待的那一次跳转时，
    /// 什么也不做并返回 `None`。
    pub fn advance(&mut self, target: usize) -> Option<WatchLink> {
        match self.state {
            ControllerState::Advancing { current } if current + 1 == target => {
                self.navigate(ControllerEvent::AdvanceElapsed)
            }
            state => {
                tracing::debug!("[Player] 自动跳转到下标 {} 已取消，当前状态: {:?}", target, state);
                None
            }
        }
    }

    /// 自动跳转前的等待时间。
    pub fn auto_advance_delay(&self) -> Duration {
        self.config.auto_advance_delay()
    }

    /// 依次执行 [`on_ended`](Self::on_ended)、等待和 [`advance`](Self::advance)。
    ///
    /// 等待期间一直持有 `&mut self`，只适用于独占控制器的调用方。
    pub async fn finish_episode(&mut self) -> Option<WatchLink> {
        let target = self.on_ended()?;
        timer::sleep(self.auto_advance_delay()).await;
        self.advance(target)
    }

    /// 上报播放位置，按节流规则写入进度。
    pub fn report_position(&mut self, elapsed: f64, duration: f64) -> bool {
        let Some(episode) = self.current() else {
            return false;
        };
        let display_number = episode.display_number;
        let Some(series_id) = self.series_id.clone() else {
            return false;
        };
        self.progress
            .record(&series_id, display_number, elapsed, duration, chrono::Utc::now())
    }

    /// 当前集的续播位置。需要续播时会发出 [`PlayerNotice::Resumed`] 提示。
    pub fn resume_position(&self, duration: f64) -> Option<f64> {
        let episode = self.current()?;
        let series_id = self.series_id.as_deref()?;
        let position = self
            .progress
            .resume_position(series_id, episode.display_number, duration)?;

        if let Some(percent) = self.progress.saved_percent(series_id, episode.display_number) {
            self.notify(&PlayerNotice::Resumed { percent });
        }
        Some(position)
    }

    /// 等待 `probe` 报告播放器就绪后再计算续播位置。
    ///
    /// 按配置的间隔轮询，超时仍未就绪时放弃续播。
    pub async fn resume_when_ready<F>(&self, probe: F, duration: f64) -> Option<f64>
    where
        F: FnMut() -> bool,
    {
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
        self.resume_position(duration)
    }

    /// 查询当前集的播放地址并选择播放方式。
    ///
    /// 找不到地址或格式不受支持时返回带 `Retry` 和 `BackToDetail` 的失败状态。
    pub async fn prepare_playback(&self, caps: PlayerCaps) -> ViewState<PreparedPlayback> {
        let (Some(series_id), Some(episode)) = (self.series_id.as_deref(), self.current()) else {
            return ViewState::Empty;
        };

        let prepared = source::fetch_source(&self.resolver, series_id, episode, &self.config.lang)
            .await
            .and_then(|source| {
                PlayerSetup::choose(source.kind, caps).map(|setup| PreparedPlayback { source, setup })
            });

        match prepared {
            Ok(prepared) => ViewState::Ready(prepared),
            Err(e) => {
                tracing::error!("[Player] 加载第 {} 集失败: {}", episode.display_number, e);
                ViewState::failed(
                    "Gagal memuat video. Episode mungkin tidak tersedia.",
                    vec![Affordance::Retry, Affordance::BackToDetail],
                )
            }
        }
    }

    /// 销毁控制器，保存最后的进度。
    pub fn dispose(&mut self) {
        self.dispatch(ControllerEvent::Dispose);
    }

    fn navigate(&mut self, event: ControllerEvent) -> Option<WatchLink> {
        let effects = self.dispatch(event);
        let index = effects.iter().find_map(|effect| match effect {
            Effect::Navigate(index) => Some(*index),
            _ => None,
        })?;

        let episode = self.episodes.get(index)?;
        let series_id = self.series_id.clone()?;
        tracing::info!("[Player] 跳转到第 {} 集。", episode.display_number);
        Some(WatchLink {
            series_id,
            display_number: episode.display_number,
        })
    }

    fn dispatch(&mut self, event: ControllerEvent) -> Vec<Effect> {
        let transition = reduce(self.state, self.episodes.len(), event);
        self.state = transition.state;

        for effect in &transition.effects {
            match effect {
                Effect::Notify(notice) => self.notify(notice),
                Effect::SaveProgress => {
                    self.progress.flush();
                }
                Effect::Navigate(_) | Effect::ScheduleAdvance(_) => {}
            }
        }
        transition.effects
    }

    fn notify(&self, notice: &PlayerNotice) {
        match notice {
            PlayerNotice::EpisodeNotFound { requested } => {
                tracing::warn!("[Player] 第 {} 集不存在，改为播放第 1 集。", requested)
            }
            PlayerNotice::NoEpisodes => tracing::warn!("[Player] 没有可用的集数。"),
            _ => tracing::info!("[Player] {}", notice.message()),
        }
        if let Some(sink) = &self.notice_sink {
            sink(notice);
        }
    }
}

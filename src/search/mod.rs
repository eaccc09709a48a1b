//! 搜索页的输入处理。
//!
//! [`SearchSession`] 把防抖器与客户端组合在一起：每次输入只在静默期结束、
//! 且仍是最新输入时才发起请求，被新输入取代的进行中请求会被中止。

pub mod debounce;

use std::sync::{Arc, Mutex, PoisonError};

use futures::future::{AbortHandle, Abortable};

use crate::{
    CatalogClient,
    model::{catalog::CatalogItem, view::ViewState},
};
use debounce::{DebounceDecision, Debouncer, QueryTicket};

/// 一次输入的处理结果。
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// 输入为空。页面应清空结果并展示推荐内容。
    Cleared,
    /// 输入太短，没有发起请求。
    TooShort,
    /// 已被更新的输入取代，结果应丢弃。
    Superseded,
    /// 最新输入的结果。
    Results {
        /// 实际使用的查询词。
        query: String,
        /// 搜索建议。
        suggestions: Vec<String>,
        /// 搜索结果。
        items: ViewState<Vec<CatalogItem>>,
        /// 没有搜索结果时附带的推荐内容，其余情况为 `None`。
        recommendations: Option<ViewState<Vec<CatalogItem>>>,
    },
}

/// 搜索会话。可以在多个任务之间克隆共享。
#[derive(Clone)]
pub struct SearchSession {
    client: CatalogClient,
    debouncer: Debouncer,
    in_flight: Arc<Mutex<Option<AbortHandle>>>,
}

impl SearchSession {
    /// 使用客户端配置中的静默期与最短查询长度创建会话。
    pub fn new(client: CatalogClient) -> Self {
        let debouncer = Debouncer::new(
            client.config().debounce_delay(),
            client.config().min_query_chars,
        );
        Self {
            client,
            debouncer,
            in_flight: Arc::new(Mutex::new(None)),
        }
    }

    /// 处理一次输入。
    ///
    /// 返回之前会等待静默期，调用方应为每次输入单独启动一个任务。
    pub async fn input(&self, text: &str) -> SearchOutcome {
        let ticket = match self.debouncer.submit(text) {
            DebounceDecision::Cleared => {
                self.replace_in_flight(None);
                return SearchOutcome::Cleared;
            }
            DebounceDecision::TooShort => {
                self.replace_in_flight(None);
                return SearchOutcome::TooShort;
            }
            DebounceDecision::Scheduled(ticket) => ticket,
        };

        if !self.debouncer.settle(&ticket).await {
            return SearchOutcome::Superseded;
        }
        self.run(&ticket, true).await
    }

    /// 立即搜索（例如按下回车），不等待静默期也不检查最短长度。
    ///
    /// 排队中的输入和进行中的请求都会被取代。不获取搜索建议。
    pub async fn submit(&self, text: &str) -> SearchOutcome {
        match self.debouncer.submit_now(text) {
            DebounceDecision::Scheduled(ticket) => self.run(&ticket, false).await,
            DebounceDecision::Cleared => {
                self.replace_in_flight(None);
                SearchOutcome::Cleared
            }
            DebounceDecision::TooShort => {
                self.replace_in_flight(None);
                SearchOutcome::TooShort
            }
        }
    }

    async fn run(&self, ticket: &QueryTicket, with_suggestions: bool) -> SearchOutcome {
        let (handle, registration) = AbortHandle::new_pair();
        self.replace_in_flight(Some(handle));

        let query = ticket.query();
        tracing::debug!("[Search] 开始搜索 '{}'", query);
        let work = async {
            let suggestions = async {
                if with_suggestions {
                    self.client.suggestions(query).await
                } else {
                    Vec::new()
                }
            };
            let (suggestions, items) = futures::join!(suggestions, self.client.search(query));
            let recommendations = match items {
                ViewState::Empty => {
                    tracing::debug!("[Search] '{}' 没有结果，加载推荐内容。", query);
                    Some(self.client.recommendations().await)
                }
                _ => None,
            };
            (suggestions, items, recommendations)
        };

        match Abortable::new(work, registration).await {
            Ok((suggestions, items, recommendations)) if ticket.is_current() => {
                SearchOutcome::Results {
                    query: query.to_string(),
                    suggestions,
                    items,
                    recommendations,
                }
            }
            Ok(_) => {
                tracing::debug!("[Search] '{}' 的结果已过期，丢弃。", query);
                SearchOutcome::Superseded
            }
            Err(_) => {
                tracing::debug!("[Search] '{}' 的请求已被中止。", query);
                SearchOutcome::Superseded
            }
        }
    }

    /// 输入为空时展示的推荐内容。
    pub async fn recommendations(&self) -> ViewState<Vec<CatalogItem>> {
        self.client.recommendations().await
    }

    /// 替换进行中的请求，并中止被替换的那一个。
    fn replace_in_flight(&self, next: Option<AbortHandle>) {
        let mut guard = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = std::mem::replace(&mut *guard, next) {
            previous.abort();
        }
    }
}

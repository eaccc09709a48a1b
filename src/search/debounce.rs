//! 搜索输入的防抖。
//!
//! 每次输入都会让代数加一。只有持有最新代数的查询票据才允许更新界面，
//! 旧查询在等待期间或返回之后都会被丢弃。

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use crate::timer;

/// 一次输入对应的查询票据。
#[derive(Debug, Clone)]
pub struct QueryTicket {
    generation: u64,
    query: String,
    latest: Arc<AtomicU64>,
}

impl QueryTicket {
    /// 去除首尾空白后的查询词。
    pub fn query(&self) -> &str {
        &self.query
    }

    /// 是否仍是最新的输入。
    pub fn is_current(&self) -> bool {
        self.latest.load(Ordering::SeqCst) == self.generation
    }
}

/// [`Debouncer::submit`] 的结果。
#[derive(Debug, Clone)]
pub enum DebounceDecision {
    /// 输入为空，应当清空结果并显示推荐内容。
    Cleared,
    /// 输入太短，不发起请求。
    TooShort,
    /// 已排队，等待静默期结束。
    Scheduled(QueryTicket),
}

/// 搜索输入防抖器。可以被多个任务共享。
#[derive(Debug, Clone)]
pub struct Debouncer {
    latest: Arc<AtomicU64>,
    delay: Duration,
    min_chars: usize,
}

impl Debouncer {
    /// 创建防抖器。
    pub fn new(delay: Duration, min_chars: usize) -> Self {
        Self {
            latest: Arc::new(AtomicU64::new(0)),
            delay,
            min_chars,
        }
    }

    /// 提交一次输入。
    ///
    /// 无论结果如何都会使之前排队或进行中的查询失效。
    pub fn submit(&self, input: &str) -> DebounceDecision {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let query = input.trim();

        if query.is_empty() {
            return DebounceDecision::Cleared;
        }
        if query.chars().count() < self.min_chars {
            return DebounceDecision::TooShort;
        }

        DebounceDecision::Scheduled(QueryTicket {
            generation,
            query: query.to_string(),
            latest: Arc::clone(&self.latest),
        })
    }

    /// 提交一次需要立即执行的输入（例如按下回车）。
    ///
    /// 同样会使之前的查询失效，但不检查最短长度，也不需要等待静默期。
    pub fn submit_now(&self, input: &str) -> DebounceDecision {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let query = input.trim();

        if query.is_empty() {
            return DebounceDecision::Cleared;
        }

        DebounceDecision::Scheduled(QueryTicket {
            generation,
            query: query.to_string(),
            latest: Arc::clone(&self.latest),
        })
    }

    /// 等待静默期结束。
    ///
    /// # 返回
    /// 期间没有新的输入时返回 `true`。
    pub async fn settle(&self, ticket: &QueryTicket) -> bool {
        timer::sleep(self.delay).await;
        ticket.is_current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn debouncer() -> Debouncer {
        Debouncer::new(Duration::from_millis(300), 2)
    }

    #[test]
    fn test_submit_classifies_input() {
        let d = debouncer();
        assert!(matches!(d.submit("   "), DebounceDecision::Cleared));
        assert!(matches!(d.submit(" a "), DebounceDecision::TooShort));
        match d.submit("  ab ") {
            DebounceDecision::Scheduled(ticket) => assert_eq!(ticket.query(), "ab"),
            other => panic!("应当排队，实际为 {other:?}"),
        }
    }

    #[test]
    fn test_newer_input_invalidates_older_ticket() {
        let d = debouncer();
        let DebounceDecision::Scheduled(first) = d.submit("cinta") else {
            panic!("应当排队");
        };
        assert!(first.is_current());

        d.submit("c");
        assert!(!first.is_current());
    }

    #[test]
    fn test_submit_now_skips_length_check_and_invalidates() {
        let d = debouncer();
        let DebounceDecision::Scheduled(typed) = d.submit("cinta") else {
            panic!("应当排队");
        };

        match d.submit_now(" c ") {
            DebounceDecision::Scheduled(ticket) => {
                assert_eq!(ticket.query(), "c");
                assert!(ticket.is_current());
            }
            other => panic!("应当排队，实际为 {other:?}"),
        }
        assert!(!typed.is_current());
        assert!(matches!(d.submit_now("  "), DebounceDecision::Cleared));
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_last_of_rapid_inputs_settles() {
        let d = debouncer();
        let tickets: Vec<_> = ["ci", "cin", "cint", "cinta"]
            .iter()
            .filter_map(|q| match d.submit(q) {
                DebounceDecision::Scheduled(t) => Some(t),
                _ => None,
            })
            .collect();

        let settled = futures::future::join_all(tickets.iter().map(|t| d.settle(t))).await;
        assert_eq!(settled, vec![false, false, false, true]);
    }
}

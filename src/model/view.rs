//! 页面可见状态。
//!
//! 页面只会看到这里的状态，而不会直接拿到底层的技术错误。

use serde::{Deserialize, Serialize};

/// 失败状态下提供给用户的出路。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Affordance {
    /// 重试当前操作。
    Retry,
    /// 返回详情页。
    BackToDetail,
    /// 返回搜索页。
    BackToSearch,
}

/// 一个页面区块的最终状态。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ViewState<T> {
    /// 数据已就绪。
    Ready(T),
    /// 请求成功但结果为空。
    Empty,
    /// 加载失败。`affordances` 保证至少有一项。
    Failed {
        /// 面向用户的提示信息。
        message: String,
        /// 可用的操作。
        affordances: Vec<Affordance>,
    },
}

impl<T> ViewState<T> {
    /// 构造失败状态。如果没有给出任何操作，会补上 `Retry`。
    pub fn failed(message: impl Into<String>, mut affordances: Vec<Affordance>) -> Self {
        if affordances.is_empty() {
            affordances.push(Affordance::Retry);
        }
        ViewState::Failed {
            message: message.into(),
            affordances,
        }
    }

    /// 是否已就绪。
    pub fn is_ready(&self) -> bool {
        matches!(self, ViewState::Ready(_))
    }

    /// 取出就绪的数据。
    pub fn ready(&self) -> Option<&T> {
        match self {
            ViewState::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// 转换就绪的数据，其余状态原样保留。
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ViewState<U> {
        match self {
            ViewState::Ready(value) => ViewState::Ready(f(value)),
            ViewState::Empty => ViewState::Empty,
            ViewState::Failed {
                message,
                affordances,
            } => ViewState::Failed {
                message,
                affordances,
            },
        }
    }
}

impl<T> ViewState<Vec<T>> {
    /// 根据列表是否为空构造 `Ready` 或 `Empty`。
    pub fn from_list(list: Vec<T>) -> Self {
        if list.is_empty() {
            ViewState::Empty
        } else {
            ViewState::Ready(list)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_always_has_an_affordance() {
        let state: ViewState<()> = ViewState::failed("gagal", vec![]);
        match state {
            ViewState::Failed { affordances, .. } => {
                assert_eq!(affordances, vec![Affordance::Retry])
            }
            _ => panic!("应该是失败状态"),
        }
    }

    #[test]
    fn test_from_list() {
        assert_eq!(ViewState::<Vec<i32>>::from_list(vec![]), ViewState::Empty);
        assert_eq!(ViewState::from_list(vec![1]), ViewState::Ready(vec![1]));
    }
}

//! 定义了整个库通用的、与具体上游响应结构无关的核心数据模型。
//!
//! 所有页面流程在拿到上游的原始 JSON 之后，都需要先转换成这里的标准格式再使用。

pub mod catalog;
pub mod episode;
pub mod playback;
pub mod view;

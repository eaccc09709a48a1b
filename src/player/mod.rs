//! 播放页：剧集导航、播放地址与进度。

pub mod controller;
pub mod progress;
pub mod source;

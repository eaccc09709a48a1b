//! 播放地址查询与播放器选择。

use serde::{Deserialize, Serialize};

use crate::{
    api::{ApiRequest, models::PlayerRequest},
    error::{CatalogError, Result},
    model::{
        episode::EpisodeRef,
        playback::{PlaybackSource, StreamKind},
    },
    normalize::playback::extract_play_url,
    resolver::Resolver,
};

/// 播放环境的能力。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerCaps {
    /// 能否加载 HLS 播放库（如 hls.js）。
    pub hls_library: bool,
    /// 媒体元素能否原生播放 HLS（`application/vnd.apple.mpegurl`）。
    pub native_hls: bool,
}

/// 最终选用的播放方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlayerSetup {
    /// 通过 HLS 播放库播放。只有这种方式需要加载播放库。
    HlsLibrary,
    /// 由媒体元素原生播放 HLS。
    NativeHls,
    /// 直接把地址交给媒体元素。
    Direct,
}

impl PlayerSetup {
    /// 根据流类型与环境能力选择播放方式。
    ///
    /// HLS 流在既没有播放库、也不支持原生播放时返回 [`CatalogError::UnsupportedFormat`]。
    pub fn choose(kind: StreamKind, caps: PlayerCaps) -> Result<Self> {
        match kind {
            StreamKind::Direct => Ok(PlayerSetup::Direct),
            StreamKind::Hls if caps.hls_library => Ok(PlayerSetup::HlsLibrary),
            StreamKind::Hls if caps.native_hls => Ok(PlayerSetup::NativeHls),
            StreamKind::Hls => Err(CatalogError::UnsupportedFormat("HLS".to_string())),
        }
    }

    /// 是否需要加载 HLS 播放库。
    pub fn needs_hls_library(self) -> bool {
        self == PlayerSetup::HlsLibrary
    }
}

/// 查询某一集的播放地址。
pub async fn fetch_source(
    resolver: &Resolver,
    series_id: &str,
    episode: &EpisodeRef,
    lang: &str,
) -> Result<PlaybackSource> {
    let body = PlayerRequest {
        book_id: series_id.to_string(),
        chapter_index: episode.playback_index(),
        lang: lang.to_string(),
    };
    let request = ApiRequest::post("watch/player", serde_json::to_value(&body)?);

    let payload = resolver.fetch(&request).await?;
    let url = extract_play_url(&payload).ok_or(CatalogError::MissingPlayUrl)?;

    let source = PlaybackSource::new(url);
    tracing::info!(
        "[Player] 第 {} 集的播放地址: {:.100} ({:?})",
        episode.display_number,
        source.url,
        source.kind
    );
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockTransport;
    use serde_json::json;
    use std::{sync::Arc, time::Duration};

    fn episode(display_number: u32, raw_index: Option<i64>) -> EpisodeRef {
        EpisodeRef {
            display_number,
            raw_index,
            title: None,
            marker: i64::from(display_number),
        }
    }

    #[test]
    fn test_choose_player_setup() {
        let none = PlayerCaps::default();
        let library = PlayerCaps {
            hls_library: true,
            native_hls: true,
        };
        let native = PlayerCaps {
            hls_library: false,
            native_hls: true,
        };

        assert_eq!(
            PlayerSetup::choose(StreamKind::Direct, none).unwrap(),
            PlayerSetup::Direct
        );
        assert_eq!(
            PlayerSetup::choose(StreamKind::Hls, library).unwrap(),
            PlayerSetup::HlsLibrary
        );
        assert_eq!(
            PlayerSetup::choose(StreamKind::Hls, native).unwrap(),
            PlayerSetup::NativeHls
        );
        assert!(matches!(
            PlayerSetup::choose(StreamKind::Hls, none),
            Err(CatalogError::UnsupportedFormat(_))
        ));
        assert!(!PlayerSetup::Direct.needs_hls_library());
    }

    #[tokio::test]
    async fn test_fetch_source_posts_numeric_chapter_index() {
        let mock = MockTransport::new().json(
            "watch/player",
            json!({"data": {"videoUrl": "https://cdn/ep.m3u8"}}),
        );
        let resolver = Resolver::new(Arc::new(mock.clone()), Duration::from_secs(10));

        let source = fetch_source(&resolver, "9", &episode(3, None), "in")
            .await
            .unwrap();
        assert_eq!(source.kind, StreamKind::Hls);
        assert_eq!(
            mock.last_body().unwrap(),
            json!({"bookId": "9", "chapterIndex": 2, "lang": "in"})
        );
    }

    #[tokio::test]
    async fn test_fetch_source_without_url() {
        let mock = MockTransport::new().json("watch/player", json!({"data": {"status": "ok"}}));
        let resolver = Resolver::new(Arc::new(mock), Duration::from_secs(10));

        let result = fetch_source(&resolver, "9", &episode(1, Some(0)), "in").await;
        assert!(matches!(result, Err(CatalogError::MissingPlayUrl)));
    }
}

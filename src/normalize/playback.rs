//! 从播放接口的响应中提取视频地址。

use serde_json::Value;

/// 按优先级排列的已知地址位置（JSON Pointer）。
const KNOWN_URL_POINTERS: &[&str] = &[
    "/data/url",
    "/data/playUrl",
    "/data/videoUrl",
    "/data/sources/0/url",
    "/url",
    "/playUrl",
    "/videoUrl",
];

/// 路径中包含这些片段（不区分大小写）的属性会被当作候选地址。
const URL_PATH_HINTS: &[&str] = &["url", "video", "src"];

/// 提取可播放的地址。
///
/// 先检查已知位置，再按深度优先、先序的顺序扫描所有属性路径，
/// 返回第一个路径名包含 `url` / `video` / `src` 且值以 `http` 开头的字符串。
pub fn extract_play_url(payload: &Value) -> Option<&str> {
    KNOWN_URL_POINTERS
        .iter()
        .filter_map(|pointer| payload.pointer(pointer))
        .filter_map(Value::as_str)
        .find(|url| !url.trim().is_empty())
        .or_else(|| scan_for_url(payload, &mut String::new()))
}

fn scan_for_url<'a>(value: &'a Value, path: &mut String) -> Option<&'a str> {
    let children: Box<dyn Iterator<Item = (String, &'a Value)> + 'a> = match value {
        Value::Object(map) => Box::new(map.iter().map(|(k, v)| (k.clone(), v))),
        Value::Array(list) => Box::new(list.iter().enumerate().map(|(i, v)| (i.to_string(), v))),
        _ => return None,
    };

    for (key, child) in children {
        let parent_len = path.len();
        if !path.is_empty() {
            path.push('.');
        }
        path.push_str(&key);

        if let Some(url) = child
            .as_str()
            .filter(|s| s.starts_with("http") && path_has_hint(path))
        {
            return Some(url);
        }
        if let Some(url) = scan_for_url(child, path) {
            return Some(url);
        }

        path.truncate(parent_len);
    }
    None
}

fn path_has_hint(path: &str) -> bool {
    let lower = path.to_lowercase();
    URL_PATH_HINTS.iter().any(|hint| lower.contains(hint))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_known_locations_in_priority_order() {
        let payload = json!({
            "url": "https://top/level.mp4",
            "data": {"videoUrl": "https://data/video.m3u8", "playUrl": "https://data/play.mp4"}
        });
        assert_eq!(extract_play_url(&payload), Some("https://data/play.mp4"));

        let payload = json!({"data": {"sources": [{"url": "https://src/0.m3u8"}, {"url": "x"}]}});
        assert_eq!(extract_play_url(&payload), Some("https://src/0.m3u8"));

        let payload = json!({"videoUrl": "https://root/video.mp4"});
        assert_eq!(extract_play_url(&payload), Some("https://root/video.mp4"));
    }

    #[test]
    fn test_deep_scan_matches_path_hints() {
        let payload = json!({
            "data": {
                "meta": {"cover": "https://img/cover.jpg"},
                "qualities": [
                    {"label": "720p", "stream": {"src": "https://cdn/720.m3u8"}}
                ]
            }
        });
        assert_eq!(extract_play_url(&payload), Some("https://cdn/720.m3u8"));

        // 父路径命中即可
        let payload = json!({"result": {"video": {"hd": "https://cdn/hd.mp4"}}});
        assert_eq!(extract_play_url(&payload), Some("https://cdn/hd.mp4"));
    }

    #[test]
    fn test_missing_url() {
        assert_eq!(extract_play_url(&json!({"code": 0, "data": {}})), None);
        assert_eq!(
            extract_play_url(&json!({"data": {"videoPath": "/relative/ep.mp4"}})),
            None
        );
        assert_eq!(extract_play_url(&json!(null)), None);
    }
}

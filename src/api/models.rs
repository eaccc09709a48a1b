//! 与上游 API 约定的请求体结构。

use serde::{Deserialize, Serialize};

/// `POST /watch/player` 的请求体。
///
/// `chapter_index` 必须以数字形式发送，上游不接受字符串。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRequest {
    /// 剧集 ID。
    pub book_id: String,
    /// 上游的章节索引。
    pub chapter_index: i64,
    /// 语言。
    pub lang: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_player_request_wire_format() {
        let request = PlayerRequest {
            book_id: "41000102341".to_string(),
            chapter_index: 0,
            lang: "in".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"bookId": "41000102341", "chapterIndex": 0, "lang": "in"})
        );
    }
}

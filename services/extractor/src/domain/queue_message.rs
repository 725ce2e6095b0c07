// キューメッセージエンベロープ
//
// ディスパッチャーがSQSに投入し、ワーカーが受信するJSONエンベロープ。
// ワイヤーフォーマット: {"correlation_id": string, "text": string}

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::extract_request::ExtractUserRequest;

/// キューメッセージのエラー型
#[derive(Debug, Clone, Error, PartialEq)]
pub enum QueueMessageError {
    /// メッセージボディのJSONパースに失敗
    #[error("failed to parse queue message body")]
    InvalidJson,
}

/// 抽出リクエストと相関IDを運ぶキューエンベロープ
///
/// 相関IDは呼び出し元が受理応答とワーカー側のログを突き合わせるための
/// 情報的なトークンで、一意性の保証には使用しない（at-least-once配信）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueMessage {
    /// リクエストの相関ID
    pub correlation_id: String,
    /// 抽出対象テキスト
    pub text: String,
}

impl QueueMessage {
    /// 検証済みリクエストからエンベロープを作成
    pub fn new(correlation_id: impl Into<String>, request: &ExtractUserRequest) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            text: request.text.clone(),
        }
    }

    /// SQSメッセージボディをパース
    pub fn from_json(body: &str) -> Result<Self, QueueMessageError> {
        serde_json::from_str(body).map_err(|_| QueueMessageError::InvalidJson)
    }

    /// SQS送信用のJSON文字列にシリアライズ
    pub fn to_json(&self) -> String {
        // フィールドは文字列2つのみでシリアライズは失敗しない
        serde_json::to_string(self).unwrap_or_default()
    }

    /// ワーカー側で処理する抽出リクエストに戻す
    pub fn to_request(&self) -> ExtractUserRequest {
        ExtractUserRequest {
            text: self.text.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ==================== ラウンドトリップテスト ====================

    /// ディスパッチャーがシリアライズしたメッセージがワーカー側で
    /// 同一のリクエストに復元されることを確認
    #[test]
    fn test_round_trip_preserves_fields() {
        let request = ExtractUserRequest {
            text: "My name is Bob, I am 40 years old".to_string(),
        };
        let message = QueueMessage::new("req-12345", &request);

        let parsed = QueueMessage::from_json(&message.to_json()).unwrap();

        assert_eq!(parsed.correlation_id, "req-12345");
        assert_eq!(parsed.to_request(), request);
    }

    #[test]
    fn test_to_json_wire_format() {
        let message = QueueMessage {
            correlation_id: "abc".to_string(),
            text: "hello".to_string(),
        };

        let value: serde_json::Value = serde_json::from_str(&message.to_json()).unwrap();
        assert_eq!(value, json!({"correlation_id": "abc", "text": "hello"}));
    }

    // ==================== パーステスト ====================

    #[test]
    fn test_from_json_valid() {
        let body = r#"{"correlation_id": "req-1", "text": "some text"}"#;

        let message = QueueMessage::from_json(body).unwrap();
        assert_eq!(message.correlation_id, "req-1");
        assert_eq!(message.text, "some text");
    }

    #[test]
    fn test_from_json_invalid() {
        let result = QueueMessage::from_json("not json");
        assert_eq!(result, Err(QueueMessageError::InvalidJson));
    }

    #[test]
    fn test_from_json_missing_correlation_id() {
        let result = QueueMessage::from_json(r#"{"text": "hello"}"#);
        assert_eq!(result, Err(QueueMessageError::InvalidJson));
    }

    #[test]
    fn test_from_json_missing_text() {
        let result = QueueMessage::from_json(r#"{"correlation_id": "req-1"}"#);
        assert_eq!(result, Err(QueueMessageError::InvalidJson));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            QueueMessageError::InvalidJson.to_string(),
            "failed to parse queue message body"
        );
    }
}

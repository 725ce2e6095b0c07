/// ユーザー抽出リクエスト
///
/// HTTPボディのJSON（`{"text": string}`）をパース・検証する。
/// 同期エンドポイントと非同期エンドポイントは必ずこのパース関数を共有し、
/// 一方で拒否される入力はもう一方でも拒否される。
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// リクエストパースエラー
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RequestParseError {
    /// JSONパースに失敗、または`text`フィールドが欠落
    #[error("failed to parse request body")]
    InvalidJson,

    /// textが空（空白のみを含む）
    #[error("text must not be empty")]
    EmptyText,
}

/// ユーザー情報抽出の対象テキストを持つリクエスト
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractUserRequest {
    /// ユーザー情報を抽出する対象のテキスト
    pub text: String,
}

impl ExtractUserRequest {
    /// HTTPボディをパースして検証済みリクエストに変換
    ///
    /// # 引数
    /// * `body` - リクエストボディのJSON文字列
    ///
    /// # 戻り値
    /// * `Ok(ExtractUserRequest)` - パース・検証成功時
    /// * `Err(RequestParseError)` - パース失敗または空テキスト
    ///
    /// # 例
    /// ```
    /// use extractor::domain::ExtractUserRequest;
    ///
    /// let result = ExtractUserRequest::parse(r#"{"text": "My name is Bob"}"#);
    /// assert!(result.is_ok());
    /// ```
    pub fn parse(body: &str) -> Result<Self, RequestParseError> {
        let request: Self =
            serde_json::from_str(body).map_err(|_| RequestParseError::InvalidJson)?;

        request.validate()?;

        Ok(request)
    }

    /// リクエスト内容を検証
    ///
    /// 空白のみのテキストも空として拒否する
    pub fn validate(&self) -> Result<(), RequestParseError> {
        if self.text.trim().is_empty() {
            return Err(RequestParseError::EmptyText);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ==================== パーステスト ====================

    #[test]
    fn test_parse_valid_request() {
        let body = r#"{"text": "My name is Bob, I am 40 years old"}"#;

        let result = ExtractUserRequest::parse(body);
        assert!(result.is_ok());
        assert_eq!(
            result.unwrap().text,
            "My name is Bob, I am 40 years old"
        );
    }

    #[test]
    fn test_parse_ignores_unknown_fields() {
        let body = r#"{"text": "hello", "extra": 123}"#;

        let result = ExtractUserRequest::parse(body);
        assert!(result.is_ok());
        assert_eq!(result.unwrap().text, "hello");
    }

    #[test]
    fn test_parse_invalid_json() {
        let result = ExtractUserRequest::parse("not valid json");
        assert_eq!(result, Err(RequestParseError::InvalidJson));
    }

    #[test]
    fn test_parse_missing_text_field() {
        let result = ExtractUserRequest::parse(r#"{"message": "hello"}"#);
        assert_eq!(result, Err(RequestParseError::InvalidJson));
    }

    #[test]
    fn test_parse_text_not_string() {
        let result = ExtractUserRequest::parse(r#"{"text": 123}"#);
        assert_eq!(result, Err(RequestParseError::InvalidJson));
    }

    #[test]
    fn test_parse_json_array() {
        let result = ExtractUserRequest::parse(r#"["text"]"#);
        assert_eq!(result, Err(RequestParseError::InvalidJson));
    }

    // ==================== 検証テスト ====================

    #[test]
    fn test_parse_empty_text() {
        let result = ExtractUserRequest::parse(r#"{"text": ""}"#);
        assert_eq!(result, Err(RequestParseError::EmptyText));
    }

    #[test]
    fn test_parse_whitespace_only_text() {
        let result = ExtractUserRequest::parse(r#"{"text": "   \n\t "}"#);
        assert_eq!(result, Err(RequestParseError::EmptyText));
    }

    #[test]
    fn test_validate_non_empty_text() {
        let request = ExtractUserRequest {
            text: "some text".to_string(),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_parse_multibyte_text() {
        let body = json!({"text": "私の名前はボブです"}).to_string();

        let result = ExtractUserRequest::parse(&body);
        assert!(result.is_ok());
    }

    // ==================== エラー型テスト ====================

    #[test]
    fn test_error_display() {
        assert_eq!(
            RequestParseError::InvalidJson.to_string(),
            "failed to parse request body"
        );
        assert_eq!(
            RequestParseError::EmptyText.to_string(),
            "text must not be empty"
        );
    }
}

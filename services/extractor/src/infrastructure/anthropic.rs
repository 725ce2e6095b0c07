// AnthropicExtractor - Anthropic Messages API用HTTPクライアント
//
// テキストからユーザー情報を構造化抽出する。ツール呼び出し
// （record_userツール）の入力スキーマでUserの形を強制し、
// モデルがツールを呼ばなかった場合は「ユーザー情報なし」として扱う。

use async_trait::async_trait;
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, instrument};

use crate::domain::User;
use crate::infrastructure::AppConfig;

/// Anthropic Messages APIエンドポイント
const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Anthropic APIバージョンヘッダー値
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// レスポンスの最大トークン数
const MAX_TOKENS: u32 = 1024;

/// 抽出ツール名
const TOOL_NAME: &str = "record_user";

/// システムプロンプト
///
/// 確信が持てる値のみ抽出させ、情報がない場合はツールを呼ばせない
const SYSTEM_PROMPT: &str = "Extract user information from the provided text. \
If no valid user information is found, do not record anything. \
Only extract information if you're confident about the values.";

/// 最大再試行回数
const MAX_RETRIES: u32 = 3;

/// リクエストタイムアウト（秒）
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// 接続タイムアウト（秒）
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// 抽出処理のエラー型
///
/// # エラー種別
/// - `HttpError`: APIのエラーレスポンス
/// - `NetworkError`: ネットワーク接続エラー
/// - `InvalidResponse`: レスポンスの解釈に失敗
/// - `RetryExhausted`: 再試行回数超過
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// HTTPエラー（ステータスコード付き）
    #[error("Anthropic APIエラー: status={status}, message={message}")]
    HttpError {
        /// HTTPステータスコード
        status: u16,
        /// エラーメッセージ
        message: String,
    },

    /// ネットワークエラー
    #[error("ネットワークエラー: {0}")]
    NetworkError(String),

    /// レスポンスの解釈に失敗
    #[error("レスポンスの解釈に失敗: {0}")]
    InvalidResponse(String),

    /// 再試行回数超過エラー
    #[error("再試行回数超過: {0}")]
    RetryExhausted(String),
}

/// ユーザー抽出トレイト（テスト用の抽象化）
#[async_trait]
pub trait UserExtractor: Send + Sync {
    /// テキストからユーザー情報を抽出する
    ///
    /// # 戻り値
    /// * `Ok(Some(User))` - 抽出成功
    /// * `Ok(None)` - テキストに有効なユーザー情報がない
    /// * `Err(ExtractionError)` - API呼び出しエラー
    async fn extract_user(&self, text: &str) -> Result<Option<User>, ExtractionError>;
}

/// Anthropic Messages APIを使用したユーザー抽出実装
///
/// 指数バックオフによる再試行機能を持つ。再試行はHTTPミドルウェアに
/// 委ね、独自の再試行ループは持たない。
#[derive(Clone)]
pub struct AnthropicExtractor {
    /// HTTPクライアント（再試行ミドルウェア付き）
    client: ClientWithMiddleware,
    /// APIキー
    api_key: String,
    /// モデルID
    model: String,
}

impl std::fmt::Debug for AnthropicExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicExtractor")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl AnthropicExtractor {
    /// 新しいAnthropicExtractorを作成
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let model = model.into();

        info!(model = %model, "AnthropicExtractorを初期化");

        // 基本HTTPクライアントを作成
        let base_client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .expect("HTTPクライアントの構築に失敗");

        // 指数バックオフ再試行ポリシー
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(MAX_RETRIES);

        // 再試行ミドルウェア付きクライアントを構築
        let client = ClientBuilder::new(base_client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Self {
            client,
            api_key: api_key.into(),
            model,
        }
    }

    /// アプリケーション設定からAnthropicExtractorを作成
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.anthropic_api_key(), config.model())
    }

    /// record_userツールの入力スキーマを構築
    fn tool_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": {
                    "type": "string",
                    "description": "The name of the user."
                },
                "age": {
                    "type": "integer",
                    "description": "The age of the user."
                },
                "email": {
                    "type": "string",
                    "description": "The email of the user."
                }
            },
            "required": ["name", "age"]
        })
    }

    /// Messages APIのリクエストボディを構築
    fn request_body(&self, text: &str) -> Value {
        json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "system": SYSTEM_PROMPT,
            "messages": [
                {"role": "user", "content": text}
            ],
            "tools": [
                {
                    "name": TOOL_NAME,
                    "description": "Record the user information extracted from the text.",
                    "input_schema": Self::tool_schema()
                }
            ],
            "tool_choice": {"type": "auto"}
        })
    }

    /// Messages APIレスポンスから抽出結果を取り出す
    ///
    /// contentブロックのうちrecord_userツール呼び出しの入力をUserとして
    /// デシリアライズする。ツール呼び出しがない場合はモデルが情報なしと
    /// 判断したものとしてNoneを返す。
    fn parse_response(response: &Value) -> Result<Option<User>, ExtractionError> {
        let content = response
            .get("content")
            .and_then(|v| v.as_array())
            .ok_or_else(|| {
                ExtractionError::InvalidResponse("contentフィールドがありません".to_string())
            })?;

        for block in content {
            let is_tool_use = block.get("type").and_then(|v| v.as_str()) == Some("tool_use");
            let is_record_user = block.get("name").and_then(|v| v.as_str()) == Some(TOOL_NAME);

            if is_tool_use && is_record_user {
                let input = block.get("input").ok_or_else(|| {
                    ExtractionError::InvalidResponse(
                        "ツール呼び出しにinputがありません".to_string(),
                    )
                })?;

                let user: User = serde_json::from_value(input.clone()).map_err(|e| {
                    ExtractionError::InvalidResponse(format!(
                        "ツール入力のデシリアライズに失敗: {}",
                        e
                    ))
                })?;

                return Ok(Some(user));
            }
        }

        // ツール呼び出しなし＝有効なユーザー情報なし
        Ok(None)
    }
}

#[async_trait]
impl UserExtractor for AnthropicExtractor {
    #[instrument(skip(self, text))]
    async fn extract_user(&self, text: &str) -> Result<Option<User>, ExtractionError> {
        debug!(model = %self.model, "ユーザー情報抽出リクエスト送信");

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&self.request_body(text))
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Anthropic APIリクエスト失敗");
                if e.is_timeout() || e.is_connect() {
                    ExtractionError::NetworkError(e.to_string())
                } else {
                    ExtractionError::RetryExhausted(e.to_string())
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(
                status = %status,
                body = %body,
                "Anthropic APIエラーレスポンス"
            );
            return Err(ExtractionError::HttpError {
                status: status.as_u16(),
                message: body,
            });
        }

        let body: Value = response.json().await.map_err(|e| {
            error!(error = %e, "レスポンスボディのパースに失敗");
            ExtractionError::InvalidResponse(e.to_string())
        })?;

        let result = Self::parse_response(&body)?;

        info!(
            user_found = result.is_some(),
            "ユーザー情報抽出完了"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== リクエストボディテスト ====================

    #[test]
    fn test_request_body_shape() {
        let extractor = AnthropicExtractor::new("sk-ant-test", "claude-test-model");
        let body = extractor.request_body("My name is Bob");

        assert_eq!(body["model"], "claude-test-model");
        assert_eq!(body["max_tokens"], MAX_TOKENS);
        assert_eq!(body["system"], SYSTEM_PROMPT);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "My name is Bob");
        assert_eq!(body["tools"][0]["name"], TOOL_NAME);
        assert_eq!(body["tool_choice"]["type"], "auto");
    }

    #[test]
    fn test_tool_schema_requires_name_and_age() {
        let schema = AnthropicExtractor::tool_schema();

        let required = schema["required"].as_array().unwrap();
        assert!(required.contains(&json!("name")));
        assert!(required.contains(&json!("age")));
        assert!(!required.contains(&json!("email")));
        assert_eq!(schema["properties"]["age"]["type"], "integer");
    }

    // ==================== レスポンスパーステスト ====================

    /// "My name is Bob, I am 40 years old" に対する典型的なツール呼び出し応答
    #[test]
    fn test_parse_response_with_tool_use() {
        let response = json!({
            "id": "msg_01",
            "type": "message",
            "role": "assistant",
            "content": [
                {
                    "type": "tool_use",
                    "id": "toolu_01",
                    "name": "record_user",
                    "input": {"name": "Bob", "age": 40}
                }
            ],
            "stop_reason": "tool_use"
        });

        let result = AnthropicExtractor::parse_response(&response).unwrap();
        let user = result.expect("ユーザーが抽出されるべき");
        assert_eq!(user.name, "Bob");
        assert_eq!(user.age, 40);
        assert_eq!(user.email, None);
    }

    #[test]
    fn test_parse_response_with_email() {
        let response = json!({
            "content": [
                {
                    "type": "tool_use",
                    "name": "record_user",
                    "input": {"name": "Alice", "age": 31, "email": "alice@example.com"}
                }
            ]
        });

        let result = AnthropicExtractor::parse_response(&response).unwrap();
        assert_eq!(
            result.unwrap().email.as_deref(),
            Some("alice@example.com")
        );
    }

    /// ツール呼び出しなし（テキスト応答のみ）＝ユーザー情報なし
    #[test]
    fn test_parse_response_text_only_is_none() {
        let response = json!({
            "content": [
                {"type": "text", "text": "No user information found in the text."}
            ],
            "stop_reason": "end_turn"
        });

        let result = AnthropicExtractor::parse_response(&response).unwrap();
        assert_eq!(result, None);
    }

    /// 先行するテキストブロックがあってもツール呼び出しを見つける
    #[test]
    fn test_parse_response_mixed_blocks() {
        let response = json!({
            "content": [
                {"type": "text", "text": "I found user information."},
                {
                    "type": "tool_use",
                    "name": "record_user",
                    "input": {"name": "Carol", "age": 25}
                }
            ]
        });

        let result = AnthropicExtractor::parse_response(&response).unwrap();
        assert_eq!(result.unwrap().name, "Carol");
    }

    /// 別名のツール呼び出しは無視する
    #[test]
    fn test_parse_response_other_tool_ignored() {
        let response = json!({
            "content": [
                {
                    "type": "tool_use",
                    "name": "other_tool",
                    "input": {"name": "Bob", "age": 40}
                }
            ]
        });

        let result = AnthropicExtractor::parse_response(&response).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_parse_response_missing_content() {
        let response = json!({"id": "msg_01"});

        let result = AnthropicExtractor::parse_response(&response);
        assert!(result.is_err());
        match result.unwrap_err() {
            ExtractionError::InvalidResponse(msg) => {
                assert!(msg.contains("content"));
            }
            other => panic!("予期しないエラー型: {:?}", other),
        }
    }

    #[test]
    fn test_parse_response_invalid_tool_input() {
        let response = json!({
            "content": [
                {
                    "type": "tool_use",
                    "name": "record_user",
                    "input": {"name": "Bob", "age": "forty"}
                }
            ]
        });

        let result = AnthropicExtractor::parse_response(&response);
        assert!(result.is_err());
        match result.unwrap_err() {
            ExtractionError::InvalidResponse(msg) => {
                assert!(msg.contains("デシリアライズ"));
            }
            other => panic!("予期しないエラー型: {:?}", other),
        }
    }

    // ==================== クライアント作成テスト ====================

    #[test]
    fn test_debug_hides_api_key() {
        let extractor = AnthropicExtractor::new("sk-ant-supersecret", "claude-test-model");

        let debug_str = format!("{:?}", extractor);
        assert!(debug_str.contains("AnthropicExtractor"));
        assert!(debug_str.contains("claude-test-model"));
        assert!(!debug_str.contains("sk-ant-supersecret"));
    }

    #[test]
    fn test_client_is_clone() {
        let extractor = AnthropicExtractor::new("sk-ant-test", "claude-test-model");
        let _cloned = extractor.clone();
    }

    // ==================== エラー型テスト ====================

    #[test]
    fn test_error_display_http_error() {
        let error = ExtractionError::HttpError {
            status: 529,
            message: "overloaded_error".to_string(),
        };
        let display = error.to_string();
        assert!(display.contains("529"));
        assert!(display.contains("overloaded_error"));
    }

    #[test]
    fn test_error_display_network_error() {
        let error = ExtractionError::NetworkError("connection refused".to_string());
        assert!(error.to_string().contains("ネットワークエラー"));
    }

    // ==================== 定数値テスト ====================

    #[test]
    fn test_max_retries() {
        assert_eq!(MAX_RETRIES, 3);
    }

    #[test]
    fn test_timeouts() {
        assert_eq!(REQUEST_TIMEOUT_SECS, 30);
        assert_eq!(CONNECT_TIMEOUT_SECS, 10);
    }
}

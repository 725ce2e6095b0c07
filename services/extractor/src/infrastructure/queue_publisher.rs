// 非同期抽出用のキュー発行クライアント
//
// 受け付けたリクエストをSQSキューに発行し、ワーカーLambdaに
// 処理を委ねる。発行の成否はSQSのメッセージIDで確認する。

use async_trait::async_trait;
use aws_sdk_sqs::Client as SqsClient;
use thiserror::Error;
use tracing::{error, info, instrument};

use crate::domain::QueueMessage;

/// キュー発行のエラー型
#[derive(Debug, Error)]
pub enum QueuePublishError {
    /// AWS SDK エラー
    #[error("SQS APIエラー: {0}")]
    AwsSdkError(String),

    /// メッセージのシリアライズに失敗
    #[error("メッセージのシリアライズに失敗: {0}")]
    SerializeError(String),
}

/// キュー発行トレイト（テスト用の抽象化）
#[async_trait]
pub trait QueuePublisher: Send + Sync {
    /// メッセージをキューに発行する
    ///
    /// # 戻り値
    /// * `Ok(String)` - SQSが採番したメッセージID
    /// * `Err(QueuePublishError)` - 発行エラー
    async fn publish(&self, message: &QueueMessage) -> Result<String, QueuePublishError>;
}

/// AWS SQSを使用したキュー発行実装
#[derive(Debug, Clone)]
pub struct SqsQueuePublisher {
    /// SQSクライアント
    client: SqsClient,
    /// 発行先キューのURL
    queue_url: String,
}

impl SqsQueuePublisher {
    /// 新しいSqsQueuePublisherを作成
    pub fn new(client: SqsClient, queue_url: impl Into<String>) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
        }
    }

    /// AWS設定からデフォルトのクライアントを作成
    pub async fn from_config(queue_url: impl Into<String>) -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let client = SqsClient::new(&config);
        Self::new(client, queue_url)
    }
}

#[async_trait]
impl QueuePublisher for SqsQueuePublisher {
    #[instrument(skip(self, message), fields(correlation_id = %message.correlation_id))]
    async fn publish(&self, message: &QueueMessage) -> Result<String, QueuePublishError> {
        let body = serde_json::to_string(message)
            .map_err(|e| QueuePublishError::SerializeError(e.to_string()))?;

        let response = self
            .client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(|e| {
                let service_err = e.into_service_error();
                error!(
                    error = %service_err,
                    correlation_id = %message.correlation_id,
                    "SQSメッセージ発行に失敗"
                );
                QueuePublishError::AwsSdkError(service_err.to_string())
            })?;

        // メッセージIDが返らない場合は発行失敗として扱う
        let message_id = response.message_id().ok_or_else(|| {
            QueuePublishError::AwsSdkError("メッセージIDが返されませんでした".to_string())
        })?;

        info!(
            message_id = %message_id,
            correlation_id = %message.correlation_id,
            "SQSメッセージ発行成功"
        );

        Ok(message_id.to_string())
    }
}

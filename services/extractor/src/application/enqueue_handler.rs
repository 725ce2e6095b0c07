// 非同期抽出の受付ユースケース
//
// リクエストを検証し、相関IDを採番してキューに発行する。
// 抽出そのものはワーカーLambdaが行う。

use thiserror::Error;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::{ExtractUserRequest, QueueMessage, RequestParseError};
use crate::infrastructure::{QueuePublishError, QueuePublisher};

/// 非同期受付のエラー型
#[derive(Debug, Error)]
pub enum EnqueueError {
    /// リクエストが不正（クライアント起因）
    #[error(transparent)]
    Request(#[from] RequestParseError),

    /// キュー発行に失敗
    #[error(transparent)]
    Publish(#[from] QueuePublishError),
}

/// 非同期受付ハンドラー
pub struct EnqueueHandler<Q: QueuePublisher> {
    /// キュー発行クライアント
    publisher: Q,
}

impl<Q: QueuePublisher> EnqueueHandler<Q> {
    /// 新しいEnqueueHandlerを作成
    pub fn new(publisher: Q) -> Self {
        Self { publisher }
    }

    /// リクエストを検証してキューに発行し、相関IDを返す
    ///
    /// 相関IDはリクエストごとにUUID v4で採番する。呼び出し元は
    /// このIDでワーカー側のログと突き合わせできる。
    #[instrument(skip(self, body))]
    pub async fn handle(&self, body: &str) -> Result<String, EnqueueError> {
        // 検証が通らないリクエストはキューに到達させない
        let request = ExtractUserRequest::parse(body)?;

        let correlation_id = Uuid::new_v4().to_string();
        let message = QueueMessage::new(&correlation_id, &request);

        let message_id = self.publisher.publish(&message).await?;

        info!(
            correlation_id = %correlation_id,
            message_id = %message_id,
            "抽出リクエストをキューに発行"
        );

        Ok(correlation_id)
    }
}

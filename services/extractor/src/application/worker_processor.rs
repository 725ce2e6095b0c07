// SQSイベント処理ユースケース
//
// ワーカーLambdaが受信したSQSイベントの各レコードを処理する。
// 失敗が1件でもあればイベント全体をエラーとし、SQSの再配信に委ねる。
// 空ボディや空テキストは再配信しても成功しないためスキップとして扱う。

use aws_lambda_events::event::sqs::{SqsEvent, SqsMessage};
use tracing::{error, info, instrument, warn};

use crate::domain::QueueMessage;
use crate::infrastructure::UserExtractor;

/// イベント処理の結果集計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessResult {
    /// 処理に成功したレコード数
    pub success_count: usize,
    /// 処理に失敗したレコード数
    pub failure_count: usize,
    /// スキップしたレコード数
    pub skip_count: usize,
}

impl ProcessResult {
    /// 失敗したレコードがあるかどうか
    pub fn has_failures(&self) -> bool {
        self.failure_count > 0
    }
}

/// レコード単位の処理結果
enum RecordOutcome {
    Success,
    Failure,
    Skip,
}

/// SQSイベントのワーカープロセッサー
pub struct WorkerProcessor<E: UserExtractor> {
    /// ユーザー抽出クライアント
    extractor: E,
}

impl<E: UserExtractor> WorkerProcessor<E> {
    /// 新しいWorkerProcessorを作成
    pub fn new(extractor: E) -> Self {
        Self { extractor }
    }

    /// SQSイベント全体を処理する
    #[instrument(skip(self, event), fields(record_count = event.records.len()))]
    pub async fn process_event(&self, event: &SqsEvent) -> ProcessResult {
        let mut result = ProcessResult::default();

        for record in &event.records {
            match self.process_record(record).await {
                RecordOutcome::Success => result.success_count += 1,
                RecordOutcome::Failure => result.failure_count += 1,
                RecordOutcome::Skip => result.skip_count += 1,
            }
        }

        info!(
            success_count = result.success_count,
            failure_count = result.failure_count,
            skip_count = result.skip_count,
            "SQSイベント処理完了"
        );

        result
    }

    /// 1レコードを処理する
    async fn process_record(&self, record: &SqsMessage) -> RecordOutcome {
        let message_id = record.message_id.as_deref().unwrap_or("unknown");

        // ボディなし/空ボディは再配信しても成功しないためスキップ
        let body = match record.body.as_deref() {
            Some(body) if !body.trim().is_empty() => body,
            _ => {
                warn!(message_id = %message_id, "ボディが空のレコードをスキップ");
                return RecordOutcome::Skip;
            }
        };

        // エンベロープのパース失敗は発行側の不具合の可能性があるため
        // 失敗として記録し、再配信とDLQの仕組みに委ねる
        let message = match QueueMessage::from_json(body) {
            Ok(message) => message,
            Err(e) => {
                error!(
                    message_id = %message_id,
                    error = %e,
                    "キューメッセージのパースに失敗"
                );
                return RecordOutcome::Failure;
            }
        };

        let request = message.to_request();

        // 空テキストは再配信しても成功しない
        if let Err(e) = request.validate() {
            warn!(
                message_id = %message_id,
                correlation_id = %message.correlation_id,
                error = %e,
                "不正なリクエストをスキップ"
            );
            return RecordOutcome::Skip;
        }

        match self.extractor.extract_user(&request.text).await {
            Ok(user) => {
                // 抽出結果なし(None)も正常な結果として成功扱い
                info!(
                    message_id = %message_id,
                    correlation_id = %message.correlation_id,
                    user_found = user.is_some(),
                    "レコード処理成功"
                );
                RecordOutcome::Success
            }
            Err(e) => {
                error!(
                    message_id = %message_id,
                    correlation_id = %message.correlation_id,
                    error = %e,
                    "ユーザー情報抽出に失敗"
                );
                RecordOutcome::Failure
            }
        }
    }
}

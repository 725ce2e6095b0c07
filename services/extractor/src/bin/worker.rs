/// 抽出ワーカーLambda関数
///
/// SQSキューのメッセージからユーザー情報を抽出する。
/// 失敗したレコードがあればエラーを返し、SQSの再配信に委ねる。
use aws_lambda_events::event::sqs::SqsEvent;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use tracing::{error, info};

use extractor::application::WorkerProcessor;
use extractor::infrastructure::{init_logging, AnthropicExtractor, AppConfig};

#[tokio::main]
async fn main() -> Result<(), Error> {
    // ローカル実行時は.envを読み込む（存在しなければ何もしない）
    dotenvy::dotenv().ok();

    // 構造化ログを初期化
    init_logging();

    // 設定を解決（必須シークレットが欠落していればここで起動失敗）
    let config = AppConfig::load().await.map_err(|e| {
        error!(error = %e, "設定の読み込みに失敗");
        e
    })?;

    info!(config = ?config, "抽出ワーカーLambda関数を初期化");

    let extractor = AnthropicExtractor::from_config(&config);
    let processor = WorkerProcessor::new(extractor);
    let processor_ref = &processor;

    // Lambda関数を実行
    lambda_runtime::run(service_fn(move |event: LambdaEvent<SqsEvent>| async move {
        handler(processor_ref, event).await
    }))
    .await
}

/// SQSイベントハンドラー
///
/// # 処理フロー
/// 1. イベント内の各レコードをパースして抽出を実行
/// 2. 成功/失敗/スキップ件数を集計してログに記録
/// 3. 失敗があればエラーを返してSQSの再配信をトリガー
async fn handler(
    processor: &WorkerProcessor<AnthropicExtractor>,
    event: LambdaEvent<SqsEvent>,
) -> Result<(), Error> {
    let event = event.payload;

    info!(record_count = event.records.len(), "SQSイベントを受信");

    let result = processor.process_event(&event).await;

    info!(
        success_count = result.success_count,
        failure_count = result.failure_count,
        skip_count = result.skip_count,
        "抽出処理完了"
    );

    // 失敗があった場合はエラーを返す（SQS再配信をトリガー）
    if result.has_failures() {
        return Err(format!("抽出処理に失敗: {} 件の失敗", result.failure_count).into());
    }

    Ok(())
}

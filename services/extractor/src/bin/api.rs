/// 抽出API HTTP Lambdaエントリポイント
///
/// API Gateway経由のHTTPリクエストをパスとメソッドでルーティングする。
/// - GET  …/examples/hello              疎通確認
/// - POST …/examples/extract-user       同期抽出
/// - POST …/examples/extract-user-async キュー受付（非同期抽出）
use lambda_http::{run, service_fn, Body, Error, Request, RequestExt, Response};
use serde_json::json;
use tracing::{error, info, warn};

use extractor::application::{
    EnqueueError, EnqueueHandler, ExtractUserError, ExtractUserHandler,
};
use extractor::infrastructure::{
    init_logging, AnthropicExtractor, AppConfig, QueuePublisher, SqsQueuePublisher, UserExtractor,
};

/// APIの共有状態
///
/// 設定の解決とクライアントの構築は起動時に1回だけ行い、
/// リクエスト処理ではこの状態を参照する。
struct AppState<E: UserExtractor, Q: QueuePublisher> {
    /// 同期抽出ハンドラー
    extract_handler: ExtractUserHandler<E>,
    /// 非同期受付ハンドラー（キューURL未設定なら無効）
    enqueue_handler: Option<EnqueueHandler<Q>>,
}

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

    info!(config = ?config, "抽出API Lambda関数を初期化");

    let extractor = AnthropicExtractor::from_config(&config);
    let extract_handler = ExtractUserHandler::new(extractor);

    // キューURLが設定されていなければ非同期受付は無効
    let enqueue_handler = match config.queue_url() {
        Some(queue_url) => Some(EnqueueHandler::new(
            SqsQueuePublisher::from_config(queue_url).await,
        )),
        None => {
            warn!("SQS_QUEUE_URLが未設定のため非同期受付を無効化");
            None
        }
    };

    let state = AppState {
        extract_handler,
        enqueue_handler,
    };
    let state_ref = &state;

    // Lambda関数を実行
    run(service_fn(move |request: Request| async move {
        handler(state_ref, request).await
    }))
    .await
}

/// HTTPリクエストハンドラー
///
/// パス末尾のセグメントでルーティングする。API Gatewayのステージ
/// プレフィックス（/prod等）が付いていても動作する。
async fn handler<E: UserExtractor, Q: QueuePublisher>(
    state: &AppState<E, Q>,
    request: Request,
) -> Result<Response<Body>, Error> {
    let method = request.method().as_str().to_string();
    let path = request.raw_http_path().trim_end_matches('/').to_string();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    info!(method = %method, path = %path, "HTTPリクエスト受信");

    match (method.as_str(), segments.as_slice()) {
        ("GET", [.., "examples", "hello"]) => handle_hello(),
        ("POST", [.., "examples", "extract-user"]) => {
            handle_extract_user(state, request.body()).await
        }
        ("POST", [.., "examples", "extract-user-async"]) => {
            handle_extract_user_async(state, request.body()).await
        }
        _ => {
            warn!(method = %method, path = %path, "ルートが見つかりません");
            json_response(404, &json!({"detail": "Not Found"}))
        }
    }
}

/// 疎通確認エンドポイント
fn handle_hello() -> Result<Response<Body>, Error> {
    json_response(200, &json!("Hello, world!"))
}

/// 同期抽出エンドポイント
///
/// 抽出結果のユーザー（情報がなければnull）をそのまま返す。
async fn handle_extract_user<E: UserExtractor, Q: QueuePublisher>(
    state: &AppState<E, Q>,
    body: &Body,
) -> Result<Response<Body>, Error> {
    let body = body_as_str(body);

    match state.extract_handler.handle(&body).await {
        Ok(user) => json_response(200, &json!(user)),
        Err(ExtractUserError::Request(e)) => {
            warn!(error = %e, "リクエスト検証エラー");
            json_response(400, &json!({"detail": e.to_string()}))
        }
        Err(ExtractUserError::Upstream(e)) => {
            error!(error = %e, "抽出クライアントエラー");
            json_response(502, &json!({"detail": "Upstream extraction failed"}))
        }
    }
}

/// 非同期受付エンドポイント
///
/// キューへの発行が成功した時点で202を返す。相関IDで
/// ワーカー側のログと突き合わせできる。
async fn handle_extract_user_async<E: UserExtractor, Q: QueuePublisher>(
    state: &AppState<E, Q>,
    body: &Body,
) -> Result<Response<Body>, Error> {
    let Some(enqueue_handler) = &state.enqueue_handler else {
        error!("SQS_QUEUE_URLが未設定のまま非同期受付を要求されました");
        return json_response(500, &json!({"detail": "SQS queue URL not configured"}));
    };

    let body = body_as_str(body);

    match enqueue_handler.handle(&body).await {
        Ok(correlation_id) => json_response(202, &json!({"correlation_id": correlation_id})),
        Err(EnqueueError::Request(e)) => {
            warn!(error = %e, "リクエスト検証エラー");
            json_response(400, &json!({"detail": e.to_string()}))
        }
        Err(EnqueueError::Publish(e)) => {
            error!(error = %e, "キュー発行エラー");
            json_response(500, &json!({"detail": "Failed to enqueue request"}))
        }
    }
}

/// リクエストボディを文字列として取り出す
fn body_as_str(body: &Body) -> String {
    match body {
        Body::Text(text) => text.clone(),
        Body::Binary(bytes) => String::from_utf8_lossy(bytes).to_string(),
        Body::Empty => String::new(),
        _ => String::new(),
    }
}

/// JSONレスポンスを構築する
fn json_response(status: u16, body: &serde_json::Value) -> Result<Response<Body>, Error> {
    let response = Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::Text(body.to_string()))?;
    Ok(response)
}

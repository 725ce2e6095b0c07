/// アプリケーション設定
///
/// プロセス起動時に一度だけ構築し、各ハンドラーへ参照で渡す設定オブジェクト。
/// シークレットの解決もここで完了させ、以降の処理では環境変数を参照しない。
///
/// シークレット取得元の選択:
/// - 環境変数`AWS_EXECUTION_ENV`が存在する場合（Lambda実行）はSecrets Manager
/// - それ以外（ローカル実行）はプロセス環境変数（.env読み込み後）
use thiserror::Error;
use tracing::{info, warn};

use super::secrets::{
    EnvSecretSource, SecretResolver, SecretResolverError, SecretSource, SecretSpec,
    SecretsManagerSecretSource,
};

/// クラウド実行マーカーの環境変数名
const CLOUD_EXECUTION_MARKER: &str = "AWS_EXECUTION_ENV";

/// デフォルトの抽出モデル
const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";

/// デフォルトのLangFuseホスト
const DEFAULT_LANGFUSE_HOST: &str = "https://us.cloud.langfuse.com";

/// Anthropic APIキー（必須 - 両モードで解決できなければ起動失敗）
pub const ANTHROPIC_API_KEY: SecretSpec = SecretSpec {
    logical_name: "anthropic_api_key",
    env_var: "ANTHROPIC_API_KEY",
    override_var: "ANTHROPIC_API_KEY_SECRET_NAME",
    required: true,
};

/// LangFuse公開キー（任意 - 未設定ならトレーシング無効）
pub const LANGFUSE_PUBLIC_KEY: SecretSpec = SecretSpec {
    logical_name: "langfuse_public_key",
    env_var: "LANGFUSE_PUBLIC_KEY",
    override_var: "LANGFUSE_PUBLIC_KEY_SECRET_NAME",
    required: false,
};

/// LangFuse秘密キー（任意 - 未設定ならトレーシング無効）
pub const LANGFUSE_SECRET_KEY: SecretSpec = SecretSpec {
    logical_name: "langfuse_secret_key",
    env_var: "LANGFUSE_SECRET_KEY",
    override_var: "LANGFUSE_SECRET_KEY_SECRET_NAME",
    required: false,
};

/// アプリケーション設定のエラー型
#[derive(Debug, Error)]
pub enum AppConfigError {
    /// 必須の環境変数が設定されていない
    #[error("必須の環境変数が設定されていません: {0}")]
    MissingEnvVar(String),

    /// シークレット解決エラー
    #[error("シークレット解決エラー: {0}")]
    Secret(#[from] SecretResolverError),
}

/// LangFuseトレーシング設定
///
/// 公開キーと秘密キーの両方が解決できた場合のみ構築される。
#[derive(Debug, Clone)]
pub struct LangfuseConfig {
    public_key: String,
    secret_key: String,
    host: String,
}

impl LangfuseConfig {
    /// 新しいLangfuseConfigを作成
    pub fn new(
        public_key: impl Into<String>,
        secret_key: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        Self {
            public_key: public_key.into(),
            secret_key: secret_key.into(),
            host: host.into(),
        }
    }

    /// 公開キーを取得
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// 秘密キーを取得
    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    /// ホストURLを取得
    pub fn host(&self) -> &str {
        &self.host
    }
}

/// 解決済みアプリケーション設定
#[derive(Clone)]
pub struct AppConfig {
    /// 抽出に使用するモデルID
    model: String,
    /// ステージ名（シークレットパスの構成に使用）
    stage: String,
    /// SQSキューURL（未設定なら非同期エンドポイント無効）
    queue_url: Option<String>,
    /// Anthropic APIキー
    anthropic_api_key: String,
    /// LangFuse設定（未設定ならトレーシング無効）
    langfuse: Option<LangfuseConfig>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("model", &self.model)
            .field("stage", &self.stage)
            .field("queue_url", &self.queue_url)
            .field("langfuse_enabled", &self.langfuse.is_some())
            .finish_non_exhaustive()
    }
}

impl AppConfig {
    /// クラウド実行環境かどうかを判定
    pub fn is_cloud_execution() -> bool {
        std::env::var(CLOUD_EXECUTION_MARKER).is_ok()
    }

    /// 環境に応じたシークレット取得元で設定を読み込む
    ///
    /// クラウド実行マーカーが存在しない場合、リモートのシークレットストアには
    /// 一切アクセスしない。必須シークレットが解決できなければエラーを返し、
    /// 呼び出し側（エントリポイント）はリクエストを受け付ける前に終了する。
    pub async fn load() -> Result<Self, AppConfigError> {
        let stage = std::env::var("STACK_NAME")
            .map_err(|_| AppConfigError::MissingEnvVar("STACK_NAME".to_string()))?;

        if Self::is_cloud_execution() {
            info!(stage = %stage, "クラウド実行モード: Secrets Managerからシークレットを解決");
            let source = SecretsManagerSecretSource::from_config(stage.clone()).await;
            Self::load_with_source(source, stage).await
        } else {
            info!(stage = %stage, "ローカル実行モード: 環境変数からシークレットを解決");
            Self::load_with_source(EnvSecretSource::new(), stage).await
        }
    }

    /// 指定したシークレット取得元で設定を読み込む（テスト用にも公開）
    pub async fn load_with_source<S: SecretSource>(
        source: S,
        stage: String,
    ) -> Result<Self, AppConfigError> {
        let resolver = SecretResolver::new(source);

        // 必須: 解決できなければ起動失敗
        let anthropic_api_key = resolver.resolve_required(&ANTHROPIC_API_KEY).await?;

        // 任意: 両方揃った場合のみトレーシングを有効化
        let langfuse_public_key = resolver.resolve(&LANGFUSE_PUBLIC_KEY).await?;
        let langfuse_secret_key = resolver.resolve(&LANGFUSE_SECRET_KEY).await?;

        let langfuse = match (langfuse_public_key, langfuse_secret_key) {
            (Some(public_key), Some(secret_key)) => {
                let host = std::env::var("LANGFUSE_HOST")
                    .ok()
                    .filter(|v| !v.is_empty())
                    .unwrap_or_else(|| DEFAULT_LANGFUSE_HOST.to_string());
                Some(LangfuseConfig::new(public_key, secret_key, host))
            }
            (None, None) => None,
            _ => {
                // 片方だけの設定は不完全なのでトレーシング無効として扱う
                warn!("LangFuseキーが片方のみ設定されています、トレーシングを無効化");
                None
            }
        };

        let model = std::env::var("EXTRACTOR_MODEL")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let queue_url = std::env::var("SQS_QUEUE_URL")
            .ok()
            .filter(|v| !v.is_empty());

        info!(
            model = %model,
            stage = %stage,
            queue_configured = queue_url.is_some(),
            langfuse_enabled = langfuse.is_some(),
            "アプリケーション設定読み込み完了"
        );

        Ok(Self {
            model,
            stage,
            queue_url,
            anthropic_api_key,
            langfuse,
        })
    }

    /// 抽出モデルIDを取得
    pub fn model(&self) -> &str {
        &self.model
    }

    /// ステージ名を取得
    pub fn stage(&self) -> &str {
        &self.stage
    }

    /// SQSキューURLを取得
    pub fn queue_url(&self) -> Option<&str> {
        self.queue_url.as_deref()
    }

    /// Anthropic APIキーを取得
    pub fn anthropic_api_key(&self) -> &str {
        &self.anthropic_api_key
    }

    /// LangFuse設定を取得
    pub fn langfuse(&self) -> Option<&LangfuseConfig> {
        self.langfuse.as_ref()
    }
}

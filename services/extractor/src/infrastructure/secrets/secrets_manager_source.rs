// AWS Secrets Managerからシークレットを取得する実装
//
// 参照キーは `<SECRET_PREFIX>/<ステージ名>/<論理名>` の規約で構成し、
// シークレットごとの上書き環境変数が設定されていればそちらを優先する。
// SecretStringはJSONオブジェクト {"key": "<値>"} を想定する。

use aws_sdk_secretsmanager::Client as SecretsManagerClient;
use async_trait::async_trait;
use tracing::{info, warn};

use super::source::{SecretSource, SecretSourceError, SecretSpec};

/// シークレット参照キーの固定プレフィックス
pub const SECRET_PREFIX: &str = "gen-ai-extractor";

/// AWS Secrets Managerを使用したシークレット取得実装
#[derive(Debug, Clone)]
pub struct SecretsManagerSecretSource {
    /// Secrets Managerクライアント
    client: SecretsManagerClient,
    /// 参照キーの構成に使うステージ名
    stage: String,
}

impl SecretsManagerSecretSource {
    /// 新しいSecretsManagerSecretSourceを作成
    pub fn new(client: SecretsManagerClient, stage: impl Into<String>) -> Self {
        Self {
            client,
            stage: stage.into(),
        }
    }

    /// AWS設定からデフォルトのクライアントを作成
    pub async fn from_config(stage: impl Into<String>) -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let client = SecretsManagerClient::new(&config);
        Self::new(client, stage)
    }

    /// シークレットの参照キーを構成する
    ///
    /// 上書き環境変数が設定されていればその値を、
    /// なければ規約に従ったパスを返す。
    fn secret_id(&self, spec: &SecretSpec) -> String {
        match std::env::var(spec.override_var) {
            Ok(id) if !id.is_empty() => id,
            _ => format!("{}/{}/{}", SECRET_PREFIX, self.stage, spec.logical_name),
        }
    }

    /// SecretStringをパースして値を取り出す
    ///
    /// SecretStringはJSONオブジェクト {"key": "<値>"} の形を取る
    fn parse_secret_string(secret_string: &str) -> Result<String, SecretSourceError> {
        let value: serde_json::Value = serde_json::from_str(secret_string).map_err(|e| {
            SecretSourceError::InvalidSecretFormat(format!("JSONパースに失敗: {}", e))
        })?;

        value
            .get("key")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| {
                SecretSourceError::InvalidSecretFormat(
                    "keyフィールドがありません".to_string(),
                )
            })
    }
}

#[async_trait]
impl SecretSource for SecretsManagerSecretSource {
    async fn resolve(&self, spec: &SecretSpec) -> Result<Option<String>, SecretSourceError> {
        let secret_id = self.secret_id(spec);

        info!(
            secret_id = %secret_id,
            logical_name = spec.logical_name,
            "Secrets Managerからシークレットを取得"
        );

        let response = match self
            .client
            .get_secret_value()
            .secret_id(&secret_id)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                let service_err = err.into_service_error();

                // 存在しないシークレットは「未設定」として扱う
                // （必須判定はSecretResolver側で行う）
                if service_err.is_resource_not_found_exception() {
                    warn!(
                        secret_id = %secret_id,
                        "シークレットが存在しません"
                    );
                    return Ok(None);
                }

                warn!(
                    secret_id = %secret_id,
                    error = %service_err,
                    "GetSecretValueエラー"
                );
                return Err(SecretSourceError::AwsSdkError(service_err.to_string()));
            }
        };

        let secret_string = response.secret_string().ok_or_else(|| {
            SecretSourceError::InvalidSecretFormat(
                "SecretStringがありません".to_string(),
            )
        })?;

        Self::parse_secret_string(secret_string).map(Some)
    }
}

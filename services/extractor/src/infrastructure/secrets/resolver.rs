/// シークレットリゾルバー
///
/// SecretSourceの結果に必須/任意のポリシーを適用する。
/// 必須シークレットが解決できない場合は設定エラーとして起動を止め、
/// 任意シークレットの欠落は「機能無効」として扱う。
use thiserror::Error;
use tracing::{info, warn};

use super::source::{SecretSource, SecretSourceError, SecretSpec};

/// シークレット解決のエラー型
#[derive(Debug, Error)]
pub enum SecretResolverError {
    /// 必須シークレットが解決できない
    #[error("必須シークレットを解決できませんでした: {0}")]
    MissingRequiredSecret(String),

    /// 取得元のエラー
    #[error(transparent)]
    Source(#[from] SecretSourceError),
}

/// シークレットリゾルバー
///
/// 取得元（環境変数 / Secrets Manager）は構築時に確定し、
/// 解決処理自体は取得元に依存しない。
pub struct SecretResolver<S: SecretSource> {
    /// シークレット取得元
    source: S,
}

impl<S: SecretSource> SecretResolver<S> {
    /// 新しいSecretResolverを作成
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// シークレットを解決する
    ///
    /// # 戻り値
    /// * `Ok(Some(value))` - 解決成功
    /// * `Ok(None)` - 任意シークレットが未設定（機能無効）
    /// * `Err(SecretResolverError)` - 必須シークレットの欠落または取得エラー
    pub async fn resolve(&self, spec: &SecretSpec) -> Result<Option<String>, SecretResolverError> {
        let value = self.source.resolve(spec).await?;

        match value {
            Some(value) => {
                info!(
                    logical_name = spec.logical_name,
                    "シークレット解決成功"
                );
                Ok(Some(value))
            }
            None if spec.required => Err(SecretResolverError::MissingRequiredSecret(
                spec.logical_name.to_string(),
            )),
            None => {
                warn!(
                    logical_name = spec.logical_name,
                    "任意シークレットが未設定のため機能を無効化"
                );
                Ok(None)
            }
        }
    }

    /// 必須シークレットを解決する
    ///
    /// `required = false`のSpecに対して呼び出した場合も、
    /// 値が存在しなければエラーを返す。
    pub async fn resolve_required(&self, spec: &SecretSpec) -> Result<String, SecretResolverError> {
        self.resolve(spec).await?.ok_or_else(|| {
            SecretResolverError::MissingRequiredSecret(spec.logical_name.to_string())
        })
    }
}

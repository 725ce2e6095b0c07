/// シークレット取得元の抽象化
///
/// シークレットごとの定義（SecretSpec）と、値の取得先を切り替える
/// SecretSourceトレイトを提供する。取得先の選択は構築時に行い、
/// ビジネスロジック内では分岐しない。
use async_trait::async_trait;
use thiserror::Error;

/// シークレット取得のエラー型
#[derive(Debug, Error)]
pub enum SecretSourceError {
    /// AWS SDK エラー
    #[error("AWS Secrets Manager APIエラー: {0}")]
    AwsSdkError(String),
    /// シークレット値のフォーマットが不正
    #[error("シークレット値のフォーマットが不正です: {0}")]
    InvalidSecretFormat(String),
}

/// 1つのシークレットの定義
///
/// # フィールド
/// - `logical_name`: シークレットストアのパス構成に使う論理名
/// - `env_var`: ローカル実行時に読み取る環境変数名
/// - `override_var`: リモート参照キーを上書きする環境変数名
/// - `required`: 解決できない場合に起動を失敗させるかどうか
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecretSpec {
    /// シークレットの論理名（例: "anthropic_api_key"）
    pub logical_name: &'static str,
    /// ローカル実行時の環境変数名
    pub env_var: &'static str,
    /// リモート参照キーの上書き用環境変数名
    pub override_var: &'static str,
    /// 必須シークレットかどうか
    pub required: bool,
}

/// シークレット取得元トレイト（テスト用の抽象化を兼ねる）
#[async_trait]
pub trait SecretSource: Send + Sync {
    /// シークレット値を取得する
    ///
    /// # 戻り値
    /// * `Ok(Some(value))` - 値が存在する
    /// * `Ok(None)` - 値が存在しない（必須判定は呼び出し側で行う）
    /// * `Err(SecretSourceError)` - 取得処理自体の失敗
    async fn resolve(&self, spec: &SecretSpec) -> Result<Option<String>, SecretSourceError>;
}

/// プロセス環境変数からシークレットを読み取る実装（ローカル実行用）
///
/// リモートのシークレットストアには一切アクセスしない。
/// .envファイルの読み込みはエントリポイント側でdotenvyにより行う。
#[derive(Debug, Clone, Default)]
pub struct EnvSecretSource;

impl EnvSecretSource {
    /// 新しいEnvSecretSourceを作成
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SecretSource for EnvSecretSource {
    async fn resolve(&self, spec: &SecretSpec) -> Result<Option<String>, SecretSourceError> {
        // 空文字列は未設定として扱う
        match std::env::var(spec.env_var) {
            Ok(value) if !value.is_empty() => Ok(Some(value)),
            _ => Ok(None),
        }
    }
}

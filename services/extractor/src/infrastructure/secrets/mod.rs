// シークレット解決モジュール
//
// 実行環境（ローカル / クラウド）に応じてシークレット値の取得元を
// 切り替えるストラテジー実装を提供する。
// - EnvSecretSource: プロセス環境変数（ローカル実行、.env読み込み後）
// - SecretsManagerSecretSource: AWS Secrets Manager（Lambda実行）
// - SecretResolver: 必須/任意の扱いを一元化するラッパー

mod resolver;
mod secrets_manager_source;
mod source;

pub use resolver::{SecretResolver, SecretResolverError};
pub use secrets_manager_source::{SecretsManagerSecretSource, SECRET_PREFIX};
pub use source::{EnvSecretSource, SecretSource, SecretSourceError, SecretSpec};

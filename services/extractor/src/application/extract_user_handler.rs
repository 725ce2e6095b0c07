// 同期抽出ユースケース
//
// リクエストボディの検証と抽出クライアントの呼び出しを行う。
// HTTPステータスへの変換はエントリポイント側の責務とし、
// ここではエラーの種別（クライアント起因/上流起因）だけを区別する。

use thiserror::Error;
use tracing::{info, instrument};

use crate::domain::{ExtractUserRequest, RequestParseError, User};
use crate::infrastructure::{ExtractionError, UserExtractor};

/// 同期抽出のエラー型
#[derive(Debug, Error)]
pub enum ExtractUserError {
    /// リクエストが不正（クライアント起因）
    #[error(transparent)]
    Request(#[from] RequestParseError),

    /// 抽出クライアントのエラー（上流起因）
    #[error(transparent)]
    Upstream(#[from] ExtractionError),
}

/// 同期抽出ハンドラー
pub struct ExtractUserHandler<E: UserExtractor> {
    /// ユーザー抽出クライアント
    extractor: E,
}

impl<E: UserExtractor> ExtractUserHandler<E> {
    /// 新しいExtractUserHandlerを作成
    pub fn new(extractor: E) -> Self {
        Self { extractor }
    }

    /// リクエストボディを検証し、抽出結果を返す
    ///
    /// # 戻り値
    /// * `Ok(Some(User))` - 抽出成功
    /// * `Ok(None)` - テキストに有効なユーザー情報がない
    /// * `Err(ExtractUserError)` - 検証エラーまたは上流エラー
    #[instrument(skip(self, body))]
    pub async fn handle(&self, body: &str) -> Result<Option<User>, ExtractUserError> {
        // 検証が通らないリクエストは抽出クライアントに到達させない
        let request = ExtractUserRequest::parse(body)?;

        let result = self.extractor.extract_user(&request.text).await?;

        info!(user_found = result.is_some(), "同期抽出完了");

        Ok(result)
    }
}

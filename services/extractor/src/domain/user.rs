/// テキストから抽出されたユーザー情報
use serde::{Deserialize, Serialize};

/// 抽出結果のユーザーレコード
///
/// LLMのツール呼び出し入力およびHTTPレスポンスボディと同じ形を持つ。
/// emailは抽出できた場合のみ設定される。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// ユーザーの名前
    pub name: String,
    /// ユーザーの年齢
    pub age: u32,
    /// ユーザーのメールアドレス（任意）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

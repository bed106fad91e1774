//! # ドメイン層エラー定義

use thiserror::Error;

/// ドメイン層で発生するエラー
///
/// 値オブジェクトの生成時に入力がルールを満たさない場合に返す。
/// サービス層で 400 Validation Error に変換される。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    /// バリデーションエラー
    #[error("バリデーションエラー: {0}")]
    Validation(String),
}

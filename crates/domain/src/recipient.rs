//! # 送信先
//!
//! 認証コードの送信先となるメールアドレス。チャレンジとトークンの
//! 持ち主を識別するキーにもなる。

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::DomainError;

/// メールアドレスの最大長（RFC 5321 のパス長制限）
const MAX_LENGTH: usize = 254;

/// 正規化済みのメールアドレス
///
/// 前後の空白を除去し、小文字に揃える。同じアドレスの大文字小文字違いで
/// 別のチャレンジが作られることを防ぐ。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(transparent)]
#[display("{_0}")]
pub struct Recipient(String);

impl Recipient {
    /// 入力文字列を検証・正規化して送信先を作成する
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let normalized = raw.trim().to_lowercase();

        if normalized.is_empty() {
            return Err(DomainError::Validation(
                "メールアドレスは必須です".to_string(),
            ));
        }
        if normalized.len() > MAX_LENGTH {
            return Err(DomainError::Validation(format!(
                "メールアドレスは {MAX_LENGTH} 文字以内で入力してください"
            )));
        }

        let Some((local, domain)) = normalized.split_once('@') else {
            return Err(DomainError::Validation(
                "メールアドレスの形式が不正です".to_string(),
            ));
        };
        if local.is_empty()
            || domain.is_empty()
            || domain.contains('@')
            || normalized.chars().any(char::is_whitespace)
        {
            return Err(DomainError::Validation(
                "メールアドレスの形式が不正です".to_string(),
            ));
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

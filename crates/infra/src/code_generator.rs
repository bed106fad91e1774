//! # 認証コード生成

use authcode_domain::auth_code::AuthCode;
use rand::Rng;

use crate::InfraError;

/// 認証コードを生成するトレイト
pub trait CodeGenerator: Send + Sync {
    /// `length` 桁の認証コードを生成する
    fn generate(&self, length: usize) -> Result<AuthCode, InfraError>;
}

/// スレッドローカルの暗号論的乱数（`rand::rng()`）で各桁を独立に選ぶ実装
///
/// 先頭桁も 0 を取り得る（`"004211"` など）。
#[derive(Debug, Clone, Default)]
pub struct RandomCodeGenerator;

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self, length: usize) -> Result<AuthCode, InfraError> {
        let mut rng = rand::rng();
        let digits: String = (0..length)
            .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
            .collect();

        AuthCode::parse(&digits, length).map_err(|e| InfraError::unexpected(e.to_string()))
    }
}

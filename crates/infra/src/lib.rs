//! # AuthCode インフラ層
//!
//! 外部システムとの接続を担当し、ドメイン層が必要とする永続化・送信・
//! 乱数生成をトレイトの背後に隠す。
//!
//! ## 責務
//!
//! - **Redis 接続**: チャレンジとトークンの保存（TTL 付き）
//! - **コード生成**: 乱数による認証コードの生成
//! - **コード送信**: 送信先への認証コードの通知
//! - **Readiness**: 依存先の疎通確認
//!
//! ## モジュール構成
//!
//! - [`auth_code_store`] - 認証コードチャレンジの保存
//! - [`token_store`] - アクセストークンの保存
//! - [`code_generator`] - 認証コードの生成
//! - [`notifier`] - 認証コードの送信
//! - [`readiness`] - 疎通確認
//! - [`redis`] - Redis 接続管理
//! - [`error`] - インフラ層エラー
//! - `mock` - テスト用インメモリ実装（`test-utils` feature）

pub mod auth_code_store;
pub mod code_generator;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod notifier;
pub mod readiness;
pub mod redis;
pub mod token_store;

pub use auth_code_store::{AuthCodeStore, RedisAuthCodeStore};
pub use code_generator::{CodeGenerator, RandomCodeGenerator};
pub use error::{InfraError, InfraErrorKind};
pub use notifier::{CodeNotifier, LogCodeNotifier};
pub use readiness::{ReadinessProbe, RedisReadinessProbe};
pub use token_store::{RedisTokenStore, TokenStore};

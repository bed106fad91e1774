//! # AuthCode ドメイン層
//!
//! ワンタイム認証コードとアクセストークンのドメインモデルを定義する。
//! I/O を一切持たず、時刻は [`clock::Clock`] 経由で受け取る。
//!
//! ## 依存関係の方向
//!
//! ```text
//! service → infra → domain
//!      ↘            ↗
//!        ──────────
//! ```
//!
//! ## モジュール構成
//!
//! - [`recipient`] - 認証コードの送信先（メールアドレス）
//! - [`auth_code`] - 認証コードとチャレンジ
//! - [`auth_token`] - アクセストークンとクレーム
//! - [`clock`] - 時刻の抽象化
//! - [`error`] - ドメインエラー

pub mod auth_code;
pub mod auth_token;
pub mod clock;
pub mod error;
pub mod recipient;

pub use error::DomainError;

//! # Auth Code Service
//!
//! メールで送るワンタイム認証コードを発行・検証し、
//! 検証に成功した送信先にアクセストークンを発行する。
//!
//! ## モジュール構成
//!
//! - [`config`]: 環境変数からの設定読み込み
//! - [`deps`]: 依存の束と、その解決
//! - [`auth`]: ビジネス関数（発行・検証・照会・失効）
//! - [`handler`]: ビジネス関数の HTTP ハンドラ化とヘルスチェック
//! - [`app`]: ルーター構築
//! - [`error`]: エラー定義と HTTP レスポンスへの変換

pub mod app;
pub mod auth;
pub mod config;
pub mod deps;
pub mod error;
pub mod handler;

#[cfg(test)]
mod test_utils;

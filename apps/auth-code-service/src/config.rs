//! # Auth Code Service 設定
//!
//! 環境変数からサーバーと認証コードの設定を読み込む。
//!
//! | 変数名 | 必須 | デフォルト |
//! |--------|------|-----------|
//! | `AUTH_CODE_HOST` | No | `0.0.0.0` |
//! | `AUTH_CODE_PORT` | **Yes** | - |
//! | `REDIS_URL` | **Yes** | - |
//! | `AUTH_CODE_LENGTH` | No | `6`（4〜9） |
//! | `AUTH_CODE_TTL_SECONDS` | No | `300` |
//! | `AUTH_CODE_MAX_ATTEMPTS` | No | `5` |
//! | `AUTH_CODE_RESEND_INTERVAL_SECONDS` | No | `30` |
//! | `AUTH_TOKEN_TTL_SECONDS` | No | `3600` |

use std::{env, str::FromStr};

use authcode_domain::auth_code::CODE_LENGTH_RANGE;
use chrono::TimeDelta;
use thiserror::Error;

/// 設定読み込みエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} が設定されていません")]
    Missing(&'static str),

    #[error("{name} の値が不正です（{value:?}）: {reason}")]
    Invalid {
        name:   &'static str,
        value:  String,
        reason: String,
    },
}

/// サーバー全体の設定
#[derive(Debug, Clone)]
pub struct AuthCodeConfig {
    /// バインドアドレス
    pub host:      String,
    /// ポート番号
    pub port:      u16,
    /// Redis 接続 URL
    pub redis_url: String,
    /// 認証コードとトークンの設定
    pub settings:  AuthCodeSettings,
}

/// 認証コードとトークンの設定
///
/// ビジネス関数が参照するのはこの構造体のみ。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCodeSettings {
    /// 認証コードの桁数
    pub code_length:             usize,
    /// 認証コードの有効期限（秒）
    pub code_ttl_seconds:        u32,
    /// 1 チャレンジあたりの最大試行回数
    pub max_attempts:            u32,
    /// 同じ送信先への再発行を禁止する間隔（秒）
    pub resend_interval_seconds: u32,
    /// アクセストークンの有効期限（秒）
    pub token_ttl_seconds:       u32,
}

impl Default for AuthCodeSettings {
    fn default() -> Self {
        Self {
            code_length:             6,
            code_ttl_seconds:        300,
            max_attempts:            5,
            resend_interval_seconds: 30,
            token_ttl_seconds:       3600,
        }
    }
}

impl AuthCodeSettings {
    pub fn code_ttl(&self) -> TimeDelta {
        TimeDelta::seconds(i64::from(self.code_ttl_seconds))
    }

    pub fn resend_interval(&self) -> TimeDelta {
        TimeDelta::seconds(i64::from(self.resend_interval_seconds))
    }

    pub fn token_ttl(&self) -> TimeDelta {
        TimeDelta::seconds(i64::from(self.token_ttl_seconds))
    }

    /// キー名から値を引く関数で設定を組み立てる
    ///
    /// 未設定のキーはデフォルト値を使う。
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let code_length = parse_or(&lookup, "AUTH_CODE_LENGTH", defaults.code_length)?;
        if !CODE_LENGTH_RANGE.contains(&code_length) {
            return Err(ConfigError::Invalid {
                name:   "AUTH_CODE_LENGTH",
                value:  code_length.to_string(),
                reason: format!(
                    "{}〜{} の範囲で指定してください",
                    CODE_LENGTH_RANGE.start(),
                    CODE_LENGTH_RANGE.end()
                ),
            });
        }

        Ok(Self {
            code_length,
            code_ttl_seconds: positive(
                "AUTH_CODE_TTL_SECONDS",
                parse_or(&lookup, "AUTH_CODE_TTL_SECONDS", defaults.code_ttl_seconds)?,
            )?,
            max_attempts: positive(
                "AUTH_CODE_MAX_ATTEMPTS",
                parse_or(&lookup, "AUTH_CODE_MAX_ATTEMPTS", defaults.max_attempts)?,
            )?,
            resend_interval_seconds: parse_or(
                &lookup,
                "AUTH_CODE_RESEND_INTERVAL_SECONDS",
                defaults.resend_interval_seconds,
            )?,
            token_ttl_seconds: positive(
                "AUTH_TOKEN_TTL_SECONDS",
                parse_or(&lookup, "AUTH_TOKEN_TTL_SECONDS", defaults.token_ttl_seconds)?,
            )?,
        })
    }
}

impl AuthCodeConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            host:      lookup("AUTH_CODE_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port:      parse_required(&lookup, "AUTH_CODE_PORT")?,
            redis_url: lookup("REDIS_URL").ok_or(ConfigError::Missing("REDIS_URL"))?,
            settings:  AuthCodeSettings::from_lookup(&lookup)?,
        })
    }
}

fn parse_required<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let value = lookup(name).ok_or(ConfigError::Missing(name))?;
    parse_value(name, value)
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(value) => parse_value(name, value),
        None => Ok(default),
    }
}

fn parse_value<T>(name: &'static str, value: String) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        name,
        reason: e.to_string(),
        value,
    })
}

fn positive(name: &'static str, value: u32) -> Result<u32, ConfigError> {
    if value == 0 {
        return Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
            reason: "1 以上を指定してください".to_string(),
        });
    }
    Ok(value)
}

//! # ハンドラ
//!
//! ビジネス関数を [`BasicHandler`] で HTTP ハンドラ化したものと、
//! ヘルスチェックを提供する。
//!
//! | パス | ハンドラ | ビジネス関数 |
//! |------|---------|-------------|
//! | `POST /auth/codes` | [`request_auth_code`] | [`crate::auth::request_auth_code`] |
//! | `POST /auth/verify-code` | [`verify_auth_code`] | [`crate::auth::get_auth_token`] |
//! | `POST /auth/tokens/introspect` | [`introspect_auth_token`] | [`crate::auth::introspect_auth_token`] |
//! | `POST /auth/tokens/revoke` | [`revoke_auth_token`] | [`crate::auth::revoke_auth_token`] |

pub mod auth_token;
pub mod basic;
pub mod health;
pub mod request_auth_code;
pub mod verify_auth_code;

pub use auth_token::{introspect_auth_token, revoke_auth_token};
pub use basic::BasicHandler;
pub use health::{ReadinessState, health_check, readiness_check};
pub use request_auth_code::request_auth_code;
pub use verify_auth_code::{VerifyAuthCodeHandler, verify_auth_code};

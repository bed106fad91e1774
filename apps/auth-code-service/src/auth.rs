//! # 認証コードのビジネス関数
//!
//! すべて `async fn(Arc<AuthDeps>, Req) -> Result<Res, AuthCodeError>` の形を取り、
//! [`BasicHandler`](crate::handler::BasicHandler) に渡してハンドラ化する。
//!
//! - [`codes`]: 認証コードの発行
//! - [`tokens`]: 認証コードの検証とアクセストークンの発行・照会・失効

pub mod codes;
pub mod tokens;

pub use codes::{RequestAuthCodeRequest, RequestAuthCodeResponse, request_auth_code};
pub use tokens::{
    AuthTokenResponse,
    IntrospectResponse,
    RevokeResponse,
    TokenRequest,
    VerifyAuthCodeRequest,
    get_auth_token,
    introspect_auth_token,
    revoke_auth_token,
};

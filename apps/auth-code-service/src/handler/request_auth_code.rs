//! 認証コード発行ハンドラ

use std::sync::Arc;

use super::BasicHandler;
use crate::{
    auth::{self, RequestAuthCodeRequest, RequestAuthCodeResponse},
    deps::AuthDeps,
    error::AuthCodeError,
};

pub type RequestAuthCodeHandler =
    BasicHandler<AuthDeps, RequestAuthCodeRequest, RequestAuthCodeResponse, AuthCodeError>;

pub fn request_auth_code(deps: Arc<AuthDeps>) -> RequestAuthCodeHandler {
    BasicHandler::new("request_auth_code", deps, auth::request_auth_code)
}

//! アクセストークンの照会・失効ハンドラ

use std::sync::Arc;

use super::BasicHandler;
use crate::{
    auth::{self, IntrospectResponse, RevokeResponse, TokenRequest},
    deps::AuthDeps,
    error::AuthCodeError,
};

pub type IntrospectAuthTokenHandler =
    BasicHandler<AuthDeps, TokenRequest, IntrospectResponse, AuthCodeError>;

pub type RevokeAuthTokenHandler = BasicHandler<AuthDeps, TokenRequest, RevokeResponse, AuthCodeError>;

pub fn introspect_auth_token(deps: Arc<AuthDeps>) -> IntrospectAuthTokenHandler {
    BasicHandler::new("introspect_auth_token", deps, auth::introspect_auth_token)
}

pub fn revoke_auth_token(deps: Arc<AuthDeps>) -> RevokeAuthTokenHandler {
    BasicHandler::new("revoke_auth_token", deps, auth::revoke_auth_token)
}

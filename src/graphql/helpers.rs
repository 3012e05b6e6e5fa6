use async_graphql::{Context, ErrorExtensions};

use crate::{
    app_state::AppState,
    auth::{extract_claims_from_context, Claims},
    errors::AppError,
};

/// Converts an `AppError` into a GraphQL error carrying its `code` extension.
pub fn graphql_error(err: AppError) -> async_graphql::Error {
    err.extend()
}

pub fn app_state<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a AppState> {
    ctx.data::<AppState>()
}

pub fn require_claims(ctx: &Context<'_>) -> async_graphql::Result<Claims> {
    extract_claims_from_context(ctx).map_err(graphql_error)
}

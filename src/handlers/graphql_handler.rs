use actix_web::{get, post, web, HttpRequest, HttpResponse};
use async_graphql::http::GraphiQLSource;
use async_graphql_actix_web::{GraphQLRequest, GraphQLResponse};

use crate::{
    auth::{middleware::bearer_token, JwtService},
    errors::AppError,
    graphql::Schema,
};

/// Authentication is optional here. A valid bearer token makes `Claims`
/// available to resolvers; an invalid one rejects the request.
#[post("/graphql")]
pub async fn graphql(
    schema: web::Data<Schema>,
    jwt_service: web::Data<JwtService>,
    http_request: HttpRequest,
    request: GraphQLRequest,
) -> Result<GraphQLResponse, AppError> {
    let mut request = request.into_inner();

    if let Some(token) = bearer_token(&http_request)? {
        let claims = jwt_service.validate_token(token)?;
        request = request.data(claims);
    }

    Ok(schema.execute(request).await.into())
}

#[get("/graphiql")]
pub async fn graphiql() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(GraphiQLSource::build().endpoint("/graphql").finish())
}

use async_graphql::{Context, Object, ID};
use chrono::Utc;
use validator::Validate;

use crate::{
    graphql::helpers::{app_state, graphql_error, require_claims},
    models::dto::{
        request::{CompleteModuleRequest, LoginRequest, RecordAnswerRequest, RegisterRequest},
        response::{
            AttemptDto, AttemptSummaryDto, AuthResponse, CompletionDto, FinalizeResponse,
            ModuleAccessDto, UserDto,
        },
    },
};

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn register(
        &self,
        ctx: &Context<'_>,
        input: RegisterRequest,
    ) -> async_graphql::Result<UserDto> {
        let state = app_state(ctx)?;

        state
            .user_service
            .register(input, Utc::now())
            .await
            .map_err(graphql_error)
    }

    async fn login(&self, ctx: &Context<'_>, input: LoginRequest) -> async_graphql::Result<AuthResponse> {
        let state = app_state(ctx)?;

        state
            .user_service
            .login(input, Utc::now())
            .await
            .map_err(graphql_error)
    }

    async fn access_module(
        &self,
        ctx: &Context<'_>,
        module_id: ID,
    ) -> async_graphql::Result<ModuleAccessDto> {
        let state = app_state(ctx)?;
        let claims = require_claims(ctx)?;

        let (module, completion) = state
            .progression_service
            .access_module(claims.user_id(), &module_id, Utc::now())
            .await
            .map_err(graphql_error)?;
        Ok(ModuleAccessDto {
            module: module.into(),
            completion: completion.into(),
        })
    }

    async fn complete_module(
        &self,
        ctx: &Context<'_>,
        module_id: ID,
        input: CompleteModuleRequest,
    ) -> async_graphql::Result<CompletionDto> {
        let state = app_state(ctx)?;
        let claims = require_claims(ctx)?;
        input.validate().map_err(|e| graphql_error(e.into()))?;

        let module = state
            .progression_service
            .get_published_module(&module_id)
            .await
            .map_err(graphql_error)?;
        let evidence = input.into_evidence(module.content_type);
        let completion = state
            .progression_service
            .mark_completed(claims.user_id(), &module.id, evidence, Utc::now())
            .await
            .map_err(graphql_error)?;
        Ok(completion.into())
    }

    async fn start_assessment(
        &self,
        ctx: &Context<'_>,
        assessment_id: ID,
    ) -> async_graphql::Result<AttemptDto> {
        let state = app_state(ctx)?;
        let claims = require_claims(ctx)?;

        let attempt = state
            .assessment_service
            .begin_attempt(claims.user_id(), &assessment_id, Utc::now())
            .await
            .map_err(graphql_error)?;
        let questions = state
            .assessment_service
            .presented_questions(&attempt)
            .await
            .map_err(graphql_error)?;
        Ok(AttemptDto::new(&attempt, questions))
    }

    async fn record_answer(
        &self,
        ctx: &Context<'_>,
        attempt_id: ID,
        input: RecordAnswerRequest,
    ) -> async_graphql::Result<AttemptSummaryDto> {
        let state = app_state(ctx)?;
        let claims = require_claims(ctx)?;
        input.validate().map_err(|e| graphql_error(e.into()))?;

        let attempt = state
            .assessment_service
            .record_answer(
                claims.user_id(),
                &attempt_id,
                &input.question_id,
                input.selected_option,
                Utc::now(),
            )
            .await
            .map_err(graphql_error)?;
        Ok((&attempt).into())
    }

    /// Scores the attempt and applies the result to the caller's certification.
    async fn finalize_attempt(
        &self,
        ctx: &Context<'_>,
        attempt_id: ID,
    ) -> async_graphql::Result<FinalizeResponse> {
        let state = app_state(ctx)?;
        let claims = require_claims(ctx)?;

        let (attempt, newly_certified) = state
            .finalize_attempt(claims.user_id(), &attempt_id, Utc::now())
            .await
            .map_err(graphql_error)?;

        Ok(FinalizeResponse {
            attempt: (&attempt).into(),
            newly_certified,
        })
    }
}

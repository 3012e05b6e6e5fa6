use async_graphql::{Context, Object, ID};

use crate::{
    graphql::helpers::{app_state, graphql_error, require_claims},
    models::dto::response::{
        AssessmentSummaryDto, AttemptDto, AttemptResultDto, CertificationDto, CourseProgressDto,
        OfficeScheduleDto, TrainingOverviewDto, UserDto,
    },
};

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn me(&self, ctx: &Context<'_>) -> async_graphql::Result<UserDto> {
        let state = app_state(ctx)?;
        let claims = require_claims(ctx)?;

        state
            .user_service
            .get_user(claims.user_id())
            .await
            .map_err(graphql_error)
    }

    async fn certification(&self, ctx: &Context<'_>) -> async_graphql::Result<CertificationDto> {
        let state = app_state(ctx)?;
        let claims = require_claims(ctx)?;

        let certification = state
            .certification_service
            .status(claims.user_id())
            .await
            .map_err(graphql_error)?;
        Ok(certification.into())
    }

    async fn training(&self, ctx: &Context<'_>) -> async_graphql::Result<TrainingOverviewDto> {
        let state = app_state(ctx)?;
        let claims = require_claims(ctx)?;

        let overview = state
            .progression_service
            .overview(claims.user_id())
            .await
            .map_err(graphql_error)?;
        Ok(overview.into())
    }

    async fn course(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<CourseProgressDto> {
        let state = app_state(ctx)?;
        let claims = require_claims(ctx)?;

        let progress = state
            .progression_service
            .course_progress(claims.user_id(), &id)
            .await
            .map_err(graphql_error)?;
        Ok(progress.into())
    }

    async fn assessments(
        &self,
        ctx: &Context<'_>,
    ) -> async_graphql::Result<Vec<AssessmentSummaryDto>> {
        let state = app_state(ctx)?;
        let claims = require_claims(ctx)?;

        let summaries = state
            .assessment_service
            .list_for_user(claims.user_id())
            .await
            .map_err(graphql_error)?;
        Ok(summaries.into_iter().map(Into::into).collect())
    }

    async fn attempt(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<AttemptDto> {
        let state = app_state(ctx)?;
        let claims = require_claims(ctx)?;

        let attempt = state
            .assessment_service
            .get_attempt(claims.user_id(), &id)
            .await
            .map_err(graphql_error)?;
        let questions = state
            .assessment_service
            .presented_questions(&attempt)
            .await
            .map_err(graphql_error)?;
        Ok(AttemptDto::new(&attempt, questions))
    }

    async fn attempt_result(
        &self,
        ctx: &Context<'_>,
        id: ID,
    ) -> async_graphql::Result<AttemptResultDto> {
        let state = app_state(ctx)?;
        let claims = require_claims(ctx)?;

        let review = state
            .assessment_service
            .review(claims.user_id(), &id)
            .await
            .map_err(graphql_error)?;
        Ok(review.into())
    }

    /// Requires certification.
    async fn office_schedules(
        &self,
        ctx: &Context<'_>,
    ) -> async_graphql::Result<Vec<OfficeScheduleDto>> {
        let state = app_state(ctx)?;
        let claims = require_claims(ctx)?;

        let schedules = state
            .schedule_service
            .list_schedules(claims.user_id())
            .await
            .map_err(graphql_error)?;
        Ok(schedules.into_iter().map(Into::into).collect())
    }

    /// Requires certification.
    async fn office(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<OfficeScheduleDto> {
        let state = app_state(ctx)?;
        let claims = require_claims(ctx)?;

        let schedule = state
            .schedule_service
            .office_schedule(claims.user_id(), &id)
            .await
            .map_err(graphql_error)?;
        Ok(schedule.into())
    }
}

pub mod admin_handler;
pub mod assessment_handler;
pub mod auth_handler;
pub mod graphql_handler;
pub mod health_handler;
pub mod schedule_handler;
pub mod training_handler;

use actix_web::web;

use crate::auth::AuthMiddleware;

pub use health_handler::{health_check, health_check_live, health_check_ready};

/// Mounts every route. `/api/auth` is public, the rest of `/api` needs a
/// bearer token.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health_check)
        .service(health_check_live)
        .service(health_check_ready)
        .service(graphql_handler::graphql)
        .service(graphql_handler::graphiql)
        .service(
            web::scope("/api/auth")
                .service(auth_handler::register)
                .service(auth_handler::verify_email)
                .service(auth_handler::resend_verification)
                .service(auth_handler::login)
                .service(auth_handler::forgot_password)
                .service(auth_handler::reset_password),
        )
        .service(
            web::scope("/api")
                .wrap(AuthMiddleware)
                .service(auth_handler::me)
                .service(training_handler::training_overview)
                .service(training_handler::course_progress)
                .service(training_handler::access_module)
                .service(training_handler::complete_module)
                .service(assessment_handler::list_assessments)
                .service(assessment_handler::start_attempt)
                .service(assessment_handler::get_attempt)
                .service(assessment_handler::record_answer)
                .service(assessment_handler::finalize_attempt)
                .service(assessment_handler::attempt_result)
                .service(schedule_handler::certification_status)
                .service(schedule_handler::list_schedules)
                .service(schedule_handler::office_schedule)
                .service(admin_handler::create_course)
                .service(admin_handler::create_module)
                .service(admin_handler::reorder_modules)
                .service(admin_handler::publish_module)
                .service(admin_handler::create_assessment)
                .service(admin_handler::list_questions)
                .service(admin_handler::create_question)
                .service(admin_handler::deactivate_question)
                .service(admin_handler::create_office),
        );
}

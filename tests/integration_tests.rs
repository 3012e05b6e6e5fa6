mod common;

use actix_web::{
    http::{header::AUTHORIZATION, StatusCode},
    test, web, App,
};
use serde_json::{json, Value};

use common::{TestEnv, PASSWORD};
use onboard_server::{
    graphql::create_schema,
    handlers,
    middleware::{RequestIdMiddleware, REQUEST_ID_HEADER},
    models::domain::{AssessmentConfig, UserRole},
    repositories::AttemptRepository,
};

macro_rules! init_app {
    ($env:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($env.state.clone()))
                .app_data(web::Data::new(create_schema($env.state.clone())))
                .app_data(web::Data::from($env.state.jwt_service.clone()))
                .wrap(RequestIdMiddleware)
                .configure(handlers::configure),
        )
        .await
    };
}

fn bearer(token: &str) -> (actix_web::http::header::HeaderName, String) {
    (AUTHORIZATION, format!("Bearer {}", token))
}

#[actix_web::test]
async fn health_probes_respond_without_a_database() {
    let env = TestEnv::new();
    let app = init_app!(env);

    for uri in ["/health", "/health/live", "/health/ready"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK, "{}", uri);
        assert!(resp.headers().contains_key(REQUEST_ID_HEADER));
    }
}

#[actix_web::test]
async fn protected_routes_need_a_token() {
    let env = TestEnv::new();
    let app = init_app!(env);

    let req = test::TestRequest::get().uri("/api/training").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["kind"], "UNAUTHORIZED");
    assert_eq!(body["code"], 401);
}

#[actix_web::test]
async fn register_login_and_fetch_profile() {
    let env = TestEnv::new();
    let app = init_app!(env);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "first_name": "Grace",
            "last_name": "Hopper",
            "email": "grace@example.com",
            "phone_number": "+15555550199",
            "city": "Arlington",
            "state_region": "VA",
            "date_of_birth": "1990-12-09",
            "password": PASSWORD,
            "password_confirm": PASSWORD
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "grace@example.com", "password": PASSWORD }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let token = body["token"].as_str().unwrap().to_string();
    assert_eq!(body["user"]["is_certified"], false);

    let req = test::TestRequest::get()
        .uri("/api/me")
        .insert_header(bearer(&token))
        .to_request();
    let me: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(me["email"], "grace@example.com");
}

#[actix_web::test]
async fn wrong_password_is_unauthorized() {
    let env = TestEnv::new();
    let user = env.seed_user("wrong@example.com", UserRole::User).await;
    let app = init_app!(env);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": user.email, "password": "Not-The-Passw0rd" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn locked_module_is_forbidden_over_http() {
    let env = TestEnv::new();
    let user = env.seed_user("locked@example.com", UserRole::User).await;
    let (_, modules) = env.seed_course(2).await;
    let token = env.token_for(&user);
    let app = init_app!(env);

    let req = test::TestRequest::get()
        .uri(&format!("/api/training/modules/{}", modules[1].id))
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["kind"], "LOCKED_MODULE");

    let req = test::TestRequest::post()
        .uri(&format!("/api/training/modules/{}/complete", modules[0].id))
        .insert_header(bearer(&token))
        .set_json(json!({ "watch_percentage": 100, "time_spent_minutes": 8 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&format!("/api/training/modules/{}", modules[1].id))
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn exam_over_http_unlocks_the_schedule() {
    let env = TestEnv::new();
    let user = env.seed_user("exam@example.com", UserRole::User).await;
    let assessment = env
        .seed_assessment(
            AssessmentConfig {
                question_count: 20,
                ..AssessmentConfig::default()
            },
            20,
        )
        .await;
    env.seed_office("Downtown", "DT").await;
    let token = env.token_for(&user);
    let app = init_app!(env);

    let req = test::TestRequest::get()
        .uri("/api/schedule")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["kind"], "NOT_CERTIFIED");

    let req = test::TestRequest::post()
        .uri(&format!("/api/assessments/{}/attempts", assessment.id))
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let attempt_id = body["attempt"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["questions"].as_array().unwrap().len(), 20);
    assert!(body["questions"][0].get("correct_option").is_none());

    let stored = env.attempts.find_by_id(&attempt_id).await.unwrap().unwrap();
    for (question_id, selected) in TestEnv::answers(&stored, 18) {
        let req = test::TestRequest::put()
            .uri(&format!("/api/attempts/{}/answers", attempt_id))
            .insert_header(bearer(&token))
            .set_json(json!({ "question_id": question_id, "selected_option": selected }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let req = test::TestRequest::post()
        .uri(&format!("/api/attempts/{}/finalize", attempt_id))
        .insert_header(bearer(&token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["attempt"]["score_percentage"], 90);
    assert_eq!(body["newly_certified"], true);

    let req = test::TestRequest::post()
        .uri(&format!("/api/attempts/{}/finalize", attempt_id))
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::get()
        .uri("/api/schedule")
        .insert_header(bearer(&token))
        .to_request();
    let schedules: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(schedules.as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn admin_routes_reject_learners() {
    let env = TestEnv::new();
    let learner = env.seed_user("learner@example.com", UserRole::User).await;
    let admin = env.seed_user("admin@example.com", UserRole::Admin).await;
    let learner_token = env.token_for(&learner);
    let admin_token = env.token_for(&admin);
    let app = init_app!(env);

    let course = json!({
        "title": "Compliance",
        "description": "Policies everyone must know",
        "difficulty": "Beginner",
        "order": 2
    });

    let req = test::TestRequest::post()
        .uri("/api/admin/courses")
        .insert_header(bearer(&learner_token))
        .set_json(&course)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri("/api/admin/courses")
        .insert_header(bearer(&admin_token))
        .set_json(&course)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
}

#[actix_web::test]
async fn graphql_reports_error_codes() {
    let env = TestEnv::new();
    let user = env.seed_user("graph@example.com", UserRole::User).await;
    let token = env.token_for(&user);
    let app = init_app!(env);

    let req = test::TestRequest::post()
        .uri("/graphql")
        .insert_header(bearer(&token))
        .set_json(json!({ "query": "{ me { email isCertified } certification { isCertified } }" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["me"]["email"], "graph@example.com");
    assert_eq!(body["data"]["certification"]["isCertified"], false);

    let req = test::TestRequest::post()
        .uri("/graphql")
        .insert_header(bearer(&token))
        .set_json(json!({ "query": "{ officeSchedules { week { day } } }" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["errors"][0]["extensions"]["code"], "NOT_CERTIFIED");

    let req = test::TestRequest::post()
        .uri("/graphql")
        .set_json(json!({ "query": "{ me { email } }" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["errors"][0]["extensions"]["code"], "UNAUTHORIZED");
}

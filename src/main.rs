use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};

use levelquiz_server::{
    app_state::AppState, auth::JwtService, config::Config, handlers,
    middleware::RequestIdMiddleware,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env();
    if std::env::var("APP_ENV").as_deref() == Ok("production") {
        config.validate_for_production();
    }

    let jwt_service = JwtService::new(&config.jwt_secret, config.jwt_expiration_hours);
    let host = config.web_server_host.clone();
    let port = config.web_server_port;

    let state = Arc::new(
        AppState::new(config)
            .await
            .expect("failed to initialize application state"),
    );

    log::info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(web::Data::new(jwt_service.clone()))
            .wrap(Logger::default())
            .wrap(RequestIdMiddleware)
            .wrap(Cors::permissive())
            .service(handlers::health_check)
            .service(handlers::health_check_ready)
            .service(handlers::health_check_live)
            // Student attempt flow. Fixed-path routes are registered ahead
            // of their parameterized siblings.
            .service(handlers::available_tests)
            .service(handlers::start_test)
            .service(handlers::answer_question)
            .service(handlers::use_hint)
            .service(handlers::my_results)
            .service(handlers::detailed_result)
            // Admin content management
            .service(handlers::list_admin_tests)
            .service(handlers::create_test)
            .service(handlers::add_questions)
            .service(handlers::list_class_tests)
            .service(handlers::update_test_settings)
            .service(handlers::delete_test)
            .service(handlers::get_test)
            .service(handlers::create_class)
            .service(handlers::list_classes)
            .service(handlers::enroll_student)
            .service(handlers::list_students)
            .service(handlers::delete_class)
            // Admin reporting
            .service(handlers::test_report)
            .service(handlers::student_report)
            .service(handlers::overview_statistics)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}

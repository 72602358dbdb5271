use std::sync::Arc;

use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

use crate::{
    api::{attendance, report},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
    error::AppError,
    service::Services,
};

/// Per-IP limiter allowing `requests_per_min` with an equal burst.
pub fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);

    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("period and burst are non-zero");
    Governor::new(&cfg)
}

/// Extractor failures are rendered with the same envelope as every other error.
fn extractor_configs(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _| AppError::validation(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _| AppError::validation(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _| AppError::validation(err.to_string()).into()),
    );
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config, services: Services) {
    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    extractor_configs(cfg);

    cfg.app_data(web::Data::new(config.clone()))
        .app_data(services.sessions)
        .app_data(services.reports)
        .app_data(services.accounts);

    cfg.service(
        web::scope(&config.api_prefix)
            .service(
                web::scope("/auth")
                    // public, each with its own limiter
                    .service(
                        web::resource("/register")
                            .wrap(register_limiter)
                            .route(web::post().to(handlers::register)),
                    )
                    .service(
                        web::resource("/login")
                            .wrap(login_limiter)
                            .route(web::post().to(handlers::login)),
                    )
                    // bearer protected
                    .service(
                        web::scope("")
                            .wrap(from_fn(auth_middleware))
                            .wrap(protected_limiter.clone())
                            .route("/verify", web::post().to(handlers::verify))
                            .route("/generate-token", web::post().to(handlers::generate_token))
                            .route("/update/{id}", web::post().to(handlers::update_user))
                            .route("/usersdetails", web::get().to(handlers::list_users)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    .wrap(from_fn(auth_middleware)) // authentication
                    .wrap(protected_limiter) // rate limiting
                    .route("/clock-in", web::post().to(attendance::clock_in))
                    .route("/clock-out", web::post().to(attendance::clock_out))
                    .route("/status", web::get().to(attendance::status))
                    .route("/my-attendance", web::get().to(attendance::my_attendance))
                    // admin
                    .route("/all-users", web::get().to(report::all_users))
                    .route("/report", web::get().to(report::report))
                    .route("/update/{id}", web::put().to(report::update_record)),
            ),
    );
}

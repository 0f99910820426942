use crate::{
    api::{attendance, report, student},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond((60_000 / requests_per_min as u64).max(1))
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("period and burst size are non-zero");
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter)
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(web::resource("/profile").route(web::get().to(handlers::profile)))
            .service(
                web::scope("/views")
                    // admin actions on the pending view; registered before /{kind}
                    .service(
                        web::resource("/pending/approve-all")
                            .route(web::put().to(attendance::approve_all)),
                    )
                    .service(
                        web::resource("/pending/decline-all")
                            .route(web::put().to(attendance::decline_all)),
                    )
                    .service(
                        web::resource("/pending/{id}/approve")
                            .route(web::put().to(attendance::approve)),
                    )
                    .service(
                        web::resource("/pending/{id}/decline")
                            .route(web::put().to(attendance::decline)),
                    )
                    // /views/{kind}
                    .service(web::resource("/{kind}").route(web::get().to(attendance::get_view)))
                    .service(
                        web::resource("/{kind}/date").route(web::post().to(attendance::select_date)),
                    )
                    .service(
                        web::resource("/{kind}/filter").route(web::put().to(attendance::set_filter)),
                    ),
            )
            .service(
                web::scope("/report")
                    .service(web::resource("/daily").route(web::get().to(report::download_daily)))
                    .service(web::resource("/email").route(web::post().to(report::email_daily))),
            )
            .service(
                web::resource("/students/{id}/attendance")
                    .route(web::get().to(student::student_attendance)),
            ),
    );
}

use crate::{
    api::{analytics, area, assist, attendance, cleaner, customer, review, task_log},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
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
                web::resource("/register")
                    .wrap(register_limiter.clone())
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/customers")
                    .service(
                        web::resource("")
                            .route(web::post().to(customer::create_customer))
                            .route(web::get().to(customer::list_customers)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(customer::get_customer))
                            .route(web::put().to(customer::update_customer))
                            .route(web::delete().to(customer::delete_customer)),
                    ),
            )
            .service(
                web::scope("/areas")
                    .service(
                        web::resource("")
                            .route(web::post().to(area::create_area))
                            .route(web::get().to(area::list_areas)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(area::update_area))
                            .route(web::delete().to(area::delete_area)),
                    )
                    .service(
                        web::resource("/{id}/tasks")
                            .route(web::post().to(area::create_area_task))
                            .route(web::get().to(area::list_area_tasks)),
                    ),
            )
            .service(
                web::scope("/tasks").service(
                    web::resource("/{id}")
                        .route(web::put().to(area::update_area_task))
                        .route(web::delete().to(area::delete_area_task)),
                ),
            )
            .service(
                web::scope("/cleaners")
                    .service(
                        web::resource("")
                            .route(web::post().to(cleaner::create_cleaner))
                            .route(web::get().to(cleaner::list_cleaners)),
                    )
                    .service(
                        web::resource("/roster")
                            .route(web::get().to(cleaner::get_roster))
                            .route(web::post().to(cleaner::add_to_roster)),
                    )
                    .service(
                        web::resource("/{id}").route(web::put().to(cleaner::update_cleaner)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    .service(
                        web::resource("").route(web::get().to(attendance::list_attendance)),
                    )
                    .service(
                        web::resource("/clock-in").route(web::post().to(attendance::clock_in)),
                    )
                    .service(
                        web::resource("/clock-out").route(web::put().to(attendance::clock_out)),
                    ),
            )
            .service(
                web::scope("/logs")
                    .service(
                        web::resource("/selections")
                            .route(web::post().to(task_log::submit_selection))
                            .route(web::get().to(task_log::my_selections)),
                    )
                    .service(
                        web::resource("/photos").route(web::post().to(task_log::submit_photo)),
                    ),
            )
            .service(
                web::scope("/analytics")
                    .service(web::resource("/summary").route(web::get().to(analytics::summary)))
                    .service(web::resource("/snapshot").route(web::get().to(analytics::snapshot))),
            )
            .service(
                web::scope("/review")
                    .service(
                        web::resource("/photos").route(web::get().to(review::review_photos)),
                    )
                    .service(
                        web::resource("/photos/{id}/feedback")
                            .route(web::post().to(review::create_feedback)),
                    )
                    .service(
                        web::resource("/feedback").route(web::get().to(review::list_feedback)),
                    ),
            )
            .service(
                web::scope("/assist")
                    .service(
                        web::resource("")
                            .route(web::post().to(assist::create_assist))
                            .route(web::get().to(assist::list_assist)),
                    )
                    .service(web::resource("/{id}").route(web::get().to(assist::get_assist)))
                    .service(
                        web::resource("/{id}/events")
                            .route(web::get().to(assist::list_assist_events)),
                    )
                    .service(
                        web::resource("/{id}/accept")
                            .route(web::put().to(assist::accept_assist)),
                    )
                    .service(
                        web::resource("/{id}/resolve")
                            .route(web::put().to(assist::resolve_assist)),
                    )
                    .service(
                        web::resource("/{id}/cancel")
                            .route(web::put().to(assist::cancel_assist)),
                    ),
            ),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)
//
// API REQUEST
//  └─ Authorization: Bearer access_token
//
// ACCESS EXPIRED
//  └─ POST /refresh with refresh_token
//       └─ returns new access_token

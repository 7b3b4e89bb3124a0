use crate::{
    api::{allowance, vacation_request},
    auth::middleware::auth_middleware,
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

    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));
    let mutation_limiter = Arc::new(build_limiter(config.rate_mutation_per_min));

    // Protected routes. Token issuance lives in the identity service; every
    // route here expects a bearer access token.
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/vacation")
                    // /vacation
                    .service(
                        web::resource("")
                            .route(web::get().to(vacation_request::vacation_list))
                            .route(web::post().to(vacation_request::create_vacation)),
                    )
                    // /vacation/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(vacation_request::get_vacation)),
                    )
                    // /vacation/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .wrap(mutation_limiter.clone())
                            .route(web::put().to(vacation_request::approve_vacation)),
                    )
                    // /vacation/{id}/reject
                    .service(
                        web::resource("/{id}/reject")
                            .wrap(mutation_limiter.clone())
                            .route(web::put().to(vacation_request::reject_vacation)),
                    )
                    // /vacation/{id}/cancel
                    .service(
                        web::resource("/{id}/cancel")
                            .wrap(mutation_limiter.clone())
                            .route(web::put().to(vacation_request::cancel_vacation)),
                    ),
            )
            .service(
                web::scope("/allowance")
                    // /allowance/balance
                    .service(
                        web::resource("/balance").route(web::get().to(allowance::get_balance)),
                    ),
            ),
    );
}

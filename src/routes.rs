use crate::{
    api::{attendance, employee, leave_request, settings},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

/// Per-IP limiter allowing `requests_per_min` requests per minute.
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);

    let cfg = GovernorConfigBuilder::default()
        .milliseconds_per_request(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("period and burst size are non-zero");
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));
    let clock_limiter = Arc::new(build_limiter(config.rate_clock_per_min));

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/attendance")
                    .service(
                        web::resource("/clock-in")
                            .wrap(clock_limiter.clone())
                            .route(web::post().to(attendance::clock_in)),
                    )
                    .service(
                        web::resource("/clock-out")
                            .wrap(clock_limiter.clone())
                            .route(web::post().to(attendance::clock_out)),
                    )
                    .service(
                        web::resource("/location-check")
                            .route(web::post().to(attendance::location_check)),
                    )
                    .service(web::resource("/today").route(web::get().to(attendance::today)))
                    .service(web::resource("/history").route(web::get().to(attendance::history)))
                    .service(
                        web::resource("/users/{user_id}")
                            .route(web::get().to(attendance::user_attendance)),
                    )
                    .service(
                        web::scope("/admin")
                            .service(
                                web::resource("/today").route(web::get().to(attendance::admin_today)),
                            )
                            .service(
                                web::resource("/report").route(web::get().to(attendance::report)),
                            )
                            .service(
                                web::resource("/stats").route(web::get().to(attendance::admin_stats)),
                            ),
                    ),
            )
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::get().to(leave_request::leave_list))
                            .route(web::post().to(leave_request::create_leave)),
                    )
                    // /leave/mine, registered before /leave/{id}
                    .service(web::resource("/mine").route(web::get().to(leave_request::my_leaves)))
                    // /leave/{id}
                    .service(web::resource("/{id}").route(web::get().to(leave_request::get_leave)))
                    // /leave/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(leave_request::approve_leave)),
                    )
                    // /leave/{id}/reject
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(leave_request::reject_leave)),
                    ),
            )
            .service(
                web::scope("/employees")
                    // /employees
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employee))
                            .route(web::get().to(employee::list_employees)),
                    )
                    // /employees/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(employee::update_employee))
                            .route(web::get().to(employee::get_employee))
                            .route(web::delete().to(employee::delete_employee)),
                    ),
            )
            .service(
                web::scope("/settings").service(
                    web::resource("/office")
                        .route(web::get().to(settings::get_office))
                        .route(web::put().to(settings::update_office)),
                ),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::issue_token;
    use crate::config::test_config;
    use crate::model::office::OfficeConfig;
    use crate::store::AttendanceStore;
    use crate::store::memory::MemoryStore;
    use crate::tracking::clock::Clock;
    use actix_web::{App, http::StatusCode, test as actix_test};
    use std::net::SocketAddr;

    #[test]
    fn limiter_accepts_zero_and_sub_millisecond_rates() {
        let _ = build_limiter(0);
        let _ = build_limiter(1);
        let _ = build_limiter(120_000);
    }

    #[actix_web::test]
    async fn scope_requires_a_bearer_token() {
        let config = test_config();
        let store: Arc<dyn AttendanceStore> = Arc::new(MemoryStore::default());
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(config.clone()))
                .app_data(web::Data::new(Clock::System))
                .app_data(web::Data::from(store))
                .configure(|cfg| configure(cfg, &config)),
        )
        .await;
        let peer: SocketAddr = "10.0.0.7:40000".parse().unwrap();

        let req = actix_test::TestRequest::get()
            .uri("/api/settings/office")
            .peer_addr(peer)
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let token = issue_token("u-1", "employee", &config.jwt_secret);
        let req = actix_test::TestRequest::get()
            .uri("/api/settings/office")
            .peer_addr(peer)
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let body: OfficeConfig = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, OfficeConfig::default());
    }

    #[actix_web::test]
    async fn clock_in_is_rate_limited_per_ip() {
        let mut config = test_config();
        config.rate_clock_per_min = 1;
        let store: Arc<dyn AttendanceStore> = Arc::new(MemoryStore::default());
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(config.clone()))
                .app_data(web::Data::new(Clock::System))
                .app_data(web::Data::from(store))
                .configure(|cfg| configure(cfg, &config)),
        )
        .await;
        let peer: SocketAddr = "10.0.0.8:40000".parse().unwrap();
        let token = issue_token("u-1", "employee", &config.jwt_secret);

        let clock_in = || {
            actix_test::TestRequest::post()
                .uri("/api/attendance/clock-in")
                .peer_addr(peer)
                .insert_header(("Authorization", format!("Bearer {}", token)))
                .set_json(OfficeConfig::default().center)
                .to_request()
        };

        let resp = actix_test::call_service(&app, clock_in()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = actix_test::call_service(&app, clock_in()).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}

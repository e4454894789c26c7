use crate::{
    api::{
        assignment, attendance, chat, dashboard, employee, event_stream, expense, leave_request,
        notice, payroll, recruitment, site,
    },
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
                web::resource("/available")
                    .wrap(register_limiter.clone())
                    .route(web::get().to(handlers::username_available)),
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
            .wrap(from_fn(auth_middleware))
            // authentication
            .wrap(protected_limiter) // rate limiting
            .service(handlers::protected)
            .service(
                web::scope("/employees")
                    // /employees
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employee))
                            .route(web::get().to(employee::list_employees)),
                    )
                    // /employees/{employee_id}
                    .service(
                        web::resource("/{employee_id}")
                            .route(web::put().to(employee::update_employee))
                            .route(web::get().to(employee::get_employee))
                            .route(web::delete().to(employee::delete_employee)),
                    ),
            )
            .service(
                web::scope("/sites")
                    // /sites
                    .service(
                        web::resource("")
                            .route(web::post().to(site::create_site))
                            .route(web::get().to(site::list_sites)),
                    )
                    // /sites/{site_id}
                    .service(
                        web::resource("/{site_id}")
                            .route(web::get().to(site::get_site))
                            .route(web::put().to(site::update_site)),
                    ),
            )
            .service(
                web::scope("/assignments")
                    .service(
                        web::resource("")
                            .route(web::post().to(assignment::create_assignment)),
                    )
                    // the caller's current assignment; must precede the id match
                    .service(
                        web::resource("/my").route(web::get().to(assignment::my_assignment)),
                    )
                    .service(
                        web::resource("/employee/{employee_id}")
                            .route(web::get().to(assignment::employee_assignments)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    .service(
                        web::resource("/geofence")
                            .route(web::post().to(attendance::evaluate_geofence)),
                    )
                    .service(
                        web::resource("/check-in").route(web::post().to(attendance::check_in)),
                    )
                    .service(
                        web::resource("/check-out").route(web::post().to(attendance::check_out)),
                    )
                    .service(
                        web::resource("/check-ins/my")
                            .route(web::get().to(attendance::my_check_ins)),
                    )
                    .service(
                        web::resource("/check-ins")
                            .route(web::get().to(attendance::list_check_ins)),
                    )
                    .service(
                        web::resource("/daily").route(web::get().to(attendance::list_daily)),
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
                    // /leave/my before /leave/{leave_id}
                    .service(web::resource("/my").route(web::get().to(leave_request::my_leaves)))
                    .service(
                        web::resource("/{leave_id}")
                            .route(web::get().to(leave_request::get_leave)),
                    )
                    .service(
                        web::resource("/{leave_id}/approve")
                            .route(web::put().to(leave_request::approve_leave)),
                    )
                    .service(
                        web::resource("/{leave_id}/reject")
                            .route(web::put().to(leave_request::reject_leave)),
                    ),
            )
            .service(
                web::scope("/expenses")
                    .service(
                        web::resource("")
                            .route(web::post().to(expense::create_claim))
                            .route(web::get().to(expense::list_claims)),
                    )
                    .service(
                        web::resource("/budgets/utilization")
                            .route(web::get().to(expense::budget_utilization)),
                    )
                    .service(
                        web::resource("/budgets").route(web::put().to(expense::set_budget)),
                    )
                    .service(
                        web::resource("/{claim_id}/approve")
                            .route(web::put().to(expense::approve_claim)),
                    )
                    .service(
                        web::resource("/{claim_id}/reject")
                            .route(web::put().to(expense::reject_claim)),
                    ),
            )
            .service(
                web::scope("/payroll")
                    // /payroll
                    .service(
                        web::resource("")
                            .route(web::post().to(payroll::create_payroll))
                            .route(web::put().to(payroll::update_payroll))
                            .route(web::get().to(payroll::list_payrolls)),
                    )
                    // /payroll/my before /payroll/{payroll_id}
                    .service(web::resource("/my").route(web::get().to(payroll::my_payrolls)))
                    .service(
                        web::resource("/{payroll_id}")
                            .route(web::get().to(payroll::get_payroll)),
                    ),
            )
            .service(
                web::scope("/recruitment")
                    .service(
                        web::resource("/postings")
                            .route(web::post().to(recruitment::create_posting))
                            .route(web::get().to(recruitment::list_postings)),
                    )
                    .service(
                        web::resource("/postings/{posting_id}/close")
                            .route(web::put().to(recruitment::close_posting)),
                    )
                    .service(
                        web::resource("/postings/{posting_id}/candidates")
                            .route(web::post().to(recruitment::add_candidate)),
                    )
                    .service(
                        web::resource("/candidates/{candidate_id}/status")
                            .route(web::put().to(recruitment::move_candidate)),
                    )
                    .service(
                        web::resource("/board")
                            .route(web::get().to(recruitment::candidate_board)),
                    ),
            )
            .service(
                web::scope("/notices").service(
                    web::resource("")
                        .route(web::post().to(notice::publish_notice))
                        .route(web::get().to(notice::list_notices)),
                ),
            )
            .service(
                web::scope("/chat")
                    .service(web::resource("").route(web::post().to(chat::send_message)))
                    .service(
                        web::resource("/{peer_id}").route(web::get().to(chat::conversation)),
                    ),
            )
            .service(
                web::scope("/dashboard").service(
                    web::resource("/summary").route(web::get().to(dashboard::summary)),
                ),
            )
            .service(
                web::scope("/events").service(
                    web::resource("/stream")
                        .route(web::get().to(event_stream::event_stream)),
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

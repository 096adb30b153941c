use actix_web::web;

use crate::handlers;

/// Registers every API route under `/api/v1`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(
                web::scope("/employees")
                    .route("", web::post().to(handlers::employees::create_employee))
                    .route("", web::get().to(handlers::employees::get_employees))
                    .route("/{id}", web::get().to(handlers::employees::get_employee))
                    .route("/{id}", web::put().to(handlers::employees::update_employee))
                    .route(
                        "/{id}",
                        web::delete().to(handlers::employees::delete_employee),
                    ),
            )
            .service(
                web::scope("/overtime")
                    .route("", web::post().to(handlers::overtime::log_overtime))
                    .route(
                        "/employee/{employeeId}",
                        web::get().to(handlers::overtime::logs_for_employee),
                    )
                    .route("/{logId}", web::get().to(handlers::overtime::get_log))
                    .route("/{logId}", web::put().to(handlers::overtime::update_log))
                    .route("/{logId}", web::delete().to(handlers::overtime::delete_log)),
            )
            .service(
                web::scope("/certify")
                    .route("", web::post().to(handlers::certification::certify))
                    .route("/recover", web::post().to(handlers::certification::recover)),
            )
            .service(web::scope("/certificates").route(
                "/employee/{employeeId}/{year}",
                web::get().to(handlers::certification::certificates_for_year),
            ))
            .service(
                web::scope("/credits")
                    .route("/debit", web::post().to(handlers::credits::debit))
                    .route(
                        "/expire-sweep",
                        web::post().to(handlers::credits::expire_sweep),
                    )
                    .route(
                        "/balance/{employeeId}",
                        web::get().to(handlers::credits::balance),
                    )
                    .route(
                        "/historical",
                        web::post().to(handlers::credits::import_historical),
                    )
                    .route(
                        "/verify/{employeeId}",
                        web::get().to(handlers::credits::verify_ledger),
                    ),
            )
            .service(
                web::scope("/reports")
                    .route(
                        "/ledger/{employeeId}",
                        web::get().to(handlers::reports::detailed_ledger),
                    )
                    .route(
                        "/transactions/{employeeId}",
                        web::get().to(handlers::reports::ledger_entries),
                    )
                    .route(
                        "/uncertified",
                        web::get().to(handlers::reports::uncertified_stats),
                    )
                    .route(
                        "/uncertified/detailed",
                        web::get().to(handlers::reports::uncertified_detailed),
                    )
                    .route(
                        "/certified-months/{employeeId}/{year}",
                        web::get().to(handlers::reports::certified_months),
                    )
                    .route(
                        "/progress/{employeeId}/{year}/{month}",
                        web::get().to(handlers::reports::progress),
                    ),
            )
            .service(
                web::scope("/holidays")
                    .route("", web::post().to(handlers::holidays::create_holiday))
                    .route(
                        "/{year}",
                        web::get().to(handlers::holidays::holidays_for_year),
                    )
                    .route(
                        "/id/{holidayId}",
                        web::delete().to(handlers::holidays::delete_holiday),
                    ),
            )
            .service(
                web::scope("/config")
                    .route("", web::get().to(handlers::admin::get_configuration))
                    .route("/{key}", web::put().to(handlers::admin::set_configuration)),
            )
            .service(
                web::scope("/libraries")
                    .route("/{category}", web::get().to(handlers::admin::get_library))
                    .route("/{category}", web::put().to(handlers::admin::put_library)),
            ),
    );
}

use crate::handlers::{appointments, credentials, doctors, health_check, patients};
use crate::metrics::metrics_handler;
use actix_web::web;

/// Mount every endpoint. Shared by the server and the service tests.
///
/// Collection and item paths are separate resources, so `PUT`/`DELETE`
/// without an id answer 405 instead of falling through.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/metrics", web::get().to(metrics_handler))
        // Doctor credentials
        .route("/doctor-register", web::post().to(credentials::register))
        .route("/doctor-login", web::post().to(credentials::login))
        .service(
            web::scope("/patients")
                .service(
                    web::resource("")
                        .route(web::get().to(patients::list_patients))
                        .route(web::post().to(patients::create_patient)),
                )
                .service(
                    web::resource("/{id}")
                        .route(web::get().to(patients::get_patient))
                        .route(web::put().to(patients::update_patient))
                        .route(web::delete().to(patients::delete_patient)),
                ),
        )
        .service(
            web::scope("/doctors")
                .service(
                    web::resource("")
                        .route(web::get().to(doctors::list_doctors))
                        .route(web::post().to(doctors::create_doctor)),
                )
                .service(
                    web::resource("/{id}")
                        .route(web::get().to(doctors::get_doctor))
                        .route(web::put().to(doctors::update_doctor))
                        .route(web::delete().to(doctors::delete_doctor)),
                ),
        )
        .service(
            web::scope("/appointments")
                .app_data(web::QueryConfig::default().error_handler(appointments::query_error))
                .service(
                    web::resource("")
                        .route(web::get().to(appointments::list_appointments))
                        .route(web::post().to(appointments::create_appointment)),
                )
                // must precede /{id}
                .service(web::resource("/upcoming").route(web::get().to(appointments::list_upcoming)))
                .service(
                    web::resource("/{id}")
                        .route(web::get().to(appointments::get_appointment))
                        .route(web::put().to(appointments::update_appointment))
                        .route(web::delete().to(appointments::delete_appointment)),
                ),
        );
}

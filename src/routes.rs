use crate::{
    api::{attendance, faces},
    assets,
    config::Config,
    error::AppError,
    pages,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::Condition, web};
use std::sync::Arc;

// descriptors are posted as JSON arrays
const JSON_LIMIT: usize = 10 * 1024 * 1024;

type Limiter = Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>>;

// Per-IP limiter allowing `requests_per_min` with an equal burst.
fn build_limiter(requests_per_min: u32) -> Limiter {
    let requests_per_min = requests_per_min.max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond((60_000 / u64::from(requests_per_min)).max(1))
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_default();
    Arc::new(Governor::new(&cfg))
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT)
        .error_handler(|err, _req| {
            tracing::debug!(error = %err, "Rejected JSON payload");
            AppError::BadRequest(err.to_string()).into()
        })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    let api_limiter = build_limiter(config.rate_api_per_min);
    let scan_limiter = build_limiter(config.rate_scan_per_min);
    let api_limited = config.rate_api_per_min > 0;
    let scan_limited = config.rate_scan_per_min > 0;
    let scan_guard = || Condition::new(scan_limited, scan_limiter.clone());

    cfg.app_data(json_config()).app_data(query_config());

    // Pages and browser assets
    cfg.service(web::resource("/").route(web::get().to(pages::dashboard)))
        .service(web::resource("/register").route(web::get().to(pages::register)))
        .service(web::resource("/records").route(web::get().to(pages::records)))
        .service(web::resource("/static/app.js").route(web::get().to(pages::app_js)))
        .service(web::resource("/faceapi.js").route(web::get().to(assets::faceapi_js)))
        .service(web::resource("/models/{file}").route(web::get().to(assets::model_file)));

    // JSON API
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(Condition::new(api_limited, api_limiter))
            // /faces
            .service(
                web::resource("/faces")
                    .route(web::get().to(faces::list_faces))
                    .route(web::post().to(faces::register_face)),
            )
            // /faces/{id}
            .service(web::resource("/faces/{id}").route(web::delete().to(faces::delete_face)))
            .service(web::resource("/departments").route(web::get().to(faces::list_departments)))
            .service(
                web::resource("/recognize")
                    .wrap(scan_guard())
                    .route(web::post().to(attendance::recognize)),
            )
            .service(
                web::scope("/attendance")
                    // /attendance
                    .service(web::resource("").route(web::get().to(attendance::history)))
                    .service(web::resource("/today").route(web::get().to(attendance::today)))
                    .service(web::resource("/stats").route(web::get().to(attendance::stats)))
                    .service(
                        web::resource("/check-in")
                            .wrap(scan_guard())
                            .route(web::post().to(attendance::check_in)),
                    )
                    .service(
                        web::resource("/check-out")
                            .wrap(scan_guard())
                            .route(web::post().to(attendance::check_out)),
                    ),
            ),
    );
}

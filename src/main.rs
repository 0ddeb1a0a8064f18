use actix_web::middleware::{Logger, NormalizePath};
use actix_web::web::Data;
use actix_web::{App, HttpServer};

mod api;
mod assets;
mod config;
mod db;
mod docs;
mod domain;
mod error;
mod model;
mod pages;
mod routes;
mod service;
mod store;
mod utils;

#[cfg(test)]
mod test_support;

use config::Config;
use db::init_db;

use crate::docs::ApiDoc;
use crate::pages::Pages;
use crate::utils::clock::Clock;
use crate::utils::descriptor_cache::DescriptorCache;
use tracing::{error, info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

fn print_db_help(database_url: &str, e: &sqlx::Error) {
    eprintln!();
    eprintln!("Could not open the attendance database!");
    eprintln!("   URL     : {database_url}");
    eprintln!("   Error   : {e}");
    eprintln!("   HOW TO FIX:");
    eprintln!("   1. Check that the directory in DATABASE_URL exists and is writable");
    eprintln!("   2. Use a file URL such as sqlite://face_attendance.db");
    eprintln!("   3. Make sure no other process holds a lock on the file");
    eprintln!();
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e:#}");
            std::process::exit(1);
        }
    };

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(addr = %config.server_addr, "Server starting...");

    let pool = match init_db(&config.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            error!(error = %e, "Database unavailable");
            print_db_help(&config.database_url, &e);
            std::process::exit(1);
        }
    };

    if config.download_assets {
        match assets::ensure_assets(&config).await {
            Ok(report) if !report.is_complete() => {
                warn!(missing = ?report.failed, "Some browser assets are missing")
            }
            Ok(_) => {}
            Err(e) => warn!(error = %format!("{e:#}"), "Asset setup failed"),
        }
    }

    let pages = match Pages::new() {
        Ok(pages) => Data::new(pages),
        Err(e) => {
            error!(error = %e, "Page templates failed to load");
            return Err(std::io::Error::other(e.to_string()));
        }
    };

    let cache = Data::new(DescriptorCache::new(config.descriptor_cache_ttl_secs));
    let clock = Data::new(Clock::System);

    let pool_for_cache_warmup = pool.clone();
    let cache_for_warmup = cache.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = cache_for_warmup.warmup(&pool_for_cache_warmup).await {
            warn!(error = %format!("{e:#}"), "Failed to warm up descriptor cache");
        }
    });

    let server_addr = config.server_addr.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard serves the JS/CSS too
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(pool.clone()))
            .app_data(Data::new(config.clone()))
            .app_data(cache.clone())
            .app_data(clock.clone())
            .app_data(pages.clone())
            .configure(|cfg| routes::configure(cfg, &config))
    })
    .bind(server_addr)?
    .run()
    .await
}

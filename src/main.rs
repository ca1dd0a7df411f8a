#[macro_use]
extern crate lazy_static;
use actix_identity::IdentityMiddleware;
use actix_session::{storage::CookieSessionStore, SessionMiddleware};

use std::str::FromStr;
use tera::Tera;

use actix_files::{Files, NamedFile};
use actix_web::{
    http::{Method, StatusCode},
    middleware,
    web::{self, Data},
    App, Either, HttpResponse, HttpServer, Responder,
};
use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode},
    SqlitePool,
};

mod aggregate;
mod auth;
mod config;
mod db;
mod errors;
mod export;
mod flash;
mod routes;
mod structs;
mod utils;

use config::Config;
use errors::AppError;

#[derive(Debug, Clone)]
pub struct AppState {
    db_pool: SqlitePool,
}

lazy_static! {
    pub static ref TEMPLATES: Tera = {
        let mut tera = match Tera::new("templates/**/*") {
            Ok(t) => t,
            Err(e) => {
                log::error!("Parsing error(s): {}", e);
                ::std::process::exit(1);
            }
        };
        tera.autoescape_on(vec![".html"]);
        tera.register_filter("rupiah", utils::rupiah_filter);
        tera
    };
}

async fn connect(database_url: &str) -> Result<SqlitePool, AppError> {
    let opts = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .read_only(false)
        .busy_timeout(std::time::Duration::from_secs(5));

    let db_pool = SqlitePool::connect_with(opts).await?;
    sqlx::migrate!().run(&db_pool).await?;
    Ok(db_pool)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| {
        log::error!("FATAL: {}", e);
        e
    })?;

    let db_pool = connect(&config.database_url).await.map_err(|e| {
        log::error!("FATAL: could not open {}: {}", config.database_url, e);
        e
    })?;
    info!("Database migrated successfully");

    // Fail on template errors before accepting traffic.
    lazy_static::initialize(&TEMPLATES);

    let session_key = config.session_key.clone();
    let cookie_secure = config.cookie_secure;

    info!(
        "Starting HTTP server on http://{}:{}/",
        config.host, config.port
    );

    HttpServer::new(move || {
        App::new()
            // enable automatic response compression - usually register this first
            .wrap(middleware::Compress::default())
            .wrap(IdentityMiddleware::default())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), session_key.clone())
                    .cookie_secure(cookie_secure)
                    .build(),
            )
            // enable logger - always register Actix Web Logger middleware last
            .wrap(middleware::Logger::default())
            .service(Files::new("/static", "static"))
            .configure(routes::configure)
            .app_data(Data::new(AppState {
                db_pool: db_pool.clone(),
            }))
            .default_service(web::to(default_handler))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}

async fn default_handler(req_method: Method) -> Result<impl Responder, std::io::Error> {
    match req_method {
        Method::GET => {
            let file = NamedFile::open("static/404.html")?
                .customize()
                .with_status(StatusCode::NOT_FOUND);
            Ok(Either::Left(file))
        }
        _ => Ok(Either::Right(HttpResponse::MethodNotAllowed().finish())),
    }
}

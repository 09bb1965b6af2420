use actix_files as fs;
use actix_web::dev::Server;
use actix_web::http::Method;
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::{guard, web, App, HttpResponse, HttpServer};
use std::net::TcpListener;

use crate::auth::TokenService;
use crate::configuration::PolkaSettings;
use crate::database::Database;
use crate::middleware::{HitCounter, HitCounterMiddleware, JwtMiddleware};
use crate::routes::{
    create_chirp, create_user, delete_chirp, get_chirp, get_chirps, health_check, login, metrics,
    polka_webhook, refresh, reset, revoke, update_user, validate_chirp,
};

/// Answers CORS preflight requests for any path
async fn preflight() -> HttpResponse {
    HttpResponse::Ok().finish()
}

fn cors_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("Access-Control-Allow-Origin", "*"))
        .add(("Access-Control-Allow-Methods", "GET, POST, OPTIONS, PUT, DELETE"))
        .add(("Access-Control-Allow-Headers", "*"))
}

pub fn run(
    listener: TcpListener,
    db: Database,
    tokens: TokenService,
    polka: PolkaSettings,
    static_root: String,
) -> Result<Server, std::io::Error> {
    let db = web::Data::new(db);
    let tokens = web::Data::new(tokens);
    let polka = web::Data::new(polka);
    let counter = HitCounter::new();
    let counter_data = web::Data::new(counter.clone());

    let server = HttpServer::new(move || {
        let authenticated = || JwtMiddleware::new(db.clone(), tokens.clone());

        App::new()
            // Global middleware
            .wrap(cors_headers())
            .wrap(Logger::default())

            // Shared state
            .app_data(db.clone())
            .app_data(tokens.clone())
            .app_data(polka.clone())
            .app_data(counter_data.clone())

            .route("/{tail:.*}", web::method(Method::OPTIONS).to(preflight))

            // Admin
            .route("/api/healthz", web::get().to(health_check))
            .route("/admin/metrics", web::get().to(metrics))
            .route("/api/reset", web::post().to(reset))

            // Routes that require an access token
            .service(
                web::resource("/api/users")
                    .guard(guard::Put())
                    .wrap(authenticated())
                    .route(web::put().to(update_user)),
            )
            .service(
                web::resource("/api/chirps")
                    .guard(guard::Post())
                    .wrap(authenticated())
                    .route(web::post().to(create_chirp)),
            )
            .service(
                web::resource("/api/chirps/{chirp_id}")
                    .guard(guard::Delete())
                    .wrap(authenticated())
                    .route(web::delete().to(delete_chirp)),
            )

            // Public routes
            .route("/api/users", web::post().to(create_user))
            .route("/api/login", web::post().to(login))
            .route("/api/refresh", web::post().to(refresh))
            .route("/api/revoke", web::post().to(revoke))
            .route("/api/validate_chirp", web::post().to(validate_chirp))
            .route("/api/chirps", web::get().to(get_chirps))
            .route("/api/chirps/{chirp_id}", web::get().to(get_chirp))
            .route("/api/polka/webhooks", web::post().to(polka_webhook))

            // Static file serving (must be last to not override API routes)
            .service(
                web::scope("/app")
                    .wrap(HitCounterMiddleware::new(counter.clone()))
                    .service(fs::Files::new("/", static_root.clone()).index_file("index.html")),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}

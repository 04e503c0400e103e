use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use foodgram_backend::config::Config;
use foodgram_backend::services::media::MediaStorage;
use foodgram_backend::{api, db};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env().expect("Failed to load configuration");

    log::info!(
        "Starting server on {}:{}",
        config.server.host,
        config.server.port
    );
    let pool = db::create_pool(&config)
        .await
        .expect("Failed to connect to the database");
    log::info!("Database connection established");

    if let Err(e) = db::fixtures::load(&pool, &config.fixtures).await {
        log::error!("Failed to load fixtures: {:?}", e);
    }

    std::fs::create_dir_all(&config.media.root)?;
    let media = MediaStorage::new(&config.media);

    let openapi = api::ApiDoc::openapi();

    let server_host = config.server.host.clone();
    let server_port = config.server.port;
    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(media.clone()))
            .route(
                "/api/docs",
                web::get().to(|| async {
                    actix_web::HttpResponse::PermanentRedirect()
                        .append_header(("Location", "/api/docs/"))
                        .finish()
                }),
            )
            .service(
                SwaggerUi::new("/api/docs/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
            .configure(api::configure)
    })
    .bind(format!("{}:{}", server_host, server_port))?
    .run()
    .await
}

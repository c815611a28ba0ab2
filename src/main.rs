use actix_web::{App, HttpServer, middleware::Logger, web};
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use chrono::Local;  // timestamp in log lines

use agricare_backend::{
    config::Config,
    database::{create_pool, ensure_schema},
    external::{GeocodingService, LogTransport},
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    store::StoreHandle,
    swagger::swagger_config,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 加载配置
    let config = Config::from_toml().map_err(|e| std::io::Error::other(e.to_string()))?;

    // 创建数据库连接池并建表
    let pool = create_pool(&config.database)
        .await
        .map_err(std::io::Error::other)?;
    ensure_schema(&pool).await.map_err(std::io::Error::other)?;

    // 键值存储：Redis 不可用时降级到进程内存储
    let store = StoreHandle::from_config(&config.redis).await;
    if store.is_degraded() {
        log::warn!("Key-value store running in-process; OTP state will not survive restarts");
    }

    let jwt_service = JwtService::new(&config.jwt.secret, config.jwt.access_token_expires_in);

    // 创建服务
    let user_service = UserService::new(pool.clone());
    let otp_service = OtpService::new(store, OtpPolicy::default());
    let auth_service = AuthService::new(
        user_service.clone(),
        otp_service,
        jwt_service.clone(),
        LogTransport::new(&config.email),
    );
    let geocoding_service = GeocodingService::new(config.geocoding.clone());
    if !geocoding_service.is_enabled() {
        log::warn!("GOOGLE_MAPS_API_KEY not set; listing locations fall back to coordinates");
    }
    let listing_service = ListingService::new(pool.clone(), geocoding_service);

    // 启动HTTP服务器
    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .wrap(create_cors())
            .app_data(web::Data::new(user_service.clone()))
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(listing_service.clone()))
            .configure(swagger_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::auth_config)
                    .configure(handlers::geo_config)
                    .configure(handlers::listing_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}

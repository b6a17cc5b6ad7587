use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use std::sync::Arc;

use kadeeo_backend::{
    config::Config,
    database::{EstablishmentLocks, GameStore, MemoryStore, SeaOrmStore, create_pool, run_migrations},
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
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
    let config = Config::from_toml().expect("Failed to load configuration file");

    // 选择存储：memory:// 使用内存存储，否则连接数据库并运行迁移
    let store: Arc<dyn GameStore> = if config.database.is_memory() {
        log::warn!("Using in-memory store, data is lost on restart");
        Arc::new(MemoryStore::new())
    } else {
        let pool = create_pool(&config.database)
            .await
            .expect("Failed to create database connection pool");
        run_migrations(&pool)
            .await
            .expect("Failed to run database migrations");
        Arc::new(SeaOrmStore::new(pool))
    };

    // 创建JWT服务
    let jwt_service = JwtService::new(&config.jwt.secret, config.jwt.access_token_expires_in);

    // 创建服务（共享同一组商户锁）
    let locks = EstablishmentLocks::new();
    let ledger = ParticipationLedger::new(store.clone(), locks.clone());
    let draw_service = DrawService::new(
        store.clone(),
        ledger.clone(),
        config.game.effective_code_length(),
    );
    let redemption_service = RedemptionService::new(ledger.clone());
    let prize_service = PrizeService::new(store, locks);

    // 启动HTTP服务器
    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors())
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .app_data(web::Data::new(ledger.clone()))
            .app_data(web::Data::new(draw_service.clone()))
            .app_data(web::Data::new(redemption_service.clone()))
            .app_data(web::Data::new(prize_service.clone()))
            .configure(swagger_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::game_config)
                    .configure(handlers::staff_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}

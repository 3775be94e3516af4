use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter

use pintuan_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    tasks,
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

    // 创建数据库连接池
    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    // 运行数据库迁移
    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    let jwt_service = JwtService::new(&config.jwt.secret, config.jwt.access_token_expires_in);

    // 创建服务
    let points_service = PointsService::new(pool.clone());
    let checkin_service = CheckinService::new(pool.clone(), config.points.checkin_reward);
    let renew_service = RenewService::new(pool.clone());
    let campaign_service =
        CampaignService::new(pool.clone(), points_service.clone(), renew_service.clone());
    let lottery_service = LotteryService::new(pool.clone());

    // 启动后台任务
    tasks::spawn_all(
        lottery_service.clone(),
        config.lottery.auto_draw_interval_secs,
    );

    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    let cors_config = config.cors.clone();
    let cron_config = config.cron.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors(&cors_config))
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .app_data(web::Data::new(points_service.clone()))
            .app_data(web::Data::new(checkin_service.clone()))
            .app_data(web::Data::new(renew_service.clone()))
            .app_data(web::Data::new(campaign_service.clone()))
            .app_data(web::Data::new(lottery_service.clone()))
            .app_data(web::Data::new(cron_config.clone()))
            .configure(swagger_config)
            .configure(handlers::cron_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::campaign_config)
                    .configure(handlers::lottery_config)
                    .configure(handlers::points_config)
                    .configure(handlers::admin_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}

use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub points: PointsConfig,
    #[serde(default)]
    pub lottery: LotteryConfig,
    #[serde(default)]
    pub cron: CronConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expires_in: i64, // seconds
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CorsConfig {
    /// 为空时允许任意来源
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointsConfig {
    /// 每日签到奖励积分
    #[serde(default = "default_checkin_reward")]
    pub checkin_reward: i64,
}

impl Default for PointsConfig {
    fn default() -> Self {
        Self {
            checkin_reward: default_checkin_reward(),
        }
    }
}

fn default_checkin_reward() -> i64 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotteryConfig {
    /// 进程内自动开奖扫描间隔（秒），0 表示只依赖外部 cron 调用
    #[serde(default = "default_auto_draw_interval")]
    pub auto_draw_interval_secs: u64,
}

impl Default for LotteryConfig {
    fn default() -> Self {
        Self {
            auto_draw_interval_secs: default_auto_draw_interval(),
        }
    }
}

fn default_auto_draw_interval() -> u64 {
    60
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CronConfig {
    /// 配置后 /cron/* 需要携带 X-Cron-Secret
    #[serde(default)]
    pub secret: Option<String>,
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 尝试读取配置文件，如果不存在则完全依赖环境变量
        let mut config: Config = match std::fs::read_to_string(&config_path) {
            Ok(config_str) => Self::parse(&config_str)?,
            Err(e) if e.kind() == ErrorKind::NotFound => Self::from_env_only()?,
            Err(e) => {
                return Err(format!("无法读取配置文件 {config_path}: {e}").into());
            }
        };

        // 环境变量覆盖（即便文件存在时也覆盖）
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn parse(config_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        toml::from_str(config_str).map_err(|e| format!("解析配置文件失败: {e}").into())
    }

    fn from_env_only() -> Result<Self, Box<dyn std::error::Error>> {
        // 数据库 URL 在无配置文件时必须提供
        let database_url = get_env("DATABASE_URL")
            .ok_or("缺少 DATABASE_URL 环境变量，且未找到配置文件 config.toml")?;

        Ok(Config {
            server: ServerConfig {
                host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: get_env_parse("SERVER_PORT", 8080u16),
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
            },
            jwt: JwtConfig {
                secret: get_env("JWT_SECRET").unwrap_or_else(|| "change-me-in-production".to_string()),
                access_token_expires_in: get_env_parse("JWT_ACCESS_EXPIRES_IN", 7200i64),
            },
            cors: CorsConfig::default(),
            points: PointsConfig::default(),
            lottery: LotteryConfig::default(),
            cron: CronConfig::default(),
        })
    }

    fn apply_env_overrides(&mut self) {
        if let Some(v) = get_env("SERVER_HOST") {
            self.server.host = v;
        }
        if let Some(v) = get_env("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            self.server.port = p;
        }
        if let Some(v) = get_env("DATABASE_URL") {
            self.database.url = v;
        }
        if let Some(v) = get_env("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            self.database.max_connections = mc;
        }
        if let Some(v) = get_env("JWT_SECRET") {
            self.jwt.secret = v;
        }
        if let Some(v) = get_env("JWT_ACCESS_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            self.jwt.access_token_expires_in = n;
        }
        if let Some(v) = get_env("CORS_ALLOWED_ORIGINS") {
            self.cors.allowed_origins = split_list(&v);
        }
        if let Some(v) = get_env("CHECKIN_REWARD_POINTS")
            && let Ok(n) = v.parse()
        {
            self.points.checkin_reward = n;
        }
        if let Some(v) = get_env("AUTO_DRAW_INTERVAL_SECS")
            && let Ok(n) = v.parse()
        {
            self.lottery.auto_draw_interval_secs = n;
        }
        if let Some(v) = get_env("CRON_SECRET") {
            self.cron.secret = Some(v).filter(|s| !s.is_empty());
        }
    }
}

fn get_env(name: &str) -> Option<String> {
    env::var(name).ok()
}

fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

use super::parsing::{
    env_optional, env_or_default, generate_secret_key, is_http_url, parse_bool,
    parse_cors_origins, parse_environment, parse_u16, parse_u32, parse_u64, parse_utc_offset,
};
use super::types::{
    AnalyzerSettings, ApiSettings, ConfigError, CorsSettings, DatabaseSettings, QuizSettings,
    RedisSettings, RuntimeSettings, SecuritySettings, ServerHost, ServerPort, ServerSettings,
    Settings, SyncSettings, TelemetrySettings,
};

const MAX_SWEEP_BATCH_SIZE: u32 = 500;

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let host = env_or_default("CLASSROOM_HOST", "0.0.0.0");
        let port = env_or_default("CLASSROOM_PORT", "8000");

        let environment = parse_environment(
            env_optional("CLASSROOM_ENV").or_else(|| env_optional("ENVIRONMENT")),
        );
        let strict_config = env_optional("CLASSROOM_STRICT_CONFIG")
            .map(|value| parse_bool(&value))
            .unwrap_or(false)
            || environment.is_production();

        let project_name = env_or_default("PROJECT_NAME", "Classroom Connect API");
        let version = env_or_default("VERSION", env!("CARGO_PKG_VERSION"));
        let api_v1_str = env_or_default("API_V1_STR", "/api/v1");

        let (secret_key, secret_key_generated) = match env_optional("SECRET_KEY") {
            Some(value) => (value, false),
            None if strict_config => return Err(ConfigError::MissingSecret("SECRET_KEY")),
            None => (generate_secret_key(), true),
        };

        let access_token_expire_minutes = parse_u64(
            "ACCESS_TOKEN_EXPIRE_MINUTES",
            env_or_default("ACCESS_TOKEN_EXPIRE_MINUTES", "1440"),
        )?;
        let algorithm = env_or_default("ALGORITHM", "HS256");

        let cors_origins = parse_cors_origins(env_optional("BACKEND_CORS_ORIGINS"))?;

        let postgres_server = env_or_default("POSTGRES_SERVER", "localhost");
        let postgres_port = parse_u16("POSTGRES_PORT", env_or_default("POSTGRES_PORT", "5432"))?;
        let postgres_user = env_or_default("POSTGRES_USER", "classroom");
        let postgres_password = env_or_default("POSTGRES_PASSWORD", "");
        let postgres_db = env_or_default("POSTGRES_DB", "classroom_connect");
        let database_url = env_optional("DATABASE_URL");

        let redis_host = env_or_default("REDIS_HOST", "localhost");
        let redis_port = parse_u16("REDIS_PORT", env_or_default("REDIS_PORT", "6379"))?;
        let redis_db = parse_u16("REDIS_DB", env_or_default("REDIS_DB", "0"))?;
        let redis_password = env_or_default("REDIS_PASSWORD", "");

        let analyzer_base_url =
            env_or_default("ACADEMIC_ANALYZER_BASE_URL", "http://localhost:5000")
                .trim_end_matches('/')
                .to_string();
        let analyzer_timeout =
            parse_u64("ANALYZER_TIMEOUT_SECONDS", env_or_default("ANALYZER_TIMEOUT_SECONDS", "10"))?;
        let analyzer_lookup_timeout = parse_u64(
            "ANALYZER_LOOKUP_TIMEOUT_SECONDS",
            env_or_default("ANALYZER_LOOKUP_TIMEOUT_SECONDS", "5"),
        )?;
        let analyzer_cache_ttl = parse_u64(
            "ANALYZER_CACHE_TTL_SECONDS",
            env_or_default("ANALYZER_CACHE_TTL_SECONDS", "600"),
        )?;
        let fallback_email_domain =
            env_or_default("ANALYZER_FALLBACK_EMAIL_DOMAIN", "psgtech.ac.in");

        let timezone_offset =
            parse_utc_offset("QUIZ_TIMEZONE_OFFSET", env_or_default("QUIZ_TIMEZONE_OFFSET", "+00:00"))?;

        let sync_on_submit =
            env_optional("SYNC_ON_SUBMIT").map(|value| parse_bool(&value)).unwrap_or(true);
        let sweep_interval_seconds = parse_u64(
            "SYNC_SWEEP_INTERVAL_SECONDS",
            env_or_default("SYNC_SWEEP_INTERVAL_SECONDS", "300"),
        )?;
        let sweep_batch_size = parse_u32(
            "SYNC_SWEEP_BATCH_SIZE",
            env_or_default("SYNC_SWEEP_BATCH_SIZE", "100"),
        )?;

        let log_level = env_or_default("CLASSROOM_LOG_LEVEL", "info");
        let json = env_optional("CLASSROOM_LOG_JSON").map(|value| parse_bool(&value)).unwrap_or(false);
        let prometheus_enabled =
            env_optional("PROMETHEUS_ENABLED").map(|value| parse_bool(&value)).unwrap_or(false);

        let settings = Self {
            server: ServerSettings {
                host: ServerHost::parse(host)?,
                port: ServerPort::parse(port)?,
            },
            runtime: RuntimeSettings { environment, strict_config },
            api: ApiSettings { project_name, version, api_v1_str },
            security: SecuritySettings {
                secret_key,
                secret_key_generated,
                access_token_expire_minutes,
                algorithm,
            },
            cors: CorsSettings { origins: cors_origins },
            database: DatabaseSettings {
                postgres_server,
                postgres_port,
                postgres_user,
                postgres_password,
                postgres_db,
                database_url,
            },
            redis: RedisSettings {
                host: redis_host,
                port: redis_port,
                db: redis_db,
                password: redis_password,
            },
            analyzer: AnalyzerSettings {
                base_url: analyzer_base_url,
                request_timeout_seconds: analyzer_timeout,
                lookup_timeout_seconds: analyzer_lookup_timeout,
                cache_ttl_seconds: analyzer_cache_ttl,
                fallback_email_domain,
            },
            quiz: QuizSettings { timezone_offset },
            sync: SyncSettings { sync_on_submit, sweep_interval_seconds, sweep_batch_size },
            telemetry: TelemetrySettings { log_level, json, prometheus_enabled },
        };

        settings.validate()?;
        Ok(settings)
    }

    pub(crate) fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host.0, self.server.port.0)
    }

    pub(crate) fn server_host(&self) -> &str {
        &self.server.host.0
    }

    pub(crate) fn server_port(&self) -> u16 {
        self.server.port.0
    }

    pub(crate) fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub(crate) fn security(&self) -> &SecuritySettings {
        &self.security
    }

    pub(crate) fn cors(&self) -> &CorsSettings {
        &self.cors
    }

    pub(crate) fn database(&self) -> &DatabaseSettings {
        &self.database
    }

    pub(crate) fn redis(&self) -> &RedisSettings {
        &self.redis
    }

    pub(crate) fn analyzer(&self) -> &AnalyzerSettings {
        &self.analyzer
    }

    pub(crate) fn quiz(&self) -> &QuizSettings {
        &self.quiz
    }

    pub(crate) fn sync(&self) -> &SyncSettings {
        &self.sync
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !is_http_url(&self.analyzer.base_url) {
            return Err(ConfigError::InvalidValue {
                field: "ACADEMIC_ANALYZER_BASE_URL",
                value: self.analyzer.base_url.clone(),
            });
        }

        if self.analyzer.request_timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "ANALYZER_TIMEOUT_SECONDS",
                value: "0".to_string(),
            });
        }

        if self.analyzer.lookup_timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "ANALYZER_LOOKUP_TIMEOUT_SECONDS",
                value: "0".to_string(),
            });
        }

        if self.analyzer.fallback_email_domain.is_empty()
            || self.analyzer.fallback_email_domain.contains('@')
        {
            return Err(ConfigError::InvalidValue {
                field: "ANALYZER_FALLBACK_EMAIL_DOMAIN",
                value: self.analyzer.fallback_email_domain.clone(),
            });
        }

        if self.sync.sweep_interval_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "SYNC_SWEEP_INTERVAL_SECONDS",
                value: "0".to_string(),
            });
        }

        if self.sync.sweep_batch_size == 0 || self.sync.sweep_batch_size > MAX_SWEEP_BATCH_SIZE {
            return Err(ConfigError::InvalidValue {
                field: "SYNC_SWEEP_BATCH_SIZE",
                value: self.sync.sweep_batch_size.to_string(),
            });
        }

        if !(self.runtime.strict_config || self.runtime.environment.is_production()) {
            return Ok(());
        }

        if self.database.database_url.is_none() && self.database.postgres_password.is_empty() {
            return Err(ConfigError::MissingSecret("POSTGRES_PASSWORD"));
        }

        Ok(())
    }
}

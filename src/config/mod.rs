use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub invites: InviteConfig,
    pub video: VideoConfig,
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub cors_origins: Vec<String>,
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InviteConfig {
    pub expiry_days: i64,
    /// Base URL of the web app; accept links are built as `{base}/invites/{token}`
    pub public_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoConfig {
    pub api_base_url: String,
    pub token_id: String,
    #[serde(skip_serializing)]
    pub token_secret: String,
    #[serde(skip_serializing)]
    pub webhook_secret: String,
    pub cors_origin: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub error_tracking_url: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout =
                v.parse().unwrap_or(self.database.connection_timeout);
        }

        // API overrides
        if let Some(port) = env::var("API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.api.port = port;
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }

        // Invite overrides
        if let Ok(v) = env::var("INVITE_EXPIRY_DAYS") {
            self.invites.expiry_days = v
                .parse::<i64>()
                .ok()
                .filter(|days| *days > 0)
                .unwrap_or(self.invites.expiry_days);
        }
        if let Ok(v) = env::var("PUBLIC_BASE_URL") {
            self.invites.public_base_url = v.trim_end_matches('/').to_string();
        }

        // Video provider overrides
        if let Ok(v) = env::var("VIDEO_API_BASE_URL") {
            self.video.api_base_url = v.trim_end_matches('/').to_string();
        }
        if let Ok(v) = env::var("VIDEO_TOKEN_ID") {
            self.video.token_id = v;
        }
        if let Ok(v) = env::var("VIDEO_TOKEN_SECRET") {
            self.video.token_secret = v;
        }
        if let Ok(v) = env::var("VIDEO_WEBHOOK_SECRET") {
            self.video.webhook_secret = v;
        }
        if let Ok(v) = env::var("VIDEO_CORS_ORIGIN") {
            self.video.cors_origin = v;
        }

        // Telemetry overrides
        if let Ok(v) = env::var("ERROR_TRACKING_URL") {
            self.telemetry.error_tracking_url = Some(v).filter(|s| !s.trim().is_empty());
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            security: SecurityConfig {
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
                jwt_secret: "development-secret-change-me".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
            },
            invites: InviteConfig {
                expiry_days: 7,
                public_base_url: "http://localhost:5173".to_string(),
            },
            video: VideoConfig {
                api_base_url: "https://api.mux.com".to_string(),
                token_id: String::new(),
                token_secret: String::new(),
                webhook_secret: String::new(),
                cors_origin: "http://localhost:5173".to_string(),
                request_timeout_secs: 30,
            },
            telemetry: TelemetryConfig {
                error_tracking_url: None,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 1024 * 1024, // 1MB
            },
            security: SecurityConfig {
                cors_origins: vec!["https://staging.example.com".to_string()],
                // Must be supplied through JWT_SECRET
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
            },
            invites: InviteConfig {
                expiry_days: 7,
                public_base_url: "https://staging.example.com".to_string(),
            },
            video: VideoConfig {
                api_base_url: "https://api.mux.com".to_string(),
                token_id: String::new(),
                token_secret: String::new(),
                webhook_secret: String::new(),
                cors_origin: "https://staging.example.com".to_string(),
                request_timeout_secs: 15,
            },
            telemetry: TelemetryConfig {
                error_tracking_url: None,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: false,
                max_request_size_bytes: 1024 * 1024, // 1MB
            },
            security: SecurityConfig {
                cors_origins: vec!["https://app.example.com".to_string()],
                jwt_secret: String::new(),
                jwt_expiry_hours: 12,
            },
            invites: InviteConfig {
                expiry_days: 7,
                public_base_url: "https://app.example.com".to_string(),
            },
            video: VideoConfig {
                api_base_url: "https://api.mux.com".to_string(),
                token_id: String::new(),
                token_secret: String::new(),
                webhook_secret: String::new(),
                cors_origin: "https://app.example.com".to_string(),
                request_timeout_secs: 10,
            },
            telemetry: TelemetryConfig {
                error_tracking_url: None,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

// src/config.rs

use std::env;
use std::str::FromStr;

use dotenvy::dotenv;

/// Whether surveys belong to registered accounts or to a single local owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tenancy {
    Single,
    Multi,
}

impl FromStr for Tenancy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(Tenancy::Single),
            "multi" => Ok(Tenancy::Multi),
            other => Err(format!("unknown TENANCY '{other}', expected 'single' or 'multi'")),
        }
    }
}

/// Email of the owner every request acts as in single-tenant mode.
pub const LOCAL_OWNER_EMAIL: &str = "local@localhost";

/// Key under which the proforma keeps its flat response list.
pub const PROFORMA_RESPONSES_KEY: &str = "surveyResponses";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub tenancy: Tenancy,
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://survey.db?mode=rwc".to_string());

        let tenancy = match env::var("TENANCY") {
            Ok(raw) => raw.parse::<Tenancy>()?,
            Err(_) => Tenancy::Multi,
        };

        // The single-tenant owner never logs in, so a secret is only needed for accounts.
        let jwt_secret = match (env::var("JWT_SECRET"), tenancy) {
            (Ok(secret), _) => secret,
            (Err(_), Tenancy::Single) => "local-single-tenant".to_string(),
            (Err(_), Tenancy::Multi) => {
                return Err("JWT_SECRET must be set when TENANCY=multi".to_string());
            }
        };

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(86_400);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            tenancy,
            bind_addr,
        })
    }
}

use auth::JwtConfig;
use error::ConfigError;

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5000;

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Token signing secret and lifetime
    pub jwt: JwtConfig,

    /// Host to bind the HTTP listener to
    pub bind_addr: String,

    /// HTTP port
    pub port: u16,

    /// Seed the `demo` and `admin` accounts at startup
    pub seed_demo_accounts: bool,

    /// Service version
    pub version: String,
}

impl GatewayConfig {
    /// Create configuration from environment variables.
    ///
    /// `JWT_SECRET` and `JWT_EXPIRES_IN` are required.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup("JWT_SECRET").ok_or(ConfigError::MissingSecret)?;
        let expires_in = lookup("JWT_EXPIRES_IN").ok_or(ConfigError::Missing("JWT_EXPIRES_IN"))?;
        let jwt = JwtConfig::from_expires_in(&secret, &expires_in)?;

        let mut config = Self {
            jwt,
            bind_addr: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            seed_demo_accounts: true,
            version: env!("CARGO_PKG_VERSION").to_string(),
        };

        if let Some(addr) = lookup("BIND_ADDR") {
            config.bind_addr = addr;
        }

        if let Some(port) = lookup("PORT") {
            config.port = port.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: port.clone(),
            })?;
        }

        if let Some(seed) = lookup("SEED_DEMO_ACCOUNTS") {
            config.seed_demo_accounts = seed.to_lowercase() == "true" || seed == "1";
        }

        Ok(config)
    }

    /// Socket address to listen on
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup<'a>(vars: &'a HashMap<&'a str, &'a str>) -> impl Fn(&str) -> Option<String> + 'a {
        move |name| vars.get(name).map(|v| v.to_string())
    }

    #[test]
    fn test_defaults() {
        let vars = HashMap::from([("JWT_SECRET", "s3cret"), ("JWT_EXPIRES_IN", "1h")]);
        let config = GatewayConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.jwt.ttl_secs, 3600);
        assert_eq!(config.jwt.expires_in, "1h");
        assert!(config.seed_demo_accounts);
        assert_eq!(config.listen_addr(), "0.0.0.0:5000");
    }

    #[test]
    fn test_missing_secret_is_fatal() {
        let vars = HashMap::from([("JWT_EXPIRES_IN", "1h")]);
        assert_eq!(
            GatewayConfig::from_lookup(lookup(&vars)).unwrap_err(),
            ConfigError::MissingSecret
        );

        let vars = HashMap::from([("JWT_SECRET", ""), ("JWT_EXPIRES_IN", "1h")]);
        assert_eq!(
            GatewayConfig::from_lookup(lookup(&vars)).unwrap_err(),
            ConfigError::MissingSecret
        );
    }

    #[test]
    fn test_missing_ttl_is_fatal() {
        let vars = HashMap::from([("JWT_SECRET", "s3cret")]);
        assert_eq!(
            GatewayConfig::from_lookup(lookup(&vars)).unwrap_err(),
            ConfigError::Missing("JWT_EXPIRES_IN")
        );

        let vars = HashMap::from([("JWT_SECRET", "s3cret"), ("JWT_EXPIRES_IN", "soon")]);
        assert!(matches!(
            GatewayConfig::from_lookup(lookup(&vars)),
            Err(ConfigError::InvalidTtl(_))
        ));
    }

    #[test]
    fn test_overrides() {
        let vars = HashMap::from([
            ("JWT_SECRET", "s3cret"),
            ("JWT_EXPIRES_IN", "900"),
            ("PORT", "8080"),
            ("BIND_ADDR", "127.0.0.1"),
            ("SEED_DEMO_ACCOUNTS", "false"),
        ]);
        let config = GatewayConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.listen_addr(), "127.0.0.1:8080");
        assert_eq!(config.jwt.ttl_secs, 900);
        assert!(!config.seed_demo_accounts);

        let vars = HashMap::from([
            ("JWT_SECRET", "s3cret"),
            ("JWT_EXPIRES_IN", "900"),
            ("PORT", "eighty"),
        ]);
        assert!(matches!(
            GatewayConfig::from_lookup(lookup(&vars)),
            Err(ConfigError::Invalid { name: "PORT", .. })
        ));
    }
}

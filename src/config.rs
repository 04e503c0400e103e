use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub database: DatabaseConfig,
    pub media: MediaConfig,
    pub site: SiteConfig,
    pub fixtures: FixturesConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Full connection URL. Takes precedence over the MySQL parts below.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    pub root: PathBuf,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixturesConfig {
    pub ingredients: Option<PathBuf>,
    pub tags: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenv::dotenv().ok();

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("SERVER_PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .unwrap_or(8080),
            },
            auth: AuthConfig {
                jwt_secret: env::var("JWT_SECRET")
                    .unwrap_or_else(|_| "your-secret-key-change-this".to_string()),
                jwt_expiration_hours: env::var("JWT_EXPIRATION_HOURS")
                    .unwrap_or_else(|_| "24".to_string())
                    .parse()
                    .unwrap_or(24),
                bcrypt_cost: env::var("BCRYPT_COST")
                    .ok()
                    .and_then(|cost| cost.parse().ok())
                    .unwrap_or(bcrypt::DEFAULT_COST),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").ok(),
                host: env::var("MYSQL_HOST").unwrap_or_else(|_| "localhost".to_string()),
                port: env::var("MYSQL_PORT")
                    .unwrap_or_else(|_| "3306".to_string())
                    .parse()
                    .unwrap_or(3306),
                user: env::var("MYSQL_USER").unwrap_or_else(|_| "root".to_string()),
                password: env::var("MYSQL_PASSWORD").unwrap_or_else(|_| "password".to_string()),
                database: env::var("MYSQL_DATABASE").unwrap_or_else(|_| "foodgram".to_string()),
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
            },
            media: MediaConfig {
                root: env::var("MEDIA_ROOT")
                    .unwrap_or_else(|_| "media".to_string())
                    .into(),
                url: env::var("MEDIA_URL").unwrap_or_else(|_| "/media/".to_string()),
            },
            site: SiteConfig {
                url: env::var("SITE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string()),
            },
            fixtures: FixturesConfig {
                ingredients: env::var("INGREDIENTS_FIXTURE").ok().map(PathBuf::from),
                tags: env::var("TAGS_FIXTURE").ok().map(PathBuf::from),
            },
        })
    }

    pub fn database_url(&self) -> String {
        if let Some(url) = &self.database.url {
            return url.clone();
        }
        format!(
            "mysql://{}:{}@{}:{}/{}",
            self.database.user,
            self.database.password,
            self.database.host,
            self.database.port,
            self.database.database
        )
    }

    /// Public link to a recipe page on the frontend.
    pub fn recipe_link(&self, recipe_id: i32) -> String {
        format!("{}/recipes/{}/", self.site.url.trim_end_matches('/'), recipe_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_url(url: Option<&str>) -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            auth: AuthConfig {
                jwt_secret: "secret".to_string(),
                jwt_expiration_hours: 1,
                bcrypt_cost: 4,
            },
            database: DatabaseConfig {
                url: url.map(str::to_string),
                host: "db".to_string(),
                port: 3307,
                user: "chef".to_string(),
                password: "pw".to_string(),
                database: "kitchen".to_string(),
                max_connections: 1,
            },
            media: MediaConfig {
                root: "media".into(),
                url: "/media/".to_string(),
            },
            site: SiteConfig {
                url: "https://food.example/".to_string(),
            },
            fixtures: FixturesConfig::default(),
        }
    }

    #[test]
    fn database_url_is_built_from_mysql_parts() {
        let config = config_with_url(None);
        assert_eq!(config.database_url(), "mysql://chef:pw@db:3307/kitchen");
    }

    #[test]
    fn explicit_database_url_wins() {
        let config = config_with_url(Some("sqlite::memory:"));
        assert_eq!(config.database_url(), "sqlite::memory:");
    }

    #[test]
    fn recipe_link_has_single_slash() {
        let config = config_with_url(None);
        assert_eq!(config.recipe_link(7), "https://food.example/recipes/7/");
    }
}

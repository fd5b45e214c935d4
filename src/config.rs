use serde::Deserialize;

use crate::models::EdgePolicy;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// PostgreSQL connection URL. The in-memory backend is used when unset.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Redis connection URL. Similarity queries are not cached when unset.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Default threshold for similar-item queries
    #[serde(default = "default_min_similarity_score")]
    pub min_similarity_score: f64,

    /// Number of titles returned by the recommenders
    #[serde(default = "default_recommendation_limit")]
    pub recommendation_limit: usize,

    /// Whether a rebuild overwrites or keeps existing similarity edges
    #[serde(default)]
    pub edge_policy: EdgePolicy,

    /// Fixed seed for the recommendation sampler, mostly for demos
    #[serde(default)]
    pub rng_seed: Option<u64>,

    /// TTL of cached similar-item results, in seconds
    #[serde(default = "default_similar_cache_ttl")]
    pub similar_cache_ttl: u64,

    #[serde(default = "default_max_db_connections")]
    pub max_db_connections: u32,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_min_similarity_score() -> f64 {
    0.25
}

fn default_recommendation_limit() -> usize {
    5
}

fn default_similar_cache_ttl() -> u64 {
    3600 // 1 hour
}

fn default_max_db_connections() -> u32 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            redis_url: None,
            host: default_host(),
            port: default_port(),
            min_similarity_score: default_min_similarity_score(),
            recommendation_limit: default_recommendation_limit(),
            edge_policy: EdgePolicy::default(),
            rng_seed: None,
            similar_cache_ttl: default_similar_cache_ttl(),
            max_db_connections: default_max_db_connections(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=1.0).contains(&self.min_similarity_score) {
            anyhow::bail!(
                "MIN_SIMILARITY_SCORE must be within [0, 1], got {}",
                self.min_similarity_score
            );
        }
        if self.recommendation_limit == 0 {
            anyhow::bail!("RECOMMENDATION_LIMIT must be positive");
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_env() {
        let config: Config = envy::from_iter(Vec::<(String, String)>::new()).unwrap();
        assert_eq!(config.database_url, None);
        assert_eq!(config.port, 3000);
        assert_eq!(config.min_similarity_score, 0.25);
        assert_eq!(config.recommendation_limit, 5);
        assert_eq!(config.edge_policy, EdgePolicy::Refresh);
    }

    #[test]
    fn test_overrides() {
        let vars = vec![
            ("MIN_SIMILARITY_SCORE".to_string(), "0.5".to_string()),
            ("EDGE_POLICY".to_string(), "skip".to_string()),
            ("RNG_SEED".to_string(), "42".to_string()),
            ("PORT".to_string(), "8080".to_string()),
        ];
        let config: Config = envy::from_iter(vars).unwrap();
        assert_eq!(config.min_similarity_score, 0.5);
        assert_eq!(config.edge_policy, EdgePolicy::Skip);
        assert_eq!(config.rng_seed, Some(42));
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_validate_rejects_out_of_range_threshold() {
        let config = Config {
            min_similarity_score: 1.5,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}

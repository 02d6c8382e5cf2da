use std::{str::FromStr, time::Duration};

use beacon::SessionConfig;
use beacon::firestore::{DEFAULT_BASE_URL, FirestoreConfig};
use beacon::merge::DEFAULT_TOMBSTONE_TTL;
use beacon::supabase::SupabaseConfig;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value `{value}` for {name}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BackendKind {
    #[default]
    Supabase,
    Firestore,
    Memory,
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "supabase" => Ok(BackendKind::Supabase),
            "firestore" | "firebase" => Ok(BackendKind::Firestore),
            "memory" => Ok(BackendKind::Memory),
            _ => Err(ConfigError::Invalid {
                name: "ORBIT_BACKEND",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendConfig {
    Supabase(SupabaseConfig),
    Firestore(FirestoreConfig),
    Memory,
}

impl BackendConfig {
    pub fn kind(&self) -> BackendKind {
        match self {
            BackendConfig::Supabase(_) => BackendKind::Supabase,
            BackendConfig::Firestore(_) => BackendKind::Firestore,
            BackendConfig::Memory => BackendKind::Memory,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub tombstone_ttl: Duration,
}

impl AppConfig {
    /// Reads `.env` if there is one, then the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            log::debug!("No .env loaded: {e}");
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &'static str| lookup(name).filter(|value| !value.trim().is_empty());
        let require = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let kind = get("ORBIT_BACKEND")
            .map(|value| value.parse::<BackendKind>())
            .transpose()?
            .unwrap_or_default();

        let backend = match kind {
            BackendKind::Supabase => BackendConfig::Supabase(SupabaseConfig {
                supabase_url: require("SUPABASE_URL")?
                    .trim_end_matches('/')
                    .to_string(),
                supabase_anon_key: require("SUPABASE_ANON_KEY")?,
            }),
            BackendKind::Firestore => BackendConfig::Firestore(FirestoreConfig {
                project_id: require("FIREBASE_PROJECT_ID")?,
                api_key: require("FIREBASE_API_KEY")?,
                base_url: get("FIRESTORE_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            }),
            BackendKind::Memory => BackendConfig::Memory,
        };

        let tombstone_ttl = match get("ORBIT_TOMBSTONE_TTL_SECS") {
            None => DEFAULT_TOMBSTONE_TTL,
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::Invalid {
                    name: "ORBIT_TOMBSTONE_TTL_SECS",
                    value,
                })?,
        };

        Ok(Self {
            backend,
            tombstone_ttl,
        })
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            tombstone_ttl: self.tombstone_ttl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_to_supabase() {
        let config = AppConfig::from_lookup(lookup(&[
            ("SUPABASE_URL", "https://club.supabase.co/"),
            ("SUPABASE_ANON_KEY", "anon"),
        ]))
        .unwrap();

        assert_eq!(
            config.backend,
            BackendConfig::Supabase(SupabaseConfig {
                supabase_url: "https://club.supabase.co".to_string(),
                supabase_anon_key: "anon".to_string(),
            })
        );
        assert_eq!(config.tombstone_ttl, Duration::from_secs(30));
    }

    #[test]
    fn test_firestore_needs_project_and_key() {
        let result = AppConfig::from_lookup(lookup(&[
            ("ORBIT_BACKEND", "firestore"),
            ("FIREBASE_PROJECT_ID", "orbit"),
            ("FIREBASE_API_KEY", " "),
        ]));
        assert_eq!(result, Err(ConfigError::Missing("FIREBASE_API_KEY")));

        let config = AppConfig::from_lookup(lookup(&[
            ("ORBIT_BACKEND", "Firestore"),
            ("FIREBASE_PROJECT_ID", "orbit"),
            ("FIREBASE_API_KEY", "key"),
            ("ORBIT_TOMBSTONE_TTL_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.backend.kind(), BackendKind::Firestore);
        assert_eq!(config.session_config().tombstone_ttl, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_values() {
        assert_eq!(
            AppConfig::from_lookup(lookup(&[("ORBIT_BACKEND", "mongo")])),
            Err(ConfigError::Invalid {
                name: "ORBIT_BACKEND",
                value: "mongo".to_string(),
            })
        );
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[
                ("ORBIT_BACKEND", "memory"),
                ("ORBIT_TOMBSTONE_TTL_SECS", "soon"),
            ])),
            Err(ConfigError::Invalid {
                name: "ORBIT_TOMBSTONE_TTL_SECS",
                ..
            })
        ));
    }
}

// src/config/app_config.rs

use std::str::FromStr;
use thiserror::Error;

use crate::sessao::sessao_structs::SessionSettings;

/// Erros de configuração detectados na inicialização.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} é obrigatória")]
    Missing(&'static str),

    #[error("{var} inválida: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Parâmetros de conexão com o PostgreSQL.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_connections: u32,
}

/// Onde os carrinhos são guardados.
#[derive(Debug, Clone)]
pub enum StorageConfig {
    Postgres(DatabaseConfig),
    // Carrinhos somem ao reiniciar; útil para desenvolvimento local.
    InMemory,
}

/// Configuração completa da aplicação, lida de variáveis de ambiente.
///
/// Obrigatórias: `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD`, `DB_DATABASE`,
/// `SESSION_SECRET`, `SESSION_NAME`, `API_PORT`.
/// Opcionais: `STORAGE_MODE` (`postgres` | `in_memory`, padrão `postgres`; com
/// `in_memory` as variáveis `DB_*` deixam de ser exigidas), `DB_MAX_CONNECTIONS`
/// (padrão 5) e `SESSION_COOKIE_SECURE` (padrão `false`).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub session_secret: String,
    pub session_name: String,
    pub session_cookie_secure: bool,
    pub api_port: u16,
}

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Monta a configuração a partir de uma função de consulta, para não depender
    /// do ambiente do processo nos testes.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let modo = lookup("STORAGE_MODE").unwrap_or_default();
        let storage = match modo.as_str() {
            "" | "postgres" => StorageConfig::Postgres(DatabaseConfig {
                host: required(&lookup, "DB_HOST")?,
                port: parse("DB_PORT", required(&lookup, "DB_PORT")?)?,
                user: required(&lookup, "DB_USER")?,
                password: required(&lookup, "DB_PASSWORD")?,
                name: required(&lookup, "DB_DATABASE")?,
                max_connections: match optional(&lookup, "DB_MAX_CONNECTIONS") {
                    Some(valor) => parse("DB_MAX_CONNECTIONS", valor)?,
                    None => DEFAULT_MAX_CONNECTIONS,
                },
            }),
            "in_memory" => StorageConfig::InMemory,
            _ => {
                return Err(ConfigError::Invalid {
                    var: "STORAGE_MODE",
                    value: modo,
                })
            }
        };

        let session_secret = required(&lookup, "SESSION_SECRET")?;
        let session_name = required(&lookup, "SESSION_NAME")?;
        let api_port = parse("API_PORT", required(&lookup, "API_PORT")?)?;
        let session_cookie_secure = match optional(&lookup, "SESSION_COOKIE_SECURE") {
            Some(valor) => parse("SESSION_COOKIE_SECURE", valor)?,
            None => false,
        };

        Ok(Self {
            storage,
            session_secret,
            session_name,
            session_cookie_secure,
            api_port,
        })
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            cookie_name: self.session_name.clone(),
            secret: self.session_secret.clone(),
            secure: self.session_cookie_secure,
        }
    }
}

fn optional<F>(lookup: &F, var: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var).filter(|valor| !valor.is_empty())
}

fn required<F>(lookup: &F, var: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, var).ok_or(ConfigError::Missing(var))
}

fn parse<T: FromStr>(var: &'static str, valor: String) -> Result<T, ConfigError> {
    valor
        .parse()
        .map_err(|_| ConfigError::Invalid { var, value: valor })
}

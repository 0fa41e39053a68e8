// src/sessao/sessao_structs.rs

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Duração de uma sessão, contada a partir da criação (1 hora).
pub const SESSION_TTL_SECONDS: i64 = 3600;

/// Payload do JWT gravado no cookie de sessão.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sid: String,  // Identificador anônimo da sessão
    pub csrf: String, // Token esperado nos formulários POST
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flash: Option<String>, // Mensagem exibida uma única vez
    pub iat: i64,     // Criação da sessão (timestamp Unix)
    pub exp: i64,     // Expiração (timestamp Unix)
}

/// Configurações do cookie de sessão, montadas a partir da configuração da aplicação.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub cookie_name: String,
    pub secret: String,
    pub secure: bool, // Em produção, com HTTPS, deve ser true
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("falha ao assinar o cookie de sessão: {0}")]
    Encode(#[from] jsonwebtoken::errors::Error),
}

// src/config/mod.rs

// Declara o submódulo com a leitura e validação das variáveis de ambiente
pub mod app_config;

// src/main.rs

use actix_web::{middleware::Logger, web, App, HttpServer};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// Importa os módulos
//
// O Rust encontrará o arquivo `src/<modulo>/mod.rs` de cada um e, a partir dele, os submódulos.
mod carrinho; // Módulo de carrinho (regras, armazenamento e rotas)
mod catalogo; // Módulo de catálogo (tabela de preços)
mod config;   // Módulo de configuração
mod sessao;   // Módulo de sessão anônima
mod shared;   // Módulo shared

use carrinho::carrinho_memoria::InMemoryCartStore;
use carrinho::carrinho_postgres::PgCartStore;
use carrinho::carrinho_service::CartService;
use carrinho::carrinho_store::CartStore;
use catalogo::tabela_precos::{FixedCatalog, PriceLookup};
use config::app_config::{AppConfig, StorageConfig};
use sessao::sessao_structs::SessionSettings;

// Estado compartilhado entre as rotas: serviço de carrinho, catálogo e configurações da sessão.
pub struct AppState {
    pub cart_service: CartService,
    pub catalog: Arc<dyn PriceLookup>,
    pub session_settings: SessionSettings,
}

// Função principal da aplicação Actix Web.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Carrega o .env antes de configurar os logs, para que RUST_LOG possa vir dele.
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = dotenv {
        tracing::warn!(error = %e, "arquivo .env não carregado");
    }

    // Configuração inválida encerra o processo.
    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!(error = %e, "configuração inválida");
        std::io::Error::other(e)
    })?;

    let store: Arc<dyn CartStore> = match &config.storage {
        StorageConfig::Postgres(db) => {
            let store = PgCartStore::connect(db).await.map_err(|e| {
                tracing::error!(error = %e, "falha ao conectar ao PostgreSQL");
                std::io::Error::other(e)
            })?;
            tracing::info!(host = %db.host, database = %db.name, "PostgreSQL conectado e migrado");
            Arc::new(store)
        }
        StorageConfig::InMemory => {
            tracing::warn!("armazenamento em memória: os carrinhos serão perdidos ao reiniciar");
            Arc::new(InMemoryCartStore::new())
        }
    };

    // web::Data é usado para compartilhar o estado entre os workers.
    let app_state = web::Data::new(AppState {
        cart_service: CartService::new(store),
        catalog: Arc::new(FixedCatalog::default()),
        session_settings: config.session_settings(),
    });

    let porta = config.api_port;
    tracing::info!(porta, "Iniciando serviço de carrinho...");

    // Configura e inicia o servidor HTTP.
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            // .clone() é necessário porque a closure é executada uma vez por worker.
            .app_data(app_state.clone())
            .configure(carrinho::carrinho_router::configurar_rotas)
    })
    .bind(("0.0.0.0", porta))?
    .run()
    .await
}

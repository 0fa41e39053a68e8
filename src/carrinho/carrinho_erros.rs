// src/carrinho/carrinho_erros.rs

use thiserror::Error;

use super::carrinho_structs::CartStatus;

/// Erros das operações de carrinho.
///
/// `CartNotFound`, `ItemNotFound` e `SessionCartNotFound` formam a família
/// "não encontrado"; `InvalidState` indica alteração em carrinho fechado.
/// Todos são recuperáveis pelo chamador. `Infrastructure` cobre falhas do
/// banco de dados ou da transação.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("carrinho {0} não encontrado")]
    CartNotFound(i64),

    #[error("item {item_id} não encontrado no carrinho {cart_id}")]
    ItemNotFound { cart_id: i64, item_id: i64 },

    // O id da sessão não entra na mensagem para não vazar em logs.
    #[error("nenhum carrinho encontrado para a sessão")]
    SessionCartNotFound,

    #[error("carrinho {cart_id} está {status} e não aceita alterações")]
    InvalidState { cart_id: i64, status: CartStatus },

    #[error("dados inválidos: {0}")]
    Validation(String),

    #[error("falha de infraestrutura: {0}")]
    Infrastructure(String),
}

impl CartError {
    /// Indica se o erro pertence à família "não encontrado".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CartError::CartNotFound(_) | CartError::ItemNotFound { .. } | CartError::SessionCartNotFound
        )
    }
}

impl From<sqlx::Error> for CartError {
    fn from(e: sqlx::Error) -> Self {
        CartError::Infrastructure(e.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for CartError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        CartError::Infrastructure(format!("falha ao aplicar migrações: {}", e))
    }
}

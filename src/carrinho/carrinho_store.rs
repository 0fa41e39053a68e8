// src/carrinho/carrinho_store.rs

use async_trait::async_trait;

use super::carrinho_erros::CartError;
use super::carrinho_structs::{Cart, CartItem, CartMutation};

/// Armazenamento persistente de carrinhos e seus itens.
///
/// Cada método é uma unidade atômica: ou todas as gravações acontecem, ou nenhuma.
/// Carrinhos são sempre devolvidos com os itens carregados, ordenados pelo id.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Busca o carrinho `open` da sessão.
    async fn find_open_cart(&self, session_id: &str) -> Result<Option<Cart>, CartError>;

    /// Devolve o carrinho `open` da sessão, criando-o com total zero se necessário.
    /// Duas criações concorrentes para a mesma sessão resultam no mesmo carrinho.
    async fn create_open_cart(&self, session_id: &str) -> Result<Cart, CartError>;

    /// Aplica a alteração ao carrinho e recalcula o total na mesma transação.
    async fn apply_mutation(&self, cart_id: i64, mutation: CartMutation) -> Result<Cart, CartError>;

    async fn find_item(&self, cart_id: i64, item_id: i64) -> Result<Option<CartItem>, CartError>;

    /// Carrinho mais recente da sessão, em qualquer status.
    async fn find_latest_cart(&self, session_id: &str) -> Result<Option<Cart>, CartError>;

    async fn list_carts(&self) -> Result<Vec<Cart>, CartError>;
}

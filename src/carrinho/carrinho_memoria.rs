// src/carrinho/carrinho_memoria.rs

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::carrinho_erros::CartError;
use super::carrinho_store::CartStore;
use super::carrinho_structs::{Cart, CartChange, CartItem, CartMutation, CartStatus};

#[derive(Debug, Default)]
struct MemoryState {
    carts: BTreeMap<i64, Cart>,
    next_cart_id: i64,
    next_item_id: i64,
}

/// Armazenamento de carrinhos em memória, usado nos testes e com `STORAGE_MODE=in_memory`.
///
/// Um único mutex serializa as alterações. Cada alteração é aplicada sobre uma
/// cópia do carrinho, que só substitui a original se tudo der certo.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCartStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, CartError> {
        self.state
            .lock()
            .map_err(|_| CartError::Infrastructure("estado em memória corrompido".to_string()))
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn find_open_cart(&self, session_id: &str) -> Result<Option<Cart>, CartError> {
        let state = self.lock()?;
        Ok(state
            .carts
            .values()
            .find(|cart| cart.session_id == session_id && cart.is_open())
            .cloned())
    }

    async fn create_open_cart(&self, session_id: &str) -> Result<Cart, CartError> {
        let mut state = self.lock()?;

        if let Some(existente) = state
            .carts
            .values()
            .find(|cart| cart.session_id == session_id && cart.is_open())
        {
            return Ok(existente.clone());
        }

        state.next_cart_id += 1;
        let agora = Utc::now();
        let cart = Cart {
            id: state.next_cart_id,
            session_id: session_id.to_string(),
            status: CartStatus::Open,
            total: BigDecimal::from(0),
            items: Vec::new(),
            created_at: agora,
            updated_at: agora,
        };
        state.carts.insert(cart.id, cart.clone());
        Ok(cart)
    }

    async fn apply_mutation(&self, cart_id: i64, mutation: CartMutation) -> Result<Cart, CartError> {
        let mut state = self.lock()?;

        let atual = state
            .carts
            .get(&cart_id)
            .ok_or(CartError::CartNotFound(cart_id))?;
        let mudanca = atual.plan(&mutation)?;
        let mut atualizado = atual.clone();
        let agora = Utc::now();

        match mudanca {
            CartChange::InsertItem {
                product_name,
                quantity,
                unit_price,
            } => {
                state.next_item_id += 1;
                atualizado.items.push(CartItem {
                    id: state.next_item_id,
                    cart_id,
                    product_name,
                    quantity,
                    unit_price,
                    created_at: agora,
                    updated_at: agora,
                });
            }
            CartChange::SetQuantity { item_id, quantity } => {
                if let Some(item) = atualizado.items.iter_mut().find(|item| item.id == item_id) {
                    item.quantity = quantity;
                    item.updated_at = agora;
                }
            }
            CartChange::DeleteItem { item_id } => {
                atualizado.items.retain(|item| item.id != item_id);
            }
            CartChange::SetStatus(status) => {
                atualizado.status = status;
            }
        }

        atualizado.recompute_total();
        atualizado.updated_at = agora;
        state.carts.insert(cart_id, atualizado.clone());
        Ok(atualizado)
    }

    async fn find_item(&self, cart_id: i64, item_id: i64) -> Result<Option<CartItem>, CartError> {
        let state = self.lock()?;
        Ok(state
            .carts
            .get(&cart_id)
            .and_then(|cart| cart.find_item(item_id))
            .cloned())
    }

    async fn find_latest_cart(&self, session_id: &str) -> Result<Option<Cart>, CartError> {
        let state = self.lock()?;
        // BTreeMap itera em ordem de id; o último encontrado é o mais recente.
        Ok(state
            .carts
            .values()
            .rev()
            .find(|cart| cart.session_id == session_id)
            .cloned())
    }

    async fn list_carts(&self) -> Result<Vec<Cart>, CartError> {
        let state = self.lock()?;
        Ok(state.carts.values().cloned().collect())
    }
}

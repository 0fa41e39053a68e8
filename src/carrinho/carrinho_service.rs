// src/carrinho/carrinho_service.rs

use bigdecimal::BigDecimal;
use std::sync::Arc;

use super::carrinho_erros::CartError;
use super::carrinho_store::CartStore;
use super::carrinho_structs::{Cart, CartItem, CartMutation};

/// Operações de carrinho usadas pelos handlers HTTP.
///
/// Não conhece cookies nem requisições: recebe apenas o id da sessão.
#[derive(Clone)]
pub struct CartService {
    store: Arc<dyn CartStore>,
}

impl CartService {
    pub fn new(store: Arc<dyn CartStore>) -> Self {
        Self { store }
    }

    /// Busca o carrinho aberto da sessão ou cria um novo com total zero.
    pub async fn get_or_create_cart(&self, session_id: &str) -> Result<Cart, CartError> {
        if let Some(cart) = self.store.find_open_cart(session_id).await? {
            return Ok(cart);
        }

        let cart = self.store.create_open_cart(session_id).await?;
        tracing::info!(cart_id = cart.id, "carrinho criado para a sessão");
        Ok(cart)
    }

    /// Adiciona `quantity` unidades do produto ao carrinho.
    ///
    /// Se o produto já estiver no carrinho, soma a quantidade e mantém o preço
    /// unitário gravado na primeira inclusão. A quantidade é validada por `Cart::plan`.
    pub async fn add_item(
        &self,
        cart_id: i64,
        product_name: &str,
        quantity: i32,
        unit_price: BigDecimal,
    ) -> Result<Cart, CartError> {
        let mutation = CartMutation::AddItem {
            product_name: product_name.to_string(),
            quantity,
            unit_price: unit_price.clone(),
        };
        let cart = self.store.apply_mutation(cart_id, mutation).await?;

        if let Some(item) = cart.find_item_by_product(product_name) {
            if item.unit_price != unit_price {
                tracing::debug!(
                    cart_id,
                    item_id = item.id,
                    preco_gravado = %item.unit_price,
                    preco_descartado = %unit_price,
                    "produto já estava no carrinho; preço novo descartado"
                );
            }
        }

        tracing::debug!(cart_id, product_name, quantity, total = %cart.total, "item adicionado");
        Ok(cart)
    }

    pub async fn remove_item(&self, cart_id: i64, item_id: i64) -> Result<Cart, CartError> {
        let cart = self
            .store
            .apply_mutation(cart_id, CartMutation::RemoveItem { item_id })
            .await?;
        tracing::debug!(cart_id, item_id, total = %cart.total, "item removido");
        Ok(cart)
    }

    /// Fecha o carrinho; a próxima visita da sessão abre um carrinho novo.
    pub async fn close_cart(&self, cart_id: i64) -> Result<Cart, CartError> {
        let cart = self.store.apply_mutation(cart_id, CartMutation::Close).await?;
        tracing::info!(cart_id, total = %cart.total, "carrinho fechado");
        Ok(cart)
    }

    pub async fn get_item(&self, cart_id: i64, item_id: i64) -> Result<CartItem, CartError> {
        self.store
            .find_item(cart_id, item_id)
            .await?
            .ok_or(CartError::ItemNotFound { cart_id, item_id })
    }

    /// Carrinho mais recente da sessão, independente do status.
    pub async fn get_cart_by_session(&self, session_id: &str) -> Result<Cart, CartError> {
        self.store
            .find_latest_cart(session_id)
            .await?
            .ok_or(CartError::SessionCartNotFound)
    }

    pub async fn list_all_carts(&self) -> Result<Vec<Cart>, CartError> {
        self.store.list_carts().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carrinho::carrinho_memoria::InMemoryCartStore;
    use crate::carrinho::carrinho_structs::CartStatus;

    fn servico() -> CartService {
        CartService::new(Arc::new(InMemoryCartStore::new()))
    }

    fn preco(valor: i32) -> BigDecimal {
        BigDecimal::from(valor)
    }

    #[actix_web::test]
    async fn mesma_sessao_recebe_o_mesmo_carrinho() {
        let servico = servico();
        let primeiro = servico.get_or_create_cart("sessao-1").await.unwrap();
        let segundo = servico.get_or_create_cart("sessao-1").await.unwrap();

        assert_eq!(primeiro.id, segundo.id);
        assert_eq!(primeiro.status, CartStatus::Open);
        assert_eq!(primeiro.total, preco(0));
        assert!(primeiro.items.is_empty());
    }

    #[actix_web::test]
    async fn inclusoes_repetidas_somam_quantidade() {
        let servico = servico();
        let cart = servico.get_or_create_cart("sessao").await.unwrap();

        servico.add_item(cart.id, "shoe", 2, preco(10)).await.unwrap();
        servico.add_item(cart.id, "shoe", 3, preco(10)).await.unwrap();

        let cart = servico.get_cart_by_session("sessao").await.unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].product_name, "shoe");
        assert_eq!(cart.items[0].quantity, 5);
        assert_eq!(cart.total, preco(50));
    }

    #[actix_web::test]
    async fn inclusao_repetida_mantem_o_primeiro_preco() {
        let servico = servico();
        let cart = servico.get_or_create_cart("sessao").await.unwrap();

        servico.add_item(cart.id, "shoe", 1, preco(10)).await.unwrap();
        let cart = servico.add_item(cart.id, "shoe", 1, preco(15)).await.unwrap();

        assert_eq!(cart.items[0].unit_price, preco(10));
        assert_eq!(cart.total, preco(20));
    }

    #[actix_web::test]
    async fn remover_unico_item_zera_o_total() {
        let servico = servico();
        let cart = servico.get_or_create_cart("sessao").await.unwrap();
        let cart = servico.add_item(cart.id, "shoe", 1, preco(10)).await.unwrap();

        let cart = servico.remove_item(cart.id, cart.items[0].id).await.unwrap();

        assert!(cart.items.is_empty());
        assert_eq!(cart.total, preco(0));
    }

    #[actix_web::test]
    async fn incluir_em_carrinho_inexistente_falha_sem_criar_item() {
        let servico = servico();

        let erro = servico.add_item(9999, "shoe", 1, preco(10)).await.unwrap_err();

        assert!(matches!(erro, CartError::CartNotFound(9999)));
        assert!(servico.list_all_carts().await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn remover_item_inexistente_nao_altera_o_carrinho() {
        let servico = servico();
        let cart = servico.get_or_create_cart("sessao").await.unwrap();
        let antes = servico.add_item(cart.id, "bag", 2, preco(30)).await.unwrap();

        let erro = servico.remove_item(cart.id, 9999).await.unwrap_err();
        assert!(erro.is_not_found());

        let depois = servico.get_cart_by_session("sessao").await.unwrap();
        assert_eq!(depois.items.len(), antes.items.len());
        assert_eq!(depois.total, antes.total);
    }

    #[actix_web::test]
    async fn quantidade_invalida_nao_altera_o_carrinho() {
        let servico = servico();
        let cart = servico.get_or_create_cart("sessao").await.unwrap();

        for quantidade in [0, -1, 250_000_000] {
            let erro = servico
                .add_item(cart.id, "watch", quantidade, preco(40))
                .await
                .unwrap_err();
            assert!(matches!(erro, CartError::Validation(_)), "quantidade={}", quantidade);
        }

        let cart = servico.get_cart_by_session("sessao").await.unwrap();
        assert!(cart.items.is_empty());
        assert_eq!(cart.total, preco(0));
    }

    #[actix_web::test]
    async fn inclusoes_concorrentes_do_mesmo_produto_sao_todas_somadas() {
        let servico = servico();
        let cart_id = servico.get_or_create_cart("sessao").await.unwrap().id;

        let tarefas: Vec<_> = (0..50)
            .map(|_| {
                let servico = servico.clone();
                actix_web::rt::spawn(async move {
                    servico.add_item(cart_id, "shoe", 1, preco(10)).await
                })
            })
            .collect();
        for tarefa in tarefas {
            tarefa.await.unwrap().unwrap();
        }

        let cart = servico.get_cart_by_session("sessao").await.unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 50);
        assert_eq!(cart.total, preco(500));
    }

    #[actix_web::test]
    async fn primeiras_visitas_concorrentes_abrem_um_unico_carrinho() {
        let servico = servico();

        let tarefas: Vec<_> = (0..20)
            .map(|_| {
                let servico = servico.clone();
                actix_web::rt::spawn(async move { servico.get_or_create_cart("novo").await })
            })
            .collect();

        let mut ids = Vec::new();
        for tarefa in tarefas {
            ids.push(tarefa.await.unwrap().unwrap().id);
        }
        ids.sort_unstable();
        ids.dedup();

        assert_eq!(ids.len(), 1);
        assert_eq!(servico.list_all_carts().await.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn cenario_completo_da_sessao_abc() {
        let servico = servico();

        let cart = servico.get_or_create_cart("abc").await.unwrap();
        assert_eq!(cart.total, preco(0));

        let cart = servico.add_item(cart.id, "watch", 1, preco(40)).await.unwrap();
        assert_eq!(cart.total, preco(40));

        let cart = servico.add_item(cart.id, "bag", 2, preco(30)).await.unwrap();
        assert_eq!(cart.total, preco(100));

        let relogio = cart.find_item_by_product("watch").unwrap().id;
        let cart = servico.remove_item(cart.id, relogio).await.unwrap();

        assert_eq!(cart.total, preco(60));
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].product_name, "bag");
    }

    #[actix_web::test]
    async fn carrinho_fechado_recusa_alteracoes_e_sessao_ganha_outro() {
        let servico = servico();
        let cart = servico.get_or_create_cart("sessao").await.unwrap();
        let cart = servico.add_item(cart.id, "purse", 1, preco(20)).await.unwrap();
        let item_id = cart.items[0].id;

        let fechado = servico.close_cart(cart.id).await.unwrap();
        assert_eq!(fechado.status, CartStatus::Closed);

        assert!(matches!(
            servico.add_item(cart.id, "shoe", 1, preco(10)).await,
            Err(CartError::InvalidState { .. })
        ));
        assert!(matches!(
            servico.remove_item(cart.id, item_id).await,
            Err(CartError::InvalidState { .. })
        ));
        assert!(matches!(
            servico.close_cart(cart.id).await,
            Err(CartError::InvalidState { .. })
        ));

        // Leituras continuam funcionando no carrinho fechado.
        assert_eq!(servico.get_item(cart.id, item_id).await.unwrap().product_name, "purse");

        let novo = servico.get_or_create_cart("sessao").await.unwrap();
        assert_ne!(novo.id, cart.id);
        assert_eq!(servico.list_all_carts().await.unwrap().len(), 2);
    }

    #[actix_web::test]
    async fn leituras_pontuais_informam_ausencia() {
        let servico = servico();
        let cart = servico.get_or_create_cart("sessao").await.unwrap();

        assert!(matches!(
            servico.get_item(cart.id, 42).await,
            Err(CartError::ItemNotFound { item_id: 42, .. })
        ));
        assert!(matches!(
            servico.get_cart_by_session("outra").await,
            Err(CartError::SessionCartNotFound)
        ));
    }

    #[actix_web::test]
    async fn listagem_inclui_todos_os_carrinhos() {
        let servico = servico();
        assert!(servico.list_all_carts().await.unwrap().is_empty());

        let a = servico.get_or_create_cart("a").await.unwrap();
        servico.add_item(a.id, "shoe", 1, preco(10)).await.unwrap();
        let b = servico.get_or_create_cart("b").await.unwrap();
        servico.add_item(b.id, "bag", 2, preco(30)).await.unwrap();

        let todos = servico.list_all_carts().await.unwrap();
        assert_eq!(todos.len(), 2);
        assert_eq!(todos[1].total, preco(60));
    }
}

// src/carrinho/carrinho_postgres.rs

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{query, query_as, FromRow, PgConnection, PgPool};
use std::collections::HashMap;

use super::carrinho_erros::CartError;
use super::carrinho_store::CartStore;
use super::carrinho_structs::{Cart, CartChange, CartItem, CartMutation};
use crate::config::app_config::DatabaseConfig;

/// Linha da tabela `carts`, antes de carregar os itens.
#[derive(FromRow)]
struct CartRow {
    id: i64,
    session_id: String,
    status: String,
    total: BigDecimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CartRow {
    fn into_cart(self, items: Vec<CartItem>) -> Result<Cart, CartError> {
        Ok(Cart {
            id: self.id,
            session_id: self.session_id,
            status: self.status.parse()?,
            total: self.total,
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Armazenamento de carrinhos no PostgreSQL.
///
/// Itens removidos recebem `deleted_at` (soft delete) e ficam fora de todas as consultas.
#[derive(Debug, Clone)]
pub struct PgCartStore {
    pool: PgPool,
}

impl PgCartStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Abre o pool de conexões e aplica as migrações de `./migrations`.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, CartError> {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.name);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self::new(pool))
    }
}

/// Carrega os itens ativos de um carrinho, ordenados pelo id.
async fn load_items(conn: &mut PgConnection, cart_id: i64) -> Result<Vec<CartItem>, sqlx::Error> {
    query_as::<_, CartItem>(
        "SELECT id, cart_id, product_name, quantity, price AS unit_price, created_at, updated_at \
         FROM cart_items WHERE cart_id = $1 AND deleted_at IS NULL ORDER BY id",
    )
    .bind(cart_id)
    .fetch_all(conn)
    .await
}

async fn hydrate(conn: &mut PgConnection, row: Option<CartRow>) -> Result<Option<Cart>, CartError> {
    match row {
        Some(row) => {
            let items = load_items(conn, row.id).await?;
            Ok(Some(row.into_cart(items)?))
        }
        None => Ok(None),
    }
}

#[async_trait]
impl CartStore for PgCartStore {
    async fn find_open_cart(&self, session_id: &str) -> Result<Option<Cart>, CartError> {
        let mut conn = self.pool.acquire().await?;

        let row = query_as::<_, CartRow>(
            "SELECT id, session_id, status, total, created_at, updated_at FROM carts \
             WHERE session_id = $1 AND status = 'open' AND deleted_at IS NULL",
        )
        .bind(session_id)
        .fetch_optional(&mut *conn)
        .await?;

        hydrate(&mut conn, row).await
    }

    async fn create_open_cart(&self, session_id: &str) -> Result<Cart, CartError> {
        // O índice único parcial garante um único carrinho aberto por sessão;
        // se outra requisição criou primeiro, o INSERT não faz nada e lemos o dela.
        query(
            "INSERT INTO carts (session_id, status, total) VALUES ($1, 'open', 0) \
             ON CONFLICT (session_id) WHERE status = 'open' AND deleted_at IS NULL DO NOTHING",
        )
        .bind(session_id)
        .execute(&self.pool)
        .await?;

        self.find_open_cart(session_id).await?.ok_or_else(|| {
            CartError::Infrastructure("carrinho recém-criado não encontrado".to_string())
        })
    }

    /// Passos, todos dentro de uma transação:
    /// 1. Bloqueia a linha do carrinho (`FOR UPDATE`) para serializar alterações concorrentes.
    /// 2. Carrega os itens e decide a mudança com `Cart::plan`.
    /// 3. Grava a mudança.
    /// 4. Recalcula o total a partir dos itens ativos.
    /// 5. Relê o carrinho e comita.
    ///
    /// Qualquer erro antes do commit descarta a transação (rollback no drop).
    async fn apply_mutation(&self, cart_id: i64, mutation: CartMutation) -> Result<Cart, CartError> {
        let mut transaction = self.pool.begin().await?;

        let row = query_as::<_, CartRow>(
            "SELECT id, session_id, status, total, created_at, updated_at FROM carts \
             WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(cart_id)
        .fetch_optional(&mut *transaction)
        .await?;

        let cart = hydrate(&mut transaction, row)
            .await?
            .ok_or(CartError::CartNotFound(cart_id))?;

        match cart.plan(&mutation)? {
            CartChange::InsertItem {
                product_name,
                quantity,
                unit_price,
            } => {
                query(
                    "INSERT INTO cart_items (cart_id, product_name, quantity, price) \
                     VALUES ($1, $2, $3, $4)",
                )
                .bind(cart_id)
                .bind(&product_name)
                .bind(quantity)
                .bind(&unit_price)
                .execute(&mut *transaction)
                .await?;
            }
            CartChange::SetQuantity { item_id, quantity } => {
                query(
                    "UPDATE cart_items SET quantity = $1, updated_at = NOW() \
                     WHERE id = $2 AND cart_id = $3",
                )
                .bind(quantity)
                .bind(item_id)
                .bind(cart_id)
                .execute(&mut *transaction)
                .await?;
            }
            CartChange::DeleteItem { item_id } => {
                query(
                    "UPDATE cart_items SET deleted_at = NOW() \
                     WHERE id = $1 AND cart_id = $2 AND deleted_at IS NULL",
                )
                .bind(item_id)
                .bind(cart_id)
                .execute(&mut *transaction)
                .await?;
            }
            CartChange::SetStatus(status) => {
                query("UPDATE carts SET status = $1, updated_at = NOW() WHERE id = $2")
                    .bind(status.as_str())
                    .bind(cart_id)
                    .execute(&mut *transaction)
                    .await?;
            }
        }

        query(
            "UPDATE carts SET total = ( \
                 SELECT COALESCE(SUM(price * quantity), 0) FROM cart_items \
                 WHERE cart_id = $1 AND deleted_at IS NULL \
             ), updated_at = NOW() WHERE id = $1",
        )
        .bind(cart_id)
        .execute(&mut *transaction)
        .await?;

        let row = query_as::<_, CartRow>(
            "SELECT id, session_id, status, total, created_at, updated_at FROM carts WHERE id = $1",
        )
        .bind(cart_id)
        .fetch_optional(&mut *transaction)
        .await?;

        let atualizado = hydrate(&mut transaction, row)
            .await?
            .ok_or(CartError::CartNotFound(cart_id))?;

        transaction.commit().await?;

        Ok(atualizado)
    }

    async fn find_item(&self, cart_id: i64, item_id: i64) -> Result<Option<CartItem>, CartError> {
        let item = query_as::<_, CartItem>(
            "SELECT id, cart_id, product_name, quantity, price AS unit_price, created_at, updated_at \
             FROM cart_items WHERE cart_id = $1 AND id = $2 AND deleted_at IS NULL",
        )
        .bind(cart_id)
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    async fn find_latest_cart(&self, session_id: &str) -> Result<Option<Cart>, CartError> {
        let mut conn = self.pool.acquire().await?;

        let row = query_as::<_, CartRow>(
            "SELECT id, session_id, status, total, created_at, updated_at FROM carts \
             WHERE session_id = $1 AND deleted_at IS NULL ORDER BY id DESC LIMIT 1",
        )
        .bind(session_id)
        .fetch_optional(&mut *conn)
        .await?;

        hydrate(&mut conn, row).await
    }

    async fn list_carts(&self) -> Result<Vec<Cart>, CartError> {
        let rows = query_as::<_, CartRow>(
            "SELECT id, session_id, status, total, created_at, updated_at FROM carts \
             WHERE deleted_at IS NULL ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();

        // Uma única consulta para os itens de todos os carrinhos, agrupados em memória.
        let items = query_as::<_, CartItem>(
            "SELECT id, cart_id, product_name, quantity, price AS unit_price, created_at, updated_at \
             FROM cart_items WHERE cart_id = ANY($1) AND deleted_at IS NULL ORDER BY cart_id, id",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut por_carrinho: HashMap<i64, Vec<CartItem>> = HashMap::new();
        for item in items {
            por_carrinho.entry(item.cart_id).or_default().push(item);
        }

        rows.into_iter()
            .map(|row| {
                let items = por_carrinho.remove(&row.id).unwrap_or_default();
                row.into_cart(items)
            })
            .collect()
    }
}

// src/carrinho/carrinho_structs.rs

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

use super::carrinho_erros::CartError;

/// Maior quantidade aceita para um item, já somadas as inclusões repetidas.
pub const MAX_ITEM_QUANTITY: i32 = 10_000;

/// Estados de um carrinho. `Open` é o estado inicial e `Closed` é terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CartStatus {
    Open,
    Closed,
}

impl CartStatus {
    /// Representação gravada na coluna `carts.status`.
    pub fn as_str(&self) -> &'static str {
        match self {
            CartStatus::Open => "open",
            CartStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for CartStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CartStatus {
    type Err = CartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(CartStatus::Open),
            "closed" => Ok(CartStatus::Closed),
            outro => Err(CartError::Infrastructure(format!(
                "status de carrinho desconhecido: {}",
                outro
            ))),
        }
    }
}

/// Item de um carrinho.
/// O preço unitário é capturado no momento da inclusão e não é reajustado depois.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CartItem {
    pub id: i64,
    pub cart_id: i64,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CartItem {
    /// Preço unitário multiplicado pela quantidade.
    pub fn subtotal(&self) -> BigDecimal {
        &self.unit_price * &BigDecimal::from(self.quantity)
    }
}

/// Carrinho de compras ligado a uma sessão anônima.
#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    pub id: i64,
    // Não é serializado: a listagem administrativa não deve expor ids de sessão.
    #[serde(skip_serializing)]
    pub session_id: String,
    pub status: CartStatus,
    pub total: BigDecimal,
    pub items: Vec<CartItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Alteração solicitada sobre um carrinho existente.
#[derive(Debug, Clone)]
pub enum CartMutation {
    AddItem {
        product_name: String,
        quantity: i32,
        unit_price: BigDecimal,
    },
    RemoveItem {
        item_id: i64,
    },
    Close,
}

/// Mudança concreta que o armazenamento precisa gravar para aplicar uma `CartMutation`.
#[derive(Debug, Clone, PartialEq)]
pub enum CartChange {
    InsertItem {
        product_name: String,
        quantity: i32,
        unit_price: BigDecimal,
    },
    SetQuantity {
        item_id: i64,
        quantity: i32,
    },
    DeleteItem {
        item_id: i64,
    },
    SetStatus(CartStatus),
}

impl Cart {
    pub fn is_open(&self) -> bool {
        self.status == CartStatus::Open
    }

    pub fn find_item(&self, item_id: i64) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    pub fn find_item_by_product(&self, product_name: &str) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product_name == product_name)
    }

    /// Soma de (preço unitário × quantidade) de todos os itens; zero quando vazio.
    pub fn compute_total(&self) -> BigDecimal {
        self.items
            .iter()
            .fold(BigDecimal::from(0), |acumulado, item| acumulado + item.subtotal())
    }

    pub fn recompute_total(&mut self) {
        self.total = self.compute_total();
    }

    /// Decide qual mudança aplicar para a alteração solicitada, sem modificar o carrinho.
    ///
    /// Regras:
    /// 1. Toda alteração exige carrinho `open`.
    /// 2. Inclusão de produto já presente soma a quantidade e mantém o preço gravado;
    ///    o preço informado na nova chamada é descartado.
    /// 3. Remoção exige que o item pertença a este carrinho.
    pub fn plan(&self, mutation: &CartMutation) -> Result<CartChange, CartError> {
        if !self.is_open() {
            return Err(CartError::InvalidState {
                cart_id: self.id,
                status: self.status,
            });
        }

        match mutation {
            CartMutation::AddItem {
                product_name,
                quantity,
                unit_price,
            } => {
                if !(1..=MAX_ITEM_QUANTITY).contains(quantity) {
                    return Err(CartError::Validation(format!(
                        "quantidade deve estar entre 1 e {}, recebido {}",
                        MAX_ITEM_QUANTITY, quantity
                    )));
                }

                match self.find_item_by_product(product_name) {
                    Some(existente) => {
                        let nova_quantidade = existente
                            .quantity
                            .checked_add(*quantity)
                            .filter(|total| *total <= MAX_ITEM_QUANTITY)
                            .ok_or_else(|| {
                                CartError::Validation(format!(
                                    "quantidade de {} excede o limite de {}",
                                    product_name, MAX_ITEM_QUANTITY
                                ))
                            })?;
                        Ok(CartChange::SetQuantity {
                            item_id: existente.id,
                            quantity: nova_quantidade,
                        })
                    }
                    None => Ok(CartChange::InsertItem {
                        product_name: product_name.clone(),
                        quantity: *quantity,
                        unit_price: unit_price.clone(),
                    }),
                }
            }
            CartMutation::RemoveItem { item_id } => match self.find_item(*item_id) {
                Some(item) => Ok(CartChange::DeleteItem { item_id: item.id }),
                None => Err(CartError::ItemNotFound {
                    cart_id: self.id,
                    item_id: *item_id,
                }),
            },
            CartMutation::Close => Ok(CartChange::SetStatus(CartStatus::Closed)),
        }
    }
}

/// Dados do formulário `POST /add-item`.
/// Os campos são texto livre e são validados no handler.
#[derive(Debug, Deserialize)]
pub struct AddItemForm {
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub csrf_token: String,
}

/// Dados do formulário `POST /remove-item`.
#[derive(Debug, Deserialize)]
pub struct RemoveItemForm {
    #[serde(default)]
    pub cart_item_id: String,
    #[serde(default)]
    pub csrf_token: String,
}

/// Dados do formulário `POST /close-cart`.
#[derive(Debug, Deserialize)]
pub struct CloseCartForm {
    #[serde(default)]
    pub csrf_token: String,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn item(id: i64, cart_id: i64, produto: &str, quantidade: i32, preco: i32) -> CartItem {
        let agora = Utc::now();
        CartItem {
            id,
            cart_id,
            product_name: produto.to_string(),
            quantity: quantidade,
            unit_price: BigDecimal::from(preco),
            created_at: agora,
            updated_at: agora,
        }
    }

    pub(crate) fn carrinho(itens: Vec<CartItem>) -> Cart {
        let agora = Utc::now();
        let mut carrinho = Cart {
            id: 1,
            session_id: "sessao".to_string(),
            status: CartStatus::Open,
            total: BigDecimal::from(0),
            items: itens,
            created_at: agora,
            updated_at: agora,
        };
        carrinho.recompute_total();
        carrinho
    }

    fn adicionar(produto: &str, quantidade: i32, preco: i32) -> CartMutation {
        CartMutation::AddItem {
            product_name: produto.to_string(),
            quantity: quantidade,
            unit_price: BigDecimal::from(preco),
        }
    }

    #[test]
    fn total_de_carrinho_vazio_e_zero() {
        assert_eq!(carrinho(vec![]).compute_total(), BigDecimal::from(0));
    }

    #[test]
    fn total_soma_preco_vezes_quantidade() {
        let c = carrinho(vec![item(1, 1, "watch", 1, 40), item(2, 1, "bag", 2, 30)]);
        assert_eq!(c.total, BigDecimal::from(100));
    }

    #[test]
    fn produto_novo_gera_insercao() {
        let c = carrinho(vec![]);
        let mudanca = c.plan(&adicionar("shoe", 2, 10)).unwrap();
        assert_eq!(
            mudanca,
            CartChange::InsertItem {
                product_name: "shoe".to_string(),
                quantity: 2,
                unit_price: BigDecimal::from(10),
            }
        );
    }

    #[test]
    fn produto_repetido_soma_quantidade_e_descarta_preco_novo() {
        let c = carrinho(vec![item(5, 1, "shoe", 2, 10)]);
        let mudanca = c.plan(&adicionar("shoe", 3, 99)).unwrap();
        assert_eq!(mudanca, CartChange::SetQuantity { item_id: 5, quantity: 5 });
    }

    #[test]
    fn quantidade_menor_que_um_e_rejeitada() {
        let c = carrinho(vec![]);
        assert!(matches!(c.plan(&adicionar("shoe", 0, 10)), Err(CartError::Validation(_))));
        assert!(matches!(c.plan(&adicionar("shoe", -3, 10)), Err(CartError::Validation(_))));
    }

    #[test]
    fn soma_que_estoura_i32_e_rejeitada() {
        let c = carrinho(vec![item(5, 1, "shoe", i32::MAX, 10)]);
        assert!(matches!(c.plan(&adicionar("shoe", 1, 10)), Err(CartError::Validation(_))));
    }

    #[test]
    fn quantidade_acima_do_limite_e_rejeitada() {
        let vazio = carrinho(vec![]);
        assert!(vazio.plan(&adicionar("watch", MAX_ITEM_QUANTITY, 40)).is_ok());
        assert!(matches!(
            vazio.plan(&adicionar("watch", 250_000_000, 40)),
            Err(CartError::Validation(_))
        ));

        // O limite vale também para a soma das inclusões
        let c = carrinho(vec![item(5, 1, "watch", MAX_ITEM_QUANTITY - 1, 40)]);
        assert_eq!(
            c.plan(&adicionar("watch", 1, 40)).unwrap(),
            CartChange::SetQuantity { item_id: 5, quantity: MAX_ITEM_QUANTITY }
        );
        assert!(matches!(c.plan(&adicionar("watch", 2, 40)), Err(CartError::Validation(_))));
    }

    #[test]
    fn remocao_de_item_inexistente_e_nao_encontrado() {
        let c = carrinho(vec![item(5, 1, "shoe", 1, 10)]);
        let erro = c.plan(&CartMutation::RemoveItem { item_id: 9999 }).unwrap_err();
        assert!(matches!(erro, CartError::ItemNotFound { cart_id: 1, item_id: 9999 }));
    }

    #[test]
    fn carrinho_fechado_nao_aceita_alteracoes() {
        let mut c = carrinho(vec![item(5, 1, "shoe", 1, 10)]);
        c.status = CartStatus::Closed;

        for mutacao in [
            adicionar("bag", 1, 30),
            CartMutation::RemoveItem { item_id: 5 },
            CartMutation::Close,
        ] {
            assert!(matches!(
                c.plan(&mutacao),
                Err(CartError::InvalidState { cart_id: 1, status: CartStatus::Closed })
            ));
        }
    }

    #[test]
    fn fechar_carrinho_aberto() {
        let c = carrinho(vec![]);
        assert_eq!(c.plan(&CartMutation::Close).unwrap(), CartChange::SetStatus(CartStatus::Closed));
    }

    #[test]
    fn status_lido_do_banco() {
        assert_eq!("open".parse::<CartStatus>().unwrap(), CartStatus::Open);
        assert_eq!("closed".parse::<CartStatus>().unwrap(), CartStatus::Closed);
        assert!("pending".parse::<CartStatus>().is_err());
    }
}

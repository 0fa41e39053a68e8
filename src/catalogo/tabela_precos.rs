// src/catalogo/tabela_precos.rs

use bigdecimal::BigDecimal;
use std::collections::BTreeMap;

/// Consulta de preços de produtos.
///
/// Os handlers dependem apenas desta trait; a origem dos preços pode ser trocada
/// sem mexer nas regras do carrinho.
pub trait PriceLookup: Send + Sync {
    /// Preço unitário do produto, ou `None` se ele não existir no catálogo.
    fn price_of(&self, product: &str) -> Option<BigDecimal>;

    /// Nomes oferecidos na página do carrinho. Vazio por padrão.
    fn product_names(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Tabela de preços fixa, mantida em memória.
#[derive(Debug, Clone)]
pub struct FixedCatalog {
    prices: BTreeMap<String, BigDecimal>,
}

impl FixedCatalog {
    pub fn new<I>(prices: I) -> Self
    where
        I: IntoIterator<Item = (String, BigDecimal)>,
    {
        Self {
            prices: prices.into_iter().collect(),
        }
    }
}

impl Default for FixedCatalog {
    /// shoe = 10.00, purse = 20.00, bag = 30.00, watch = 40.00
    fn default() -> Self {
        Self::new(
            [("shoe", 10), ("purse", 20), ("bag", 30), ("watch", 40)]
                .into_iter()
                .map(|(nome, preco)| (nome.to_string(), BigDecimal::from(preco).with_scale(2))),
        )
    }
}

impl PriceLookup for FixedCatalog {
    fn price_of(&self, product: &str) -> Option<BigDecimal> {
        self.prices.get(product).cloned()
    }

    fn product_names(&self) -> Vec<String> {
        self.prices.keys().cloned().collect()
    }
}

/// Normaliza o nome de produto vindo do formulário antes da consulta ao catálogo.
///
/// Letras `A-Z` viram minúsculas; só `[a-z0-9_]` é mantido, o resto é descartado.
pub fn sanitize_product_name(raw: &str) -> String {
    raw.chars()
        .filter_map(|c| match c {
            'a'..='z' | '0'..='9' | '_' => Some(c),
            'A'..='Z' => Some(c.to_ascii_lowercase()),
            _ => None,
        })
        .collect()
}

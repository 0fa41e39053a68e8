// src/catalogo/mod.rs

// Declara o submódulo com a tabela de preços e a sanitização de nomes de produto
pub mod tabela_precos;

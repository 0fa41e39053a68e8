// src/carrinho/mod.rs

// Declara o submódulo com as structs do carrinho e as regras de alteração
pub mod carrinho_structs;
// Declara o submódulo com os erros das operações de carrinho
pub mod carrinho_erros;
// Declara a trait de armazenamento e suas implementações
pub mod carrinho_store;
pub mod carrinho_postgres;
pub mod carrinho_memoria;
// Declara o submódulo com as operações de carrinho usadas pelos handlers
pub mod carrinho_service;
// Declara o submódulo com as rotas HTTP e a página HTML
pub mod carrinho_router;
pub mod carrinho_view;

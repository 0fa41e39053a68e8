// src/sessao/mod.rs

// Declara o submódulo com as structs da sessão (claims e configurações do cookie)
pub mod sessao_structs;
// Declara o submódulo com o extrator de sessão das requisições
pub mod sessao_middleware;

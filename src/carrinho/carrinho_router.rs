// src/carrinho/carrinho_router.rs

use actix_web::{get, http::header, post, web, HttpResponse, HttpResponseBuilder};

// Importa o AppState do módulo raiz (main.rs)
use crate::AppState;
// Importa a sanitização de nomes de produto do catálogo
use crate::catalogo::tabela_precos::sanitize_product_name;
// Importa o extrator de sessão
use crate::sessao::sessao_middleware::SessionContext;
// Importa GenericResponse do módulo shared_structs
use crate::shared::shared_structs::GenericResponse;
// Importa as structs e a página do carrinho
use super::carrinho_structs::{AddItemForm, CloseCartForm, RemoveItemForm, MAX_ITEM_QUANTITY};
use super::carrinho_view::{render_cart_page, CartPage};

// Mensagens exibidas ao usuário. Nunca incluem detalhes internos do erro.
pub const MSG_SELECIONE_PRODUTO: &str = "Selecione um produto.";
pub const MSG_PRODUTO_INVALIDO: &str = "Produto inválido.";
pub const MSG_INFORME_QUANTIDADE: &str = "Informe a quantidade.";
pub const MSG_QUANTIDADE_INVALIDA: &str = "A quantidade deve ser um número entre 1 e 10000.";
pub const MSG_FALHA_CARREGAR: &str = "Falha ao carregar o carrinho.";
pub const MSG_FALHA_ADICIONAR: &str = "Falha ao adicionar o item ao carrinho.";
pub const MSG_ITEM_INVALIDO: &str = "Item inválido.";
pub const MSG_CARRINHO_NAO_ENCONTRADO: &str = "Carrinho não encontrado.";
pub const MSG_ITEM_NAO_ENCONTRADO: &str = "Item não encontrado.";
pub const MSG_FALHA_REMOVER: &str = "Falha ao remover o item do carrinho.";
pub const MSG_FALHA_FECHAR: &str = "Falha ao fechar o carrinho.";

/// Registra as rotas do carrinho. Usado pelo `main` e pelos testes.
pub fn configurar_rotas(cfg: &mut web::ServiceConfig) {
    cfg.service(ver_carrinho)
        .service(adicionar_item)
        .service(remover_item)
        .service(fechar_carrinho)
        .service(listar_carrinhos);
}

/// Grava a sessão (assinada) no cookie da resposta.
fn anexar_sessao(resposta: &mut HttpResponseBuilder, data: &AppState, sessao: &SessionContext) {
    match sessao.to_cookie(&data.session_settings) {
        Ok(cookie) => {
            resposta.cookie(cookie);
        }
        Err(e) => tracing::error!(error = %e, "falha ao gravar o cookie de sessão"),
    }
}

/// Redireciona para `/`, que é o destino de toda requisição POST.
fn redirecionar(data: &AppState, sessao: &SessionContext) -> HttpResponse {
    let mut resposta = HttpResponse::Found();
    resposta.insert_header((header::LOCATION, "/"));
    anexar_sessao(&mut resposta, data, sessao);
    resposta.finish()
}

fn redirecionar_com_flash(data: &AppState, mut sessao: SessionContext, mensagem: &str) -> HttpResponse {
    sessao.set_flash(mensagem);
    redirecionar(data, &sessao)
}

fn csrf_invalido() -> HttpResponse {
    tracing::warn!("requisição recusada: token CSRF inválido");
    HttpResponse::Forbidden().body("Token CSRF inválido.")
}

/// Rota que exibe o carrinho da sessão, criando-o na primeira visita.
#[get("/")]
pub async fn ver_carrinho(data: web::Data<AppState>, mut sessao: SessionContext) -> HttpResponse {
    if sessao.is_new() {
        tracing::debug!("nova sessão iniciada");
    }

    // A mensagem flash é consumida aqui e some do cookie regravado abaixo
    let mut erro = sessao.take_flash();

    let carrinho = match data.cart_service.get_or_create_cart(sessao.session_id()).await {
        Ok(carrinho) => Some(carrinho),
        Err(e) => {
            tracing::error!(error = %e, "falha ao carregar o carrinho");
            erro = Some(MSG_FALHA_CARREGAR.to_string());
            None
        }
    };

    let produtos = data.catalog.product_names();
    let html = render_cart_page(&CartPage {
        error: erro.as_deref(),
        cart: carrinho.as_ref(),
        csrf_token: sessao.csrf_token(),
        products: &produtos,
    });

    let mut resposta = HttpResponse::Ok();
    resposta
        .content_type("text/html; charset=utf-8")
        .insert_header(("X-CSRF-Token", sessao.csrf_token()));
    anexar_sessao(&mut resposta, &data, &sessao);
    resposta.body(html)
}

/// Rota para adicionar um produto do catálogo ao carrinho.
///
/// Passos:
/// 1. Confere o token CSRF.
/// 2. Sanitiza o nome do produto e busca o preço no catálogo.
/// 3. Valida a quantidade.
/// 4. Busca (ou cria) o carrinho da sessão e adiciona o item.
///
/// Qualquer falha vira uma mensagem flash; a resposta é sempre um redirecionamento para `/`.
#[post("/add-item")]
pub async fn adicionar_item(
    data: web::Data<AppState>,
    sessao: SessionContext,
    form: web::Form<AddItemForm>,
) -> HttpResponse {
    if !sessao.verify_csrf(&form.csrf_token) {
        return csrf_invalido();
    }

    let produto = sanitize_product_name(&form.product);
    if produto.is_empty() {
        return redirecionar_com_flash(&data, sessao, MSG_SELECIONE_PRODUTO);
    }

    let preco = match data.catalog.price_of(&produto) {
        Some(preco) => preco,
        None => return redirecionar_com_flash(&data, sessao, MSG_PRODUTO_INVALIDO),
    };

    if form.quantity.is_empty() {
        return redirecionar_com_flash(&data, sessao, MSG_INFORME_QUANTIDADE);
    }

    let quantidade = match form.quantity.parse::<i32>() {
        Ok(quantidade) if (1..=MAX_ITEM_QUANTITY).contains(&quantidade) => quantidade,
        _ => return redirecionar_com_flash(&data, sessao, MSG_QUANTIDADE_INVALIDA),
    };

    let carrinho = match data.cart_service.get_or_create_cart(sessao.session_id()).await {
        Ok(carrinho) => carrinho,
        Err(e) => {
            tracing::error!(error = %e, "falha ao carregar o carrinho para inclusão");
            return redirecionar_com_flash(&data, sessao, MSG_FALHA_CARREGAR);
        }
    };

    if let Err(e) = data
        .cart_service
        .add_item(carrinho.id, &produto, quantidade, preco)
        .await
    {
        tracing::warn!(cart_id = carrinho.id, error = %e, "falha ao adicionar item");
        return redirecionar_com_flash(&data, sessao, MSG_FALHA_ADICIONAR);
    }

    redirecionar(&data, &sessao)
}

/// Rota para remover um item do carrinho da sessão.
#[post("/remove-item")]
pub async fn remover_item(
    data: web::Data<AppState>,
    sessao: SessionContext,
    form: web::Form<RemoveItemForm>,
) -> HttpResponse {
    if !sessao.verify_csrf(&form.csrf_token) {
        return csrf_invalido();
    }

    let item_id = match form.cart_item_id.parse::<i64>() {
        Ok(id) => id,
        Err(_) => return redirecionar_com_flash(&data, sessao, MSG_ITEM_INVALIDO),
    };

    let carrinho = match data.cart_service.get_cart_by_session(sessao.session_id()).await {
        Ok(carrinho) => carrinho,
        Err(e) => {
            if !e.is_not_found() {
                tracing::error!(error = %e, "falha ao buscar o carrinho da sessão");
            }
            return redirecionar_com_flash(&data, sessao, MSG_CARRINHO_NAO_ENCONTRADO);
        }
    };

    // O item precisa pertencer ao carrinho desta sessão
    if let Err(e) = data.cart_service.get_item(carrinho.id, item_id).await {
        tracing::debug!(cart_id = carrinho.id, item_id, error = %e, "item não encontrado");
        return redirecionar_com_flash(&data, sessao, MSG_ITEM_NAO_ENCONTRADO);
    }

    if let Err(e) = data.cart_service.remove_item(carrinho.id, item_id).await {
        tracing::warn!(cart_id = carrinho.id, item_id, error = %e, "falha ao remover item");
        return redirecionar_com_flash(&data, sessao, MSG_FALHA_REMOVER);
    }

    redirecionar(&data, &sessao)
}

/// Rota para fechar o carrinho da sessão. A próxima visita abre um carrinho novo.
#[post("/close-cart")]
pub async fn fechar_carrinho(
    data: web::Data<AppState>,
    sessao: SessionContext,
    form: web::Form<CloseCartForm>,
) -> HttpResponse {
    if !sessao.verify_csrf(&form.csrf_token) {
        return csrf_invalido();
    }

    let carrinho = match data.cart_service.get_cart_by_session(sessao.session_id()).await {
        Ok(carrinho) => carrinho,
        Err(e) => {
            if !e.is_not_found() {
                tracing::error!(error = %e, "falha ao buscar o carrinho da sessão");
            }
            return redirecionar_com_flash(&data, sessao, MSG_CARRINHO_NAO_ENCONTRADO);
        }
    };

    if let Err(e) = data.cart_service.close_cart(carrinho.id).await {
        tracing::warn!(cart_id = carrinho.id, error = %e, "falha ao fechar carrinho");
        return redirecionar_com_flash(&data, sessao, MSG_FALHA_FECHAR);
    }

    redirecionar(&data, &sessao)
}

/// Rota administrativa que lista todos os carrinhos em JSON.
#[get("/carts")]
pub async fn listar_carrinhos(data: web::Data<AppState>) -> HttpResponse {
    match data.cart_service.list_all_carts().await {
        Ok(carrinhos) => {
            HttpResponse::Ok().json(GenericResponse::success("Carrinhos cadastrados", carrinhos))
        }
        Err(e) => {
            tracing::error!(error = %e, "falha ao listar carrinhos");
            HttpResponse::InternalServerError()
                .json(GenericResponse::error("Erro ao listar carrinhos"))
        }
    }
}

// src/carrinho/carrinho_view.rs

use super::carrinho_structs::Cart;

/// Dados usados para montar a página do carrinho.
pub struct CartPage<'a> {
    pub error: Option<&'a str>,
    pub cart: Option<&'a Cart>,
    pub csrf_token: &'a str,
    pub products: &'a [String],
}

/// Escapa texto para uso em HTML, inclusive dentro de atributos.
pub fn escape_html(texto: &str) -> String {
    let mut saida = String::with_capacity(texto.len());
    for c in texto.chars() {
        match c {
            '&' => saida.push_str("&amp;"),
            '<' => saida.push_str("&lt;"),
            '>' => saida.push_str("&gt;"),
            '"' => saida.push_str("&quot;"),
            '\'' => saida.push_str("&#39;"),
            _ => saida.push(c),
        }
    }
    saida
}

fn campo_csrf(token: &str) -> String {
    format!(
        r#"<input type="hidden" name="csrf_token" value="{}">"#,
        escape_html(token)
    )
}

/// Renderiza a página do carrinho.
///
/// Todo texto variável passa por `escape_html`.
pub fn render_cart_page(page: &CartPage<'_>) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html lang=\"pt-BR\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Carrinho</title>\n</head>\n<body>\n<h1>Carrinho de compras</h1>\n",
    );

    if let Some(erro) = page.error {
        html.push_str(&format!(
            "<p class=\"error\" role=\"alert\">{}</p>\n",
            escape_html(erro)
        ));
    }

    // Formulário de inclusão
    html.push_str("<form method=\"post\" action=\"/add-item\">\n");
    html.push_str(&campo_csrf(page.csrf_token));
    html.push_str("\n<select name=\"product\">\n<option value=\"\">Selecione</option>\n");
    for produto in page.products {
        let nome = escape_html(produto);
        html.push_str(&format!("<option value=\"{0}\">{0}</option>\n", nome));
    }
    html.push_str(
        "</select>\n<input type=\"number\" name=\"quantity\" min=\"1\" value=\"1\">\n\
         <button type=\"submit\">Adicionar</button>\n</form>\n",
    );

    match page.cart {
        Some(cart) if !cart.items.is_empty() => {
            html.push_str(
                "<table>\n<thead><tr><th>Produto</th><th>Quantidade</th>\
                 <th>Preço unitário</th><th>Subtotal</th><th></th></tr></thead>\n<tbody>\n",
            );
            for item in &cart.items {
                html.push_str(&format!(
                    "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>\
                     <form method=\"post\" action=\"/remove-item\">{}\
                     <input type=\"hidden\" name=\"cart_item_id\" value=\"{}\">\
                     <button type=\"submit\">Remover</button></form></td></tr>\n",
                    escape_html(&item.product_name),
                    item.quantity,
                    item.unit_price.with_scale(2),
                    item.subtotal().with_scale(2),
                    campo_csrf(page.csrf_token),
                    item.id,
                ));
            }
            html.push_str(&format!(
                "</tbody>\n</table>\n<p class=\"total\">Total: {}</p>\n",
                cart.total.with_scale(2)
            ));
            html.push_str("<form method=\"post\" action=\"/close-cart\">\n");
            html.push_str(&campo_csrf(page.csrf_token));
            html.push_str("\n<button type=\"submit\">Fechar carrinho</button>\n</form>\n");
        }
        _ => html.push_str("<p class=\"empty\">Seu carrinho está vazio.</p>\n"),
    }

    html.push_str("</body>\n</html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carrinho::carrinho_structs::tests::{carrinho, item};

    #[test]
    fn escapa_caracteres_especiais() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
        assert_eq!(escape_html("Produto inválido."), "Produto inválido.");
    }

    #[test]
    fn pagina_lista_itens_total_e_token() {
        let c = carrinho(vec![item(3, 1, "watch", 1, 40), item(4, 1, "bag", 2, 30)]);
        let produtos = vec!["bag".to_string(), "watch".to_string()];
        let html = render_cart_page(&CartPage {
            error: None,
            cart: Some(&c),
            csrf_token: "tok123",
            products: &produtos,
        });

        assert!(html.contains("<td>watch</td><td>1</td><td>40.00</td><td>40.00</td>"));
        assert!(html.contains("<td>bag</td><td>2</td><td>30.00</td><td>60.00</td>"));
        assert!(html.contains("name=\"cart_item_id\" value=\"4\""));
        assert!(html.contains("Total: 100.00"));
        assert!(html.contains("name=\"csrf_token\" value=\"tok123\""));
        assert!(html.contains("<option value=\"watch\">watch</option>"));
        assert!(!html.contains("class=\"error\""));
    }

    #[test]
    fn pagina_vazia_mostra_erro_escapado() {
        let html = render_cart_page(&CartPage {
            error: Some("<b>falhou</b>"),
            cart: None,
            csrf_token: "tok",
            products: &[],
        });

        assert!(html.contains("&lt;b&gt;falhou&lt;/b&gt;"));
        assert!(html.contains("Seu carrinho está vazio."));
        assert!(!html.contains("Total:"));
    }
}

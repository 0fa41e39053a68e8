// src/sessao/sessao_middleware.rs

use actix_web::{
    cookie::{time::Duration, Cookie, SameSite},
    dev::Payload,
    error::ErrorInternalServerError,
    web, FromRequest, HttpRequest,
};
use chrono::Utc;
use futures::future::{ready, Ready};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;

// Importa as structs da sessão
use super::sessao_structs::{SessionClaims, SessionError, SessionSettings, SESSION_TTL_SECONDS};
// Importa o AppState do módulo raiz (main.rs)
use crate::AppState;

/// Sessão anônima da requisição.
///
/// Os handlers recebem este contexto e passam só o `session_id` para o serviço
/// de carrinho. Alterações (flash) só chegam ao navegador quando o handler grava
/// o cookie de volta com `to_cookie`.
#[derive(Debug, Clone)]
pub struct SessionContext {
    claims: SessionClaims,
    is_new: bool,
}

/// 32 bytes aleatórios em hexadecimal.
fn random_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Comparação em tempo constante para o token CSRF.
fn constant_time_eq(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a
            .bytes()
            .zip(b.bytes())
            .fold(0u8, |acumulado, (x, y)| acumulado | (x ^ y))
            == 0
}

impl SessionContext {
    /// Cria uma sessão nova, com id e token CSRF aleatórios.
    pub fn fresh(now: i64) -> Self {
        Self {
            claims: SessionClaims {
                sid: random_token(),
                csrf: random_token(),
                flash: None,
                iat: now,
                exp: now + SESSION_TTL_SECONDS,
            },
            is_new: true,
        }
    }

    /// Decodifica e valida o valor do cookie. Assinatura inválida ou sessão expirada
    /// devolvem `None`.
    pub fn from_token(token: &str, settings: &SessionSettings) -> Option<Self> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        match decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(settings.secret.as_ref()),
            &validation,
        ) {
            Ok(data) => Some(Self {
                claims: data.claims,
                is_new: false,
            }),
            Err(e) => {
                tracing::debug!(error = %e, "cookie de sessão descartado");
                None
            }
        }
    }

    pub fn session_id(&self) -> &str {
        &self.claims.sid
    }

    pub fn csrf_token(&self) -> &str {
        &self.claims.csrf
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Guarda uma mensagem para a próxima página renderizada.
    pub fn set_flash(&mut self, message: impl Into<String>) {
        self.claims.flash = Some(message.into());
    }

    /// Consome a mensagem pendente, se houver.
    pub fn take_flash(&mut self) -> Option<String> {
        self.claims.flash.take()
    }

    pub fn verify_csrf(&self, candidate: &str) -> bool {
        !candidate.is_empty() && constant_time_eq(candidate, &self.claims.csrf)
    }

    /// Assina a sessão e monta o cookie. O Max-Age acompanha a expiração original,
    /// então regravar o cookie não prolonga a sessão.
    pub fn to_cookie(&self, settings: &SessionSettings) -> Result<Cookie<'static>, SessionError> {
        let token = encode(
            &Header::new(Algorithm::HS256),
            &self.claims,
            &EncodingKey::from_secret(settings.secret.as_ref()),
        )?;

        let restante = (self.claims.exp - Utc::now().timestamp()).max(0);

        Ok(Cookie::build(settings.cookie_name.clone(), token)
            .path("/")
            .http_only(true)
            .secure(settings.secure)
            .same_site(SameSite::Lax)
            .max_age(Duration::seconds(restante))
            .finish())
    }
}

/// Extrator de sessão para Actix Web.
/// Lê o cookie configurado; se ele faltar, for inválido ou tiver expirado, começa
/// uma sessão nova.
impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        // Acessa o AppState para obter o nome do cookie e a chave de assinatura
        let settings = match req.app_data::<web::Data<AppState>>() {
            Some(state) => &state.session_settings,
            None => {
                tracing::error!("AppState não disponível no extrator de sessão");
                return ready(Err(ErrorInternalServerError("Erro de configuração do servidor.")));
            }
        };

        let sessao = req
            .cookie(&settings.cookie_name)
            .and_then(|cookie| SessionContext::from_token(cookie.value(), settings))
            .unwrap_or_else(|| SessionContext::fresh(Utc::now().timestamp()));

        ready(Ok(sessao))
    }
}

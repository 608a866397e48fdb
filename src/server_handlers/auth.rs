use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use super::autenticar;
use crate::auth::login;
use crate::error::AppResult;
use crate::server::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

/// POST /auth/login
pub async fn login_handler(state: web::Data<AppState>, body: web::Json<LoginRequest>) -> AppResult<HttpResponse> {
    let LoginRequest { email, password } = body.into_inner();
    let st = state.clone();
    let (token, usuario) = web::block(move || {
        let millis = st.reloj.ahora().and_utc().timestamp_millis();
        login(st.almacen.as_ref(), &email, &password, millis)
    })
    .await??;
    Ok(HttpResponse::Ok().json(json!({"token": token, "usuario": usuario})))
}

/// GET /auth/me
pub async fn me_handler(req: HttpRequest, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let usuario = autenticar(&req, &state).await?;
    Ok(HttpResponse::Ok().json(json!({"usuario": usuario})))
}

// src/common/json.rs

use axum::extract::{FromRequest, FromRequestParts};

use crate::common::error::AppError;

/// `Json` com a rejeição convertida em `AppError`, para que JSON malformado
/// passe pela mesma tradução de erros que o resto da API (400 com corpo JSON).
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// `Path` com a mesma tradução: um id malformado vira 400 com corpo JSON.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

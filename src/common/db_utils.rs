// src/common/db_utils.rs

use crate::common::error::AppError;

/// Nome da constraint/índice único violado, se o erro for uma violação de unicidade.
pub(crate) fn unique_violation(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            db_err.constraint().or(Some(""))
        }
        _ => None,
    }
}

/// Converte violações de unicidade em erros de domínio; o resto vira `DatabaseError`.
pub(crate) fn map_unique_violation(err: sqlx::Error, map: impl FnOnce(&str) -> AppError) -> AppError {
    let mapped = unique_violation(&err).map(map);
    mapped.unwrap_or_else(|| err.into())
}

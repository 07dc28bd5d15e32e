// --- File: crates/autoservice_admin/src/error.rs ---
use thiserror::Error;

use autoservice_common::{AutoserviceError, BackendError};

/// Errors of the operator console. Display texts are shown to the operator as is.
#[derive(Error, Debug)]
pub enum AdminError {
    #[error("Пожалуйста, введите пароль")]
    EmptyPassword,

    #[error("Неверный пароль")]
    WrongPassword,

    /// No shared secret configured, so nobody can log in.
    #[error("Вход в панель администратора не настроен")]
    NotConfigured,

    #[error("Требуется вход в панель администратора")]
    NotAuthenticated,

    #[error("Ошибка: {}", .0.user_message())]
    Backend(#[from] BackendError),
}

impl From<AdminError> for AutoserviceError {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::Backend(inner) => inner.into(),
            AdminError::NotConfigured => AutoserviceError::ConfigError(err.to_string()),
            other => AutoserviceError::AuthError(other.to_string()),
        }
    }
}

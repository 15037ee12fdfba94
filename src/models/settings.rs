// src/models/settings.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Configuração da plataforma. É sempre substituída por inteiro.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlatformSettings {
    #[validate(length(min = 1, message = "O nome da plataforma é obrigatório."))]
    #[schema(example = "Biblioteca Escolar")]
    pub platform_name: String,

    #[validate(email(message = "O e-mail de suporte é inválido."))]
    #[schema(example = "suporte@biblioteca.app")]
    pub support_email: Option<String>,

    #[validate(nested)]
    #[serde(default)]
    pub mailer: MailerSettings,

    #[schema(example = "BIBLIO")]
    pub sms_sender_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MailerSettings {
    #[validate(email(message = "O remetente é inválido."))]
    pub from_address: Option<String>,
    pub smtp_host: Option<String>,
    #[validate(range(min = 1, message = "A porta SMTP é inválida."))]
    pub smtp_port: Option<u16>,
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            platform_name: "Biblioteca Escolar".to_string(),
            support_email: None,
            mailer: MailerSettings::default(),
            sms_sender_id: None,
        }
    }
}

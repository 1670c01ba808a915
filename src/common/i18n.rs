// src/common/i18n.rs

use std::collections::HashMap;

use crate::middleware::i18n::DEFAULT_LANG;

// Mensagens de erro por (idioma, código). "{0}" recebe o argumento do erro.
const MESSAGES: &[(&str, &str, &str)] = &[
    ("pt", "validation", "Um ou mais campos são inválidos."),
    ("en", "validation", "One or more fields are invalid."),
    ("pt", "sync.missing_entity_id", "Operações de atualização e exclusão exigem o ID da entidade."),
    ("en", "sync.missing_entity_id", "Update and delete operations require an entity id."),
    ("pt", "sync.operation_not_found", "Operação pendente não encontrada: {0}"),
    ("en", "sync.operation_not_found", "Pending operation not found: {0}"),
    ("pt", "pix.unsupported_bank", "Banco não suportado: {0}"),
    ("en", "pix.unsupported_bank", "Bank not supported: {0}"),
    ("pt", "pix.unknown_bank", "Código de banco desconhecido: {0}"),
    ("en", "pix.unknown_bank", "Unknown bank code: {0}"),
    ("pt", "pix.not_configured", "Configure o PIX (banco, tipo de chave e chave) para gerar a cobrança."),
    ("en", "pix.not_configured", "Complete the PIX settings (bank, key type and key) to generate the charge."),
    ("pt", "pix.invalid_key", "Chave PIX inválida: {0}"),
    ("en", "pix.invalid_key", "Invalid PIX key: {0}"),
    ("pt", "pix.invalid_params", "Parâmetro PIX inválido: {0}"),
    ("en", "pix.invalid_params", "Invalid PIX parameter: {0}"),
    ("pt", "pix.invalid_amount", "O valor da cobrança deve ser maior que zero."),
    ("en", "pix.invalid_amount", "The charge amount must be greater than zero."),
    ("pt", "pix.field_too_long", "Campo {0} do código PIX é longo demais."),
    ("en", "pix.field_too_long", "PIX code field {0} is too long."),
    ("pt", "fatura.incomplete_readings", "Dados de leitura incompletos."),
    ("en", "fatura.incomplete_readings", "Meter readings are incomplete."),
    ("pt", "fatura.invalid_readings", "A leitura atual não pode ser menor que a anterior."),
    ("en", "fatura.invalid_readings", "The current reading cannot be lower than the previous one."),
    ("pt", "fatura.overflow", "Os valores informados são grandes demais para o cálculo."),
    ("en", "fatura.overflow", "The values provided are too large to calculate."),
    ("pt", "remote.unavailable", "Servidor indisponível no momento."),
    ("en", "remote.unavailable", "The server is currently unavailable."),
    ("pt", "remote.not_found", "Registro não encontrado: {0}"),
    ("en", "remote.not_found", "Record not found: {0}"),
    ("pt", "storage.unavailable", "Armazenamento local indisponível."),
    ("en", "storage.unavailable", "Local storage unavailable."),
    ("pt", "document.font_not_found", "Fonte do PDF não encontrada."),
    ("en", "document.font_not_found", "PDF font not found."),
    ("pt", "internal", "Ocorreu um erro inesperado."),
    ("en", "internal", "An unexpected error occurred."),
];

#[derive(Debug, Clone)]
pub struct I18nStore {
    // idioma -> (código -> mensagem)
    messages: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

impl I18nStore {
    pub fn new() -> Self {
        let mut messages: HashMap<&'static str, HashMap<&'static str, &'static str>> = HashMap::new();
        for (lang, code, text) in MESSAGES {
            messages.entry(*lang).or_default().insert(*code, *text);
        }
        Self { messages }
    }

    pub fn translate(&self, lang: &str, code: &str, argument: &str) -> String {
        let lookup = |lang: &str, code: &str| {
            self.messages.get(lang).and_then(|m| m.get(code)).copied()
        };

        let template = lookup(lang, code)
            .or_else(|| lookup(DEFAULT_LANG, code))
            .or_else(|| lookup(DEFAULT_LANG, "internal"))
            .unwrap_or(code);

        template.replace("{0}", argument)
    }
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}

// src/services/pix/integrations.rs

use std::collections::HashMap;

use crate::{
    common::error::AppError,
    models::pix::{Bank, PixParams},
    services::pix::br_code::build_payload,
};

/// Integração PIX de um banco: sabe gerar o BR Code para aquele banco.
pub trait PixIntegration: Send + Sync {
    fn bank(&self) -> Bank;

    fn generate_pix_payload(&self, params: &PixParams) -> Result<String, AppError>;
}

/// Sicredi (748): BR Code padrão do Banco Central.
pub struct SicrediPix;

impl PixIntegration for SicrediPix {
    fn bank(&self) -> Bank {
        Bank::Sicredi
    }

    fn generate_pix_payload(&self, params: &PixParams) -> Result<String, AppError> {
        build_payload(params)
    }
}

/// Sicoob (756): também usa o BR Code padrão.
pub struct SicoobPix;

impl PixIntegration for SicoobPix {
    fn bank(&self) -> Bank {
        Bank::Sicoob
    }

    fn generate_pix_payload(&self, params: &PixParams) -> Result<String, AppError> {
        build_payload(params)
    }
}

pub struct PixRegistry {
    integrations: HashMap<Bank, Box<dyn PixIntegration>>,
}

impl PixRegistry {
    pub fn empty() -> Self {
        Self { integrations: HashMap::new() }
    }

    /// Registra (ou substitui) a integração do banco que ela declara.
    pub fn register(&mut self, integration: impl PixIntegration + 'static) {
        self.integrations.insert(integration.bank(), Box::new(integration));
    }

    pub fn supports(&self, bank: Bank) -> bool {
        self.integrations.contains_key(&bank)
    }

    pub fn get(&self, bank_code: &str) -> Result<&dyn PixIntegration, AppError> {
        Bank::from_code(bank_code)
            .and_then(|bank| self.integrations.get(&bank))
            .map(|integration| integration.as_ref())
            .ok_or_else(|| AppError::UnsupportedBank(bank_code.trim().to_string()))
    }
}

impl Default for PixRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(SicrediPix);
        registry.register(SicoobPix);
        registry
    }
}

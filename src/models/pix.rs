// src/models/pix.rs

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::common::error::AppError;

pub const AVISO_CHAVE_NAO_CNPJ: &str =
    "Apenas chaves do tipo CNPJ/CPF conseguirão se integrar completamente com o sistema do banco.";

// --- Bancos ---

/// Bancos que podem ser escolhidos na configuração do PIX (código COMPE).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Bank {
    BancoDoBrasil,
    Caixa,
    Bradesco,
    Itau,
    Santander,
    Nubank,
    Inter,
    Votorantim,
    Original,
    C6,
    Sicredi,
    Sicoob,
}

impl Bank {
    pub const ALL: [Bank; 12] = [
        Bank::BancoDoBrasil,
        Bank::Caixa,
        Bank::Bradesco,
        Bank::Itau,
        Bank::Santander,
        Bank::Nubank,
        Bank::Inter,
        Bank::Votorantim,
        Bank::Original,
        Bank::C6,
        Bank::Sicredi,
        Bank::Sicoob,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Bank::BancoDoBrasil => "001",
            Bank::Caixa => "104",
            Bank::Bradesco => "237",
            Bank::Itau => "341",
            Bank::Santander => "033",
            Bank::Nubank => "260",
            Bank::Inter => "077",
            Bank::Votorantim => "655",
            Bank::Original => "212",
            Bank::C6 => "336",
            Bank::Sicredi => "748",
            Bank::Sicoob => "756",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Bank::BancoDoBrasil => "Banco do Brasil",
            Bank::Caixa => "Caixa Econômica Federal",
            Bank::Bradesco => "Bradesco",
            Bank::Itau => "Itaú",
            Bank::Santander => "Santander",
            Bank::Nubank => "Nubank",
            Bank::Inter => "Inter",
            Bank::Votorantim => "Votorantim",
            Bank::Original => "Banco Original",
            Bank::C6 => "C6 Bank",
            Bank::Sicredi => "Sicredi",
            Bank::Sicoob => "Sicoob",
        }
    }

    pub fn from_code(code: &str) -> Option<Bank> {
        let code = code.trim();
        Bank::ALL.into_iter().find(|bank| bank.code() == code)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BankInfo {
    #[schema(example = "748")]
    pub code: String,
    #[schema(example = "Sicredi")]
    pub name: String,
    /// Se existe integração para gerar o código PIX deste banco.
    pub supported: bool,
}

// --- Chave PIX ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum PixKeyType {
    #[serde(rename = "CPF/CNPJ")]
    CpfCnpj,
    #[serde(rename = "EMAIL")]
    Email,
    #[serde(rename = "TELEFONE")]
    Telefone,
    #[serde(rename = "ALEATORIA")]
    Aleatoria,
}

impl PixKeyType {
    /// Valida a chave conforme o tipo e devolve a forma usada no BR Code.
    pub fn normalize(&self, raw: &str) -> Result<String, AppError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(AppError::InvalidPixKey("chave vazia".to_string()));
        }

        match self {
            PixKeyType::CpfCnpj => {
                let cleaned: String = raw
                    .chars()
                    .filter(|c| !matches!(c, '.' | '-' | '/' | ' '))
                    .collect();
                if !cleaned.chars().all(|c| c.is_ascii_digit()) {
                    return Err(AppError::InvalidPixKey("CPF/CNPJ deve conter apenas números".to_string()));
                }
                match cleaned.len() {
                    11 | 14 => Ok(cleaned),
                    n => Err(AppError::InvalidPixKey(format!("CPF/CNPJ com {} dígitos", n))),
                }
            }
            PixKeyType::Email => {
                let lower = raw.to_lowercase();
                let mut parts = lower.split('@');
                let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
                    (Some(local), Some(domain), None) => (local, domain),
                    _ => return Err(AppError::InvalidPixKey("e-mail inválido".to_string())),
                };
                let domain_ok = domain
                    .split('.')
                    .filter(|label| !label.is_empty())
                    .count()
                    >= 2
                    && !domain.starts_with('.')
                    && !domain.ends_with('.');
                if local.is_empty() || !domain_ok || lower.contains(' ') {
                    return Err(AppError::InvalidPixKey("e-mail inválido".to_string()));
                }
                Ok(lower)
            }
            PixKeyType::Telefone => {
                let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
                let has_junk = raw
                    .chars()
                    .any(|c| !(c.is_ascii_digit() || matches!(c, '+' | '(' | ')' | '-' | ' ')));
                if has_junk || !(10..=13).contains(&digits.len()) {
                    return Err(AppError::InvalidPixKey("telefone inválido".to_string()));
                }
                // Números com DDI já começam com 55 e têm 12 ou 13 dígitos.
                if digits.len() >= 12 && digits.starts_with("55") {
                    Ok(format!("+{}", digits))
                } else if digits.len() <= 11 {
                    Ok(format!("+55{}", digits))
                } else {
                    Err(AppError::InvalidPixKey("telefone inválido".to_string()))
                }
            }
            PixKeyType::Aleatoria => uuid::Uuid::parse_str(raw)
                .map(|id| id.hyphenated().to_string())
                .map_err(|_| AppError::InvalidPixKey("chave aleatória deve ser um UUID".to_string())),
        }
    }
}

// --- Configuração ---

/// Configuração PIX de uma geradora.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PixConfig {
    #[schema(example = "748")]
    pub banco: String,

    pub tipo_chave: PixKeyType,

    #[schema(example = "12345678000199")]
    pub chave: String,

    pub updated_at: Option<DateTime<Utc>>,
}

impl PixConfig {
    /// Avisos exibidos junto da configuração (não impedem o uso).
    pub fn avisos(&self) -> Vec<String> {
        match self.tipo_chave {
            PixKeyType::CpfCnpj => Vec::new(),
            _ => vec![AVISO_CHAVE_NAO_CNPJ.to_string()],
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.banco.trim().is_empty() && !self.chave.trim().is_empty()
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePixConfigRequest {
    #[validate(length(min = 1, message = "Selecione o banco."))]
    #[schema(example = "748")]
    pub banco: String,

    pub tipo_chave: PixKeyType,

    #[validate(length(min = 1, message = "Informe a chave PIX."))]
    #[schema(example = "12.345.678/0001-99")]
    pub chave: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PixConfigResponse {
    pub config: Option<PixConfig>,
    pub avisos: Vec<String>,
}

// --- Cobrança ---

/// Parâmetros do BR Code. O valor é formatado com duas casas decimais.
#[derive(Debug, Clone, PartialEq, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PixParams {
    #[validate(length(min = 1, message = "Informe o nome do recebedor."))]
    #[schema(example = "RENOVVA MAIS")]
    pub nome: String,

    #[validate(length(min = 1, message = "Informe a chave PIX."))]
    #[schema(example = "12345678000199")]
    pub chave: String,

    #[schema(value_type = f64, example = 150.0)]
    pub valor: Decimal,

    #[validate(length(min = 1, message = "Informe a cidade."))]
    #[schema(example = "SAO PAULO")]
    pub cidade: String,

    #[schema(example = "FAT2025050001")]
    pub txid: String,
}

impl PixParams {
    pub fn valor_formatado(&self) -> Result<String, AppError> {
        // Arredonda antes de validar: 0,001 viraria uma cobrança de 0.00.
        let mut valor = self.valor.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        if valor <= Decimal::ZERO {
            return Err(AppError::InvalidAmount);
        }
        valor.rescale(2);
        Ok(valor.to_string())
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePixChargeRequest {
    #[schema(example = "756")]
    pub banco: String,

    #[validate(nested)]
    pub params: PixParams,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PixCharge {
    #[schema(example = "748")]
    pub banco: String,
    /// Código "copia e cola" (BR Code) exatamente como codificado no QR.
    pub payload: String,
    /// PNG do QR Code como data URL.
    pub qr_code_data_url: String,
    pub avisos: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bank_codes_round_trip_and_unknown_codes_are_none() {
        for bank in Bank::ALL {
            assert_eq!(Bank::from_code(bank.code()), Some(bank));
        }
        assert_eq!(Bank::from_code(" 748 "), Some(Bank::Sicredi));
        assert_eq!(Bank::from_code("999"), None);
    }

    #[test]
    fn cpf_cnpj_keys_are_reduced_to_digits() {
        let t = PixKeyType::CpfCnpj;
        assert_eq!(t.normalize("123.456.789-09").unwrap(), "12345678909");
        assert_eq!(t.normalize("12.345.678/0001-99").unwrap(), "12345678000199");
        assert!(t.normalize("1234").is_err());
        assert!(t.normalize("123.456.789-0X").is_err());
    }

    #[test]
    fn email_phone_and_random_keys_are_normalized() {
        assert_eq!(
            PixKeyType::Email.normalize(" Financeiro@RenovaMais.com.br ").unwrap(),
            "financeiro@renovamais.com.br"
        );
        assert!(PixKeyType::Email.normalize("sem-arroba").is_err());
        assert!(PixKeyType::Email.normalize("a@b").is_err());

        assert_eq!(PixKeyType::Telefone.normalize("(11) 99999-8888").unwrap(), "+5511999998888");
        assert_eq!(PixKeyType::Telefone.normalize("+55 11 99999-8888").unwrap(), "+5511999998888");
        assert!(PixKeyType::Telefone.normalize("12345").is_err());

        assert_eq!(
            PixKeyType::Aleatoria.normalize("6F1C1F0E-8F7B-4D0E-B0A4-5D3B1C2A9E77").unwrap(),
            "6f1c1f0e-8f7b-4d0e-b0a4-5d3b1c2a9e77"
        );
        assert!(PixKeyType::Aleatoria.normalize("nao-e-uuid").is_err());
    }

    #[test]
    fn key_type_uses_form_labels_on_the_wire() {
        let json = serde_json::to_string(&PixKeyType::CpfCnpj).unwrap();
        assert_eq!(json, "\"CPF/CNPJ\"");
        let parsed: PixKeyType = serde_json::from_str("\"ALEATORIA\"").unwrap();
        assert_eq!(parsed, PixKeyType::Aleatoria);
    }

    #[test]
    fn amount_is_formatted_with_two_decimals() {
        let mut params = PixParams {
            nome: "RENOVVA MAIS".to_string(),
            chave: "12345678909".to_string(),
            valor: Decimal::new(150, 0),
            cidade: "SAO PAULO".to_string(),
            txid: "FAT1".to_string(),
        };
        assert_eq!(params.valor_formatado().unwrap(), "150.00");

        params.valor = Decimal::new(12_3456, 4);
        assert_eq!(params.valor_formatado().unwrap(), "12.35");

        params.valor = Decimal::ZERO;
        assert!(matches!(params.valor_formatado(), Err(AppError::InvalidAmount)));
    }

    #[test]
    fn amount_that_rounds_to_zero_is_rejected() {
        let mut params = PixParams {
            nome: "RENOVVA MAIS".to_string(),
            chave: "12345678909".to_string(),
            valor: Decimal::new(1, 3),
            cidade: "SAO PAULO".to_string(),
            txid: "FAT1".to_string(),
        };
        assert!(matches!(params.valor_formatado(), Err(AppError::InvalidAmount)));

        params.valor = Decimal::new(5, 3);
        assert_eq!(params.valor_formatado().unwrap(), "0.01");
    }

    #[test]
    fn amount_rounds_half_away_from_zero() {
        let params = PixParams {
            nome: "RENOVVA MAIS".to_string(),
            chave: "12345678909".to_string(),
            valor: Decimal::new(125, 3),
            cidade: "SAO PAULO".to_string(),
            txid: "FAT1".to_string(),
        };
        assert_eq!(params.valor_formatado().unwrap(), "0.13");
    }

    #[test]
    fn only_cpf_cnpj_keys_are_free_of_warnings() {
        let mut config = PixConfig {
            banco: "748".to_string(),
            tipo_chave: PixKeyType::CpfCnpj,
            chave: "12345678909".to_string(),
            updated_at: None,
        };
        assert!(config.avisos().is_empty());
        config.tipo_chave = PixKeyType::Email;
        assert_eq!(config.avisos(), vec![AVISO_CHAVE_NAO_CNPJ.to_string()]);
    }
}

// src/models/fatura.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FaturaStatus {
    Pendente,
    Pago,
    Vencido,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Fatura {
    #[schema(example = "fat-0001")]
    pub id: String,

    #[schema(example = "João da Silva")]
    pub cliente: String,

    #[schema(example = "052025")]
    pub referencia: Option<String>,

    pub descricao: Option<String>,

    #[schema(value_type = String, format = Date, example = "2025-05-10")]
    pub vencimento: NaiveDate,

    #[schema(value_type = f64, example = 127.5)]
    pub valor: Decimal,

    pub status: FaturaStatus,

    // Campos extraídos da conta da concessionária
    pub leitura_anterior: Option<i64>,
    pub leitura_atual: Option<i64>,
    #[schema(value_type = Option<f64>, example = 150.0)]
    pub valor_bruto: Option<Decimal>,
}

impl Fatura {
    /// Status exibido: uma fatura pendente com vencimento passado está vencida.
    pub fn status_em(&self, hoje: NaiveDate) -> FaturaStatus {
        match self.status {
            FaturaStatus::Pendente if self.vencimento < hoje => FaturaStatus::Vencido,
            status => status,
        }
    }

    /// Identificador da transação PIX: a referência, ou o id da fatura.
    pub fn txid(&self) -> &str {
        match self.referencia.as_deref().map(str::trim) {
            Some(referencia) if !referencia.is_empty() => referencia,
            _ => &self.id,
        }
    }
}

// --- Cálculo ---

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DadosFatura {
    pub cliente: Option<String>,
    #[schema(example = "7025079684")]
    pub codigo_concessionaria: Option<String>,
    #[schema(example = "05/2025")]
    pub referencia: Option<String>,
    #[schema(value_type = Option<String>, format = Date)]
    pub vencimento: Option<NaiveDate>,
    #[schema(example = 9023)]
    pub leitura_anterior: Option<i64>,
    #[schema(example = 9788)]
    pub leitura_atual: Option<i64>,
    #[schema(value_type = Option<f64>)]
    pub valor_total: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FonteTarifa {
    #[default]
    Padrao,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TipoCalculo {
    Percentual,
    Nominal,
    Fixo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TipoIluminacao {
    #[default]
    Nenhum,
    Fixo,
    Percentual,
}

/// Parâmetros tarifários do cliente usados no cálculo.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClienteTarifa {
    #[serde(default)]
    pub fonte_tarifa: FonteTarifa,
    #[serde(default)]
    #[schema(value_type = f64)]
    pub tusd: Decimal,
    #[serde(default)]
    #[schema(value_type = f64)]
    pub te: Decimal,
    pub tipo_calculo: TipoCalculo,
    /// Percentual (tipo percentual) ou valor fixo do desconto (nominal/fixo).
    #[serde(default)]
    #[schema(value_type = f64, example = 15.0)]
    pub percentual_economia: Decimal,
    #[serde(default)]
    pub tipo_iluminacao: TipoIluminacao,
    #[serde(default)]
    #[schema(value_type = f64)]
    pub valor_iluminacao_fixo: Decimal,
    #[serde(default)]
    #[schema(value_type = f64)]
    pub valor_iluminacao_percentual: Decimal,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalculoFaturaRequest {
    pub dados_fatura: DadosFatura,
    pub cliente: ClienteTarifa,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DetalhesCalculo {
    pub consumo: i64,
    #[schema(value_type = f64)]
    pub valor_kwh: Decimal,
    #[schema(value_type = Option<f64>)]
    pub percentual_economia: Option<Decimal>,
    #[schema(value_type = Option<f64>)]
    pub valor_fixo: Option<Decimal>,
    #[schema(value_type = f64)]
    pub valor_iluminacao: Decimal,
    #[schema(value_type = Option<f64>)]
    pub percentual_iluminacao: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResultadoCalculo {
    #[schema(value_type = f64)]
    pub valor_total: Decimal,
    #[schema(value_type = f64)]
    pub valor_desconto: Decimal,
    #[schema(value_type = f64)]
    pub valor_final: Decimal,
    pub tipo_calculo: TipoCalculo,
    pub detalhes: DetalhesCalculo,
}

// src/services/fatura_service.rs

use rust_decimal::{Decimal, RoundingStrategy};

use crate::{
    common::error::AppError,
    models::fatura::{
        ClienteTarifa, DadosFatura, DetalhesCalculo, FonteTarifa, ResultadoCalculo, TipoCalculo, TipoIluminacao,
    },
};

/// Tarifa por kWh quando o cliente usa a tarifa padrão (R$ 0,75).
pub const VALOR_KWH_PADRAO: Decimal = Decimal::from_parts(75, 0, 0, false, 2);

#[derive(Debug, Clone, Default)]
pub struct FaturaService;

impl FaturaService {
    pub fn new() -> Self {
        Self
    }

    /// Calcula a fatura do cliente a partir das leituras extraídas da conta da concessionária.
    ///
    /// A iluminação pública aparece nos detalhes mas não entra no valor final.
    pub fn calcular_fatura(&self, dados: &DadosFatura, cliente: &ClienteTarifa) -> Result<ResultadoCalculo, AppError> {
        let (anterior, atual) = match (dados.leitura_anterior, dados.leitura_atual) {
            (Some(anterior), Some(atual)) => (anterior, atual),
            _ => return Err(AppError::IncompleteReadings),
        };
        if anterior < 0 || atual < anterior {
            return Err(AppError::InvalidReadings);
        }

        let consumo = atual.checked_sub(anterior).ok_or(AppError::CalculationOverflow)?;
        let valor_kwh = match cliente.fonte_tarifa {
            FonteTarifa::Padrao => VALOR_KWH_PADRAO,
            FonteTarifa::Custom => cliente
                .tusd
                .checked_add(cliente.te)
                .ok_or(AppError::CalculationOverflow)?,
        };
        let valor_total = Decimal::from(consumo)
            .checked_mul(valor_kwh)
            .ok_or(AppError::CalculationOverflow)?;

        let (valor_desconto, percentual_economia, valor_fixo) = match cliente.tipo_calculo {
            TipoCalculo::Percentual => (
                percentual_de(valor_total, cliente.percentual_economia)?,
                Some(cliente.percentual_economia),
                None,
            ),
            TipoCalculo::Nominal | TipoCalculo::Fixo => {
                (cliente.percentual_economia, None, Some(cliente.percentual_economia))
            }
        };

        let (valor_iluminacao, percentual_iluminacao) = match cliente.tipo_iluminacao {
            TipoIluminacao::Nenhum => (Decimal::ZERO, None),
            TipoIluminacao::Fixo => (cliente.valor_iluminacao_fixo, None),
            TipoIluminacao::Percentual => (
                percentual_de(valor_total, cliente.valor_iluminacao_percentual)?,
                Some(cliente.valor_iluminacao_percentual),
            ),
        };

        let valor_final = valor_total
            .checked_sub(valor_desconto)
            .ok_or(AppError::CalculationOverflow)?;

        tracing::debug!(
            "Fatura calculada: consumo {} kWh, total {}, desconto {}",
            consumo,
            valor_total,
            valor_desconto
        );

        Ok(ResultadoCalculo {
            valor_total: dinheiro(valor_total),
            valor_desconto: dinheiro(valor_desconto),
            valor_final: dinheiro(valor_final),
            tipo_calculo: cliente.tipo_calculo,
            detalhes: DetalhesCalculo {
                consumo,
                valor_kwh,
                percentual_economia,
                valor_fixo: valor_fixo.map(dinheiro),
                valor_iluminacao: dinheiro(valor_iluminacao),
                percentual_iluminacao,
            },
        })
    }
}

fn percentual_de(valor: Decimal, percentual: Decimal) -> Result<Decimal, AppError> {
    valor
        .checked_mul(percentual)
        .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
        .ok_or(AppError::CalculationOverflow)
}

fn dinheiro(valor: Decimal) -> Decimal {
    valor.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

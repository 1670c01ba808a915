// src/services/pix/br_code.rs

//! Montagem do BR Code (PIX "copia e cola") no formato EMV: cada campo é
//! `ID (2) + TAMANHO (2) + VALOR`, fechado pelo CRC16 do payload inteiro.

use crate::{common::error::AppError, models::pix::PixParams, services::pix::crc16::crc16_hex};

const PIX_GUI: &str = "BR.GOV.BCB.PIX";
const MAX_NOME: usize = 25;
const MAX_CIDADE: usize = 15;
const MAX_TXID: usize = 25;
const TXID_VAZIO: &str = "***";

fn field(tag: &str, value: &str) -> Result<String, AppError> {
    let len = value.len();
    if len > 99 {
        return Err(AppError::BrCodeFieldTooLong { tag: tag.to_string(), len });
    }
    Ok(format!("{}{:02}{}", tag, len, value))
}

// Troca acentos por letras simples e descarta o que não for ASCII imprimível.
fn ascii_fold(value: &str) -> String {
    value
        .chars()
        .filter_map(|c| {
            let folded = match c {
                'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
                'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => 'A',
                'é' | 'è' | 'ê' | 'ë' => 'e',
                'É' | 'È' | 'Ê' | 'Ë' => 'E',
                'í' | 'ì' | 'î' | 'ï' => 'i',
                'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
                'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
                'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'O',
                'ú' | 'ù' | 'û' | 'ü' => 'u',
                'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
                'ç' => 'c',
                'Ç' => 'C',
                'ñ' => 'n',
                'Ñ' => 'N',
                c => c,
            };
            (folded.is_ascii() && !folded.is_ascii_control()).then_some(folded)
        })
        .collect()
}

fn text(value: &str, max: usize) -> String {
    ascii_fold(value.trim()).chars().take(max).collect::<String>().trim_end().to_string()
}

fn txid(value: &str) -> String {
    let id: String = value.chars().filter(|c| c.is_ascii_alphanumeric()).take(MAX_TXID).collect();
    if id.is_empty() { TXID_VAZIO.to_string() } else { id }
}

/// Gera o BR Code estático. Mesma entrada, mesma saída.
pub fn build_payload(params: &PixParams) -> Result<String, AppError> {
    let chave = params.chave.trim();
    if chave.is_empty() || !chave.is_ascii() {
        return Err(AppError::InvalidPixKey("chave vazia ou com caracteres inválidos".to_string()));
    }

    let nome = text(&params.nome, MAX_NOME);
    if nome.is_empty() {
        return Err(AppError::InvalidPixParams("nome".to_string()));
    }
    let cidade = text(&params.cidade, MAX_CIDADE);
    if cidade.is_empty() {
        return Err(AppError::InvalidPixParams("cidade".to_string()));
    }
    let valor = params.valor_formatado()?;

    let merchant_account = format!("{}{}", field("00", PIX_GUI)?, field("01", chave)?);
    let additional_data = field("05", &txid(&params.txid))?;

    let mut payload = String::new();
    payload.push_str(&field("00", "01")?);
    payload.push_str(&field("26", &merchant_account)?);
    payload.push_str(&field("52", "0000")?);
    payload.push_str(&field("53", "986")?);
    payload.push_str(&field("54", &valor)?);
    payload.push_str(&field("58", "BR")?);
    payload.push_str(&field("59", &nome)?);
    payload.push_str(&field("60", &cidade)?);
    payload.push_str(&field("62", &additional_data)?);
    payload.push_str("6304");

    let crc = crc16_hex(payload.as_bytes());
    payload.push_str(&crc);
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn params(txid: &str) -> PixParams {
        PixParams {
            nome: "RENOVVA MAIS".to_string(),
            chave: "12345678909".to_string(),
            valor: Decimal::new(15000, 2),
            cidade: "SAO PAULO".to_string(),
            txid: txid.to_string(),
        }
    }

    #[test]
    fn known_payload() {
        assert_eq!(
            build_payload(&params("FAT2025050001")).unwrap(),
            "00020126330014BR.GOV.BCB.PIX0111123456789095204000053039865406150.005802BR5912RENOVVA MAIS6009SAO PAULO62170513FAT202505000163045068"
        );
    }

    #[test]
    fn empty_or_symbolic_txid_becomes_placeholder() {
        let expected = "00020126330014BR.GOV.BCB.PIX0111123456789095204000053039865406150.005802BR5912RENOVVA MAIS6009SAO PAULO62070503***6304D8EA";
        assert_eq!(build_payload(&params("")).unwrap(), expected);
        assert_eq!(build_payload(&params("--//--")).unwrap(), expected);
    }

    #[test]
    fn same_input_same_bytes() {
        let p = params("05/2025");
        assert_eq!(build_payload(&p).unwrap(), build_payload(&p).unwrap());
    }

    #[test]
    fn accents_are_folded_and_long_texts_truncated() {
        let mut p = params("X1");
        p.nome = "Geradora Solar São João do Piauí Ltda".to_string();
        p.cidade = "São José dos Campos".to_string();

        let payload = build_payload(&p).unwrap();
        assert!(payload.is_ascii());
        assert!(payload.contains("5925Geradora Solar Sao Joao d"));
        assert!(payload.contains("6015Sao Jose dos Ca"));
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        let mut p = params("X1");
        p.chave = "x".repeat(80);
        assert!(matches!(build_payload(&p), Err(AppError::BrCodeFieldTooLong { ref tag, .. }) if tag == "26"));

        let mut p = params("X1");
        p.nome = "   ".to_string();
        assert!(matches!(build_payload(&p), Err(AppError::InvalidPixParams(_))));

        let mut p = params("X1");
        p.valor = Decimal::new(-1, 0);
        assert!(matches!(build_payload(&p), Err(AppError::InvalidAmount)));

        let mut p = params("X1");
        p.chave = "chave-ç".to_string();
        assert!(matches!(build_payload(&p), Err(AppError::InvalidPixKey(_))));
    }
}

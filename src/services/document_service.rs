// src/services/document_service.rs

use std::path::PathBuf;

use chrono::Utc;
use genpdf::{elements, style, Element};
use image::DynamicImage;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::fatura::{Fatura, FaturaStatus},
    services::{pix::qr, pix_service::PixService},
};

const FONT_FAMILY: &str = "Roboto";
const PAYLOAD_LINE_CHARS: usize = 60;

#[derive(Clone)]
pub struct DocumentService {
    pix: PixService,
    fonts_dir: PathBuf,
}

impl DocumentService {
    pub fn new(pix: PixService, fonts_dir: impl Into<PathBuf>) -> Self {
        Self { pix, fonts_dir: fonts_dir.into() }
    }

    /// PDF da fatura para compartilhar com o cliente, com o PIX quando a geradora tem um configurado.
    pub async fn generate_fatura_pdf(&self, tenant_id: Uuid, fatura: &Fatura) -> Result<Vec<u8>, AppError> {
        // Fontes primeiro: sem elas não há documento.
        let font_family = genpdf::fonts::from_files(&self.fonts_dir, FONT_FAMILY, None).map_err(|_| {
            AppError::FontNotFound(format!("{}/{}-*.ttf", self.fonts_dir.display(), FONT_FAMILY))
        })?;

        let charge = match self.pix.render_for_fatura(tenant_id, fatura).await {
            Ok(charge) => Some(charge),
            Err(e @ (AppError::PixNotConfigured | AppError::UnsupportedBank(_))) => {
                tracing::info!("Fatura {} sem PIX no PDF: {}", fatura.id, e);
                None
            }
            Err(e) => return Err(e),
        };

        let mut doc = genpdf::Document::new(font_family);
        doc.set_title(format!("Fatura {}", fatura.txid()));
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(10);
        doc.set_page_decorator(decorator);

        doc.push(elements::Paragraph::new("RENOVVA MAIS").styled(style::Style::new().bold().with_font_size(18)));
        doc.push(elements::Paragraph::new("Energia solar compartilhada").styled(style::Style::new().with_font_size(10)));
        doc.push(elements::Break::new(1.5));

        doc.push(elements::Paragraph::new(format!("FATURA {}", fatura.txid()))
            .styled(style::Style::new().bold().with_font_size(14)));
        doc.push(elements::Paragraph::new(format!("Cliente: {}", fatura.cliente)));
        doc.push(elements::Paragraph::new(format!("Vencimento: {}", fatura.vencimento.format("%d/%m/%Y"))));
        doc.push(elements::Paragraph::new(format!(
            "Situação: {}",
            status_label(fatura.status_em(Utc::now().date_naive()))
        )));
        if let Some(descricao) = &fatura.descricao {
            doc.push(elements::Paragraph::new(descricao.clone()));
        }

        doc.push(elements::Break::new(2));

        let mut table = elements::TableLayout::new(vec![3, 2]);
        table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

        let style_bold = style::Style::new().bold();
        table
            .row()
            .element(elements::Paragraph::new("Descrição").styled(style_bold))
            .element(elements::Paragraph::new("Valor").styled(style_bold))
            .push()
            .map_err(pdf_error)?;

        for (descricao, valor) in linhas_resumo(fatura) {
            table
                .row()
                .element(elements::Paragraph::new(descricao))
                .element(elements::Paragraph::new(valor))
                .push()
                .map_err(pdf_error)?;
        }

        doc.push(table);
        doc.push(elements::Break::new(2));

        let mut total = elements::Paragraph::new(format!("TOTAL A PAGAR: R$ {:.2}", fatura.valor));
        total.set_alignment(genpdf::Alignment::Right);
        doc.push(total.styled(style::Style::new().bold().with_font_size(12)));

        doc.push(elements::Break::new(2));

        if let Some(charge) = charge {
            doc.push(elements::Paragraph::new("PAGAMENTO VIA PIX").styled(style::Style::new().bold().with_font_size(12)));
            doc.push(elements::Paragraph::new("Código copia e cola:"));
            // O BR Code não tem espaços: sem quebra manual ele não cabe na linha.
            for trecho in quebrar(&charge.payload, PAYLOAD_LINE_CHARS) {
                doc.push(elements::Paragraph::new(trecho).styled(style::Style::new().with_font_size(8)));
            }
            for aviso in &charge.avisos {
                doc.push(elements::Paragraph::new(aviso.clone()).styled(style::Style::new().italic().with_font_size(8)));
            }
            doc.push(elements::Break::new(1));

            let image = DynamicImage::ImageLuma8(qr::render_image(&charge.payload)?);
            let pdf_image = elements::Image::from_dynamic_image(image)
                .map_err(pdf_error)?
                .with_scale(genpdf::Scale::new(0.5, 0.5));
            doc.push(pdf_image);
        } else {
            doc.push(
                elements::Paragraph::new("Entre em contato com a geradora para receber os dados de pagamento.")
                    .styled(style::Style::new().italic().with_font_size(8)),
            );
        }

        let mut buffer = Vec::new();
        doc.render(&mut buffer).map_err(pdf_error)?;

        tracing::debug!("PDF da fatura {} gerado ({} bytes)", fatura.id, buffer.len());
        Ok(buffer)
    }
}

// Linhas da tabela de resumo. Valores que não cabem no cálculo são omitidos.
fn linhas_resumo(fatura: &Fatura) -> Vec<(&'static str, String)> {
    let mut linhas = Vec::new();

    if let (Some(anterior), Some(atual)) = (fatura.leitura_anterior, fatura.leitura_atual) {
        linhas.push(("Leituras (anterior / atual)", format!("{} / {}", anterior, atual)));
        if let Some(consumo) = atual.checked_sub(anterior).filter(|c| *c >= 0) {
            linhas.push(("Consumo", format!("{} kWh", consumo)));
        }
    }
    if let Some(bruto) = fatura.valor_bruto {
        linhas.push(("Valor sem desconto", format!("R$ {:.2}", bruto)));
        if let Some(economia) = bruto.checked_sub(fatura.valor) {
            linhas.push(("Economia", format!("R$ {:.2}", economia)));
        }
    }

    linhas
}

fn quebrar(texto: &str, largura: usize) -> Vec<String> {
    texto
        .chars()
        .collect::<Vec<_>>()
        .chunks(largura.max(1))
        .map(|trecho| trecho.iter().collect())
        .collect()
}

fn pdf_error(e: genpdf::error::Error) -> AppError {
    AppError::PdfError(e.to_string())
}

fn status_label(status: FaturaStatus) -> &'static str {
    match status {
        FaturaStatus::Pendente => "Pendente",
        FaturaStatus::Pago => "Pago",
        FaturaStatus::Vencido => "Vencido",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{remote_store::memory::MemoryRemoteStore, LocalStore, PixConfigRepository},
        models::pix::{PixKeyType, UpdatePixConfigRequest},
        services::{
            pix::PixRegistry,
            pix_service::MerchantInfo,
            record_service::RecordService,
            sync_service::{SyncService, SyncSettings},
        },
    };
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::{fs, path::Path, sync::Arc};
    use tempfile::{tempdir, TempDir};

    const SYSTEM_FONTS: &str = "/usr/share/fonts/truetype/dejavu";

    struct Fixture {
        dir: TempDir,
        pix: PixService,
    }

    fn fixture() -> Fixture {
        let dir = tempdir().unwrap();
        let remote = Arc::new(MemoryRemoteStore::new());
        let store = LocalStore::open(dir.path().join("store"), 1 << 20).unwrap();
        let sync = SyncService::new(remote.clone(), store.clone(), SyncSettings::default());
        let pix = PixService::new(
            Arc::new(PixRegistry::default()),
            PixConfigRepository::new(store, remote.clone()),
            RecordService::new(remote.clone(), sync),
            MerchantInfo { nome: "RENOVVA MAIS".to_string(), cidade: "SAO PAULO".to_string() },
        );
        Fixture { dir, pix }
    }

    // Copia a família DejaVu do sistema com os nomes que o serviço procura.
    fn install_fonts(target: &Path) -> bool {
        let source = Path::new(SYSTEM_FONTS);
        let files = [
            ("DejaVuSans.ttf", "Regular"),
            ("DejaVuSans-Bold.ttf", "Bold"),
            ("DejaVuSans-Oblique.ttf", "Italic"),
            ("DejaVuSans-BoldOblique.ttf", "BoldItalic"),
        ];
        if !files.iter().all(|(file, _)| source.join(file).exists()) {
            return false;
        }
        fs::create_dir_all(target).unwrap();
        for (file, variant) in files {
            fs::copy(source.join(file), target.join(format!("{}-{}.ttf", FONT_FAMILY, variant))).unwrap();
        }
        true
    }

    fn fatura() -> Fatura {
        Fatura {
            id: "fat-1".to_string(),
            cliente: "Maria".to_string(),
            referencia: Some("FAT2025050001".to_string()),
            descricao: Some("Energia compensada de maio".to_string()),
            vencimento: NaiveDate::from_ymd_opt(2025, 5, 10).unwrap(),
            valor: Decimal::new(10000, 2),
            status: FaturaStatus::Pendente,
            leitura_anterior: Some(9023),
            leitura_atual: Some(9788),
            valor_bruto: Some(Decimal::new(12000, 2)),
        }
    }

    #[tokio::test]
    async fn missing_fonts_are_reported() {
        let f = fixture();
        let service = DocumentService::new(f.pix.clone(), f.dir.path().join("fonts"));

        let err = service.generate_fatura_pdf(Uuid::new_v4(), &fatura()).await.unwrap_err();
        assert!(matches!(err, AppError::FontNotFound(_)));
    }

    #[tokio::test]
    async fn renders_pdf_with_and_without_pix() {
        let f = fixture();
        let fonts = f.dir.path().join("fonts");
        if !install_fonts(&fonts) {
            eprintln!("fontes DejaVu ausentes em {}; teste ignorado", SYSTEM_FONTS);
            return;
        }
        let service = DocumentService::new(f.pix.clone(), &fonts);
        let tenant = Uuid::new_v4();

        let sem_pix = service.generate_fatura_pdf(tenant, &fatura()).await.unwrap();
        assert!(sem_pix.starts_with(b"%PDF"));

        f.pix
            .save_config(
                tenant,
                UpdatePixConfigRequest {
                    banco: "748".to_string(),
                    tipo_chave: PixKeyType::CpfCnpj,
                    chave: "12345678909".to_string(),
                },
            )
            .await
            .unwrap();

        let com_pix = service.generate_fatura_pdf(tenant, &fatura()).await.unwrap();
        assert!(com_pix.starts_with(b"%PDF"));
        // Código copia e cola e imagem do QR a mais.
        assert!(com_pix.len() > sem_pix.len());
    }

    #[test]
    fn summary_rows_skip_values_that_overflow() {
        let mut fatura = fatura();
        fatura.leitura_anterior = Some(-1);
        fatura.leitura_atual = Some(i64::MAX);
        fatura.valor_bruto = Some(Decimal::MAX);
        fatura.valor = Decimal::MIN;

        let linhas = linhas_resumo(&fatura);
        let descricoes: Vec<&str> = linhas.iter().map(|(d, _)| *d).collect();
        assert_eq!(descricoes, vec!["Leituras (anterior / atual)", "Valor sem desconto"]);
    }

    #[test]
    fn summary_rows_for_a_regular_invoice() {
        let linhas = linhas_resumo(&fatura());
        assert!(linhas.contains(&("Consumo", "765 kWh".to_string())));
        assert!(linhas.contains(&("Economia", "R$ 20.00".to_string())));
    }

    #[test]
    fn long_payload_is_split_into_lines() {
        let payload = "0".repeat(130);
        let linhas = quebrar(&payload, PAYLOAD_LINE_CHARS);
        assert_eq!(linhas.len(), 3);
        assert_eq!(linhas.concat(), payload);
    }
}

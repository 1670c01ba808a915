pub mod document_service;
pub mod fatura_service;
pub mod pix;
pub mod pix_service;
pub mod record_service;
pub mod sync_service;

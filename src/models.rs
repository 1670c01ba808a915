pub mod fatura;
pub mod pix;
pub mod sync;

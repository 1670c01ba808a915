pub mod faturas;
pub mod pix;
pub mod records;
pub mod sync;

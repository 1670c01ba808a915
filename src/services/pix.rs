pub mod br_code;
pub mod crc16;
pub mod integrations;
pub mod qr;

pub use integrations::PixRegistry;

pub mod local_store;
pub use local_store::LocalStore;
pub mod remote_store;
pub use remote_store::{PgRemoteStore, RemoteStore};
pub mod pix_config_repo;
pub use pix_config_repo::PixConfigRepository;

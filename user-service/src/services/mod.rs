pub mod database;
pub mod keys;
pub mod memory;
pub mod store;

pub use database::MongoStore;
pub use keys::KeyGenerator;
pub use memory::MemoryStore;
pub use store::{DocumentStore, StoreError, StoreHandle};

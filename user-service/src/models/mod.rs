pub mod user;

pub use user::{GetResult, MutationResult, UserDocument, KEY_PREFIX};

pub mod users;

pub use users::{CreateUserResponse, UserMutationResponse};

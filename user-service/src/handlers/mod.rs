pub mod app;
pub mod users;

pub use app::{health_check, index, readiness_check};
pub use users::{create_user, delete_user, get_user, update_user};

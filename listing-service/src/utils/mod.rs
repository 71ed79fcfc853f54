pub mod password;
pub mod validation;

pub use password::{hash_password, verify_against_dummy, verify_password, Password};
pub use validation::ValidatedJson;

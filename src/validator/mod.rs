pub mod result;
pub mod validate;

pub mod prelude {
    pub use super::result::{RejectCause, RejectReason, ValidationResult};
    pub use super::validate::validate;
}

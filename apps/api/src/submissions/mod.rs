pub mod dual_write;
pub mod handlers;
pub mod validation;

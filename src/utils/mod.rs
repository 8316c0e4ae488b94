pub mod sanitize;
pub mod token;

pub mod catalog;
pub mod formatter;
pub mod validation;

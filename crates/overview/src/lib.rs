pub mod advice;
pub mod aggregate;

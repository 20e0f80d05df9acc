pub mod scheduler;
pub mod view;

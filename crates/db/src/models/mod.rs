pub mod audit;
pub mod form;
pub mod project;
pub mod task;
pub mod user;

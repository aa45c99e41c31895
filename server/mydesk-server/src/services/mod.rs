//! Collection services behind the HTTP handlers

pub mod registers;
pub mod tasks;

pub use registers::{RegisterInput, RegisterService};
pub use tasks::{TaskInput, TaskService};

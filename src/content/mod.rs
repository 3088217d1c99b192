pub mod catalog;
pub mod question;

pub use catalog::{Era, EraCatalog};
pub use question::{ContentError, Question};

pub mod history;
pub mod selector;
pub mod shuffle;

pub mod era_list;
pub mod history_list;
pub mod memorize_list;
pub mod progress_bar;
pub mod quiz_card;
pub mod results;

pub mod memorize;
pub mod quiz;
pub mod quiz_session;
pub mod timer;

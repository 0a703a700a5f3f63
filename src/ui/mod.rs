pub mod messages;
pub mod notices;

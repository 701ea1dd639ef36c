pub mod controller;
pub mod terminal;

pub use controller::{ ChatController, ChatState, PendingReply, APOLOGY_PREFIX };

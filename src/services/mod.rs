pub mod badge;
pub mod conversation;
pub mod poll;
pub mod response;
pub mod session;

pub mod adapters;
pub mod config;
pub mod dependencies;
pub mod domain;
pub mod services;

pub use crate::{
	adapters::backend::{Backend, HttpBackend},
	config::Config,
	services::{
		badge::{compute_unread_badge, UnreadBadge},
		conversation::ConversationSync,
		poll::PollHandle,
		response::ServiceError,
		session::Session,
	},
};

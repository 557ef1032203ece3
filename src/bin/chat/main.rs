pub mod render;

use std::{collections::HashSet, process::ExitCode};

use adopt_chat::{
	dependencies::{config, http_backend},
	ServiceError, Session,
};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "chat", about = "Adoption conversations from the terminal")]
struct Cli {
	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand)]
enum Command {
	/// Follow one conversation and send what is typed on stdin
	Open { conversation_id: u64 },
	/// Print the total unread count whenever it changes
	Badge,
}

#[tokio::main]
async fn main() -> ExitCode {
	let cli = Cli::parse();

	let config = match config() {
		Ok(config) => config,
		Err(err) => {
			eprintln!("{err}");
			return ExitCode::FAILURE;
		}
	};

	// ! Tracing
	tracing_subscriber::registry()
		.with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
			// reqwest and hyper are noisy at debug, keep them at the configured level
			format!("adopt_chat={0},chat={0}", config.log_level).into()
		}))
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.init();

	match run(cli.command).await {
		Ok(()) => ExitCode::SUCCESS,
		Err(ServiceError::LoginRequired { login_url }) => {
			eprintln!("Please log in first: {login_url}");
			ExitCode::FAILURE
		}
		Err(err) => {
			eprintln!("{err}");
			ExitCode::FAILURE
		}
	}
}

async fn run(command: Command) -> Result<(), ServiceError> {
	let config = config()?;
	let session = Session::start(http_backend()?, config).await?;

	match command {
		Command::Open { conversation_id } => open(&session, conversation_id).await?,
		Command::Badge => {
			let mut updates = session.badge().subscribe();
			println!("unread: {}", *updates.borrow_and_update());
			while updates.changed().await.is_ok() {
				println!("unread: {}", *updates.borrow_and_update());
			}
		}
	}

	session.logout();
	Ok(())
}

async fn open(
	session: &Session,
	conversation_id: u64,
) -> Result<(), ServiceError> {
	let sync = session.conversation(conversation_id);
	let snapshot = sync.load_initial().await?;
	let viewer = session.viewer().clone();

	println!("{}", render::header(&snapshot));
	let mut shown = HashSet::new();
	for message in &snapshot.messages {
		shown.insert(message.id);
		println!("{}\n", render::message(message, &viewer));
	}
	if let Some(notice) = render::composer(&snapshot, &viewer) {
		println!("[{notice}]");
	}

	let _polling = sync.start_polling(session.message_poll_interval());
	let mut updates = sync.subscribe();
	let printer_viewer = viewer.clone();
	let printer = tokio::spawn(async move {
		let mut status = snapshot.status();
		while updates.changed().await.is_ok() {
			let snapshot = updates.borrow_and_update().clone();
			for message in snapshot.messages.iter().filter(|m| shown.insert(m.id)) {
				println!("{}\n", render::message(message, &printer_viewer));
			}
			if snapshot.status() != status {
				status = snapshot.status();
				println!("{}", render::header(&snapshot));
				if let Some(notice) = render::composer(&snapshot, &printer_viewer) {
					println!("[{notice}]");
				}
			}
		}
	});

	let mut lines = BufReader::new(tokio::io::stdin()).lines();
	while let Ok(Some(line)) = lines.next_line().await {
		match sync.send(&line).await {
			Ok(_) | Err(ServiceError::EmptyMessage) => {}
			Err(ServiceError::ComposerLocked(_)) => {
				let snapshot = sync.snapshot().await;
				let notice = render::composer(&snapshot, &viewer).unwrap_or_default();
				println!("[cannot send yet] {notice}");
			}
			Err(err) => println!("[alert] {err}. Your message was kept, press enter on an empty line to retry."),
		}
		if line.trim().is_empty() && !sync.draft().await.is_empty() {
			if let Err(err) = sync.send_draft().await {
				println!("[alert] {err}");
			}
		}
	}

	printer.abort();
	Ok(())
}

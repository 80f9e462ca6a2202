#[macro_use]
extern crate tracing;

use axum_extra::extract::cookie::Key;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::signal::unix::SignalKind;
use tracing::Level;
use vault::{AppState, Config, SsoConfig, routes};

#[tokio::main]
async fn main() {
	// Set up the tracing subscriber.
	// This will print out all logs to the console.
	tracing_subscriber::fmt()
		.pretty()
		.with_thread_names(true)
		.with_max_level(Level::INFO)
		.init();

	// Load the configuration from the environment,
	// and create a database pool.
	let config = Config::from_env();
	let database_pool = config.create_database_pool();
	let redis_connection = config.create_redis_connection().await;

	// Load the SSO configs
	let sso_config = SsoConfig::from_env();

	let cookie_jar_key = Key::try_from(config.cookie_jar_key.as_bytes())
		.expect("COOKIE_JAR_KEY MUST BE AT LEAST 64 BYTES LONG");

	info!(
		"campus clock runs at {} with {:?} slot conflicts",
		config.campus_now(),
		config.slot_conflict_mode
	);

	// Create the app router and listener.
	let router = routes::get_app_router(AppState {
		config,
		sso_config,
		database_pool,
		redis_connection,
		cookie_jar_key,
	});

	let listener = TcpListener::bind("0.0.0.0:80").await.unwrap();

	// Start the server.
	debug!("listening on {}", listener.local_addr().unwrap());
	axum::serve(listener, router)
		.with_graceful_shutdown(shutdown_handler())
		.await
		.unwrap();
}

/// Gracefully shutdown the server on SIGINT or SIGTERM.
async fn shutdown_handler() {
	let ctrl_c = async {
		signal::ctrl_c().await.expect("COULD NOT INSTALL CTRL+C HANDLER");
	};

	let terminate = async {
		signal::unix::signal(SignalKind::terminate())
			.expect("COULD NOT INSTALL TERMINATE SIGNAL HANDLER")
			.recv()
			.await;
	};

	tokio::select! {
		() = ctrl_c => {},
		() = terminate => {},
	}
}

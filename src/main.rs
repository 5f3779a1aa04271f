#[doc(hidden)]
mod config;
pub mod dispatchers;
#[doc(hidden)]
mod error;
pub mod github_api;
pub mod history;
#[doc(hidden)]
mod markdown;
#[doc(hidden)]
mod models;
#[doc(hidden)]
mod payloads;
pub mod polling;
pub mod repository_events;
pub mod server;
pub mod webhook_events;

pub use config::Config;
pub use error::Error;

#[tokio::main]
async fn main() -> anyhow::Result<()>
{
	// Read the config file, which may be passed as the only argument
	let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.yaml".to_string());
	let config = Config::from_file(&config_path)?;

	// RUST_LOG takes precedence over the configured log level
	let log_filter = std::env::var("RUST_LOG").ok()
		.or_else(|| config.log_level.clone())
		.unwrap_or_else(|| "info".to_string());

	pretty_env_logger::formatted_builder()
		.parse_filters(&log_filter)
		.init();

	log::info!("read configuration from “{config_path}” with {} watched repositories: {}",
		config.watchers.repos().len(), config.watchers.repos().join(", "));

	// The registry is built once and only read afterwards, so it can be shared without locking
	let dispatchers = dispatchers::Dispatchers::from_watchers(&config.watchers)?;
	let dispatchers = std::sync::Arc::new(dispatchers);

	let github_api_client = github_api::Client::from_config(config.github_api)?;

	match config.run_mode
	{
		config::RunMode::Api =>
		{
			let context = server::Context
			{
				dispatchers,
				github_api_client: Some(github_api_client),
			};

			log::info!("listening for incoming webhook events on {}", config.listen_address);
			warp::serve(server::routes(context)).run(config.listen_address).await;
		},
		config::RunMode::Poll =>
		{
			let poller = polling::Poller::new(&config.polling, github_api_client, dispatchers);

			poller.run().await;
		},
		config::RunMode::Once =>
		{
			let poller = polling::Poller::new(&config.polling, github_api_client, dispatchers);

			let summary = poller.run_cycle().await?;

			log::info!("announced {} of {} new events", summary.delivered, summary.new);
		},
	}

	Ok(())
}

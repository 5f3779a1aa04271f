//! Periodically fetch the events of all watched repositories and announce the new ones.

/// Configuration of the `poll` and `once` run modes.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct Config
{
	/// Time between two polling cycles (optional, default: 60 seconds).
	#[serde(default = "default_interval_seconds")]
	interval_seconds: u64,
	/// Time between two consecutive notifications within a cycle (optional, default: 5 seconds).
	#[serde(default = "default_notification_delay_seconds")]
	notification_delay_seconds: u64,
	/// File storing the IDs of the events seen in the previous cycle (optional, default:
	/// `history.txt`).
	#[serde(default = "default_history_path")]
	history_path: std::path::PathBuf,
}

#[doc(hidden)]
fn default_interval_seconds() -> u64
{
	60
}

#[doc(hidden)]
fn default_notification_delay_seconds() -> u64
{
	5
}

#[doc(hidden)]
fn default_history_path() -> std::path::PathBuf
{
	"history.txt".into()
}

impl Default for Config
{
	fn default() -> Self
	{
		Self
		{
			interval_seconds: default_interval_seconds(),
			notification_delay_seconds: default_notification_delay_seconds(),
			history_path: default_history_path(),
		}
	}
}

impl Config
{
	pub fn interval(&self) -> std::time::Duration
	{
		std::time::Duration::from_secs(self.interval_seconds)
	}

	pub fn notification_delay(&self) -> std::time::Duration
	{
		std::time::Duration::from_secs(self.notification_delay_seconds)
	}

	pub fn history_path(&self) -> &std::path::Path
	{
		&self.history_path
	}
}

/// What happened during a single polling cycle.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CycleSummary
{
	/// Number of events returned by the events API across all repositories.
	pub fetched: usize,
	/// Number of events that couldn’t be classified.
	pub skipped: usize,
	/// Number of classified events that weren’t seen in the previous cycle.
	pub new: usize,
	/// Number of new events that were delivered successfully.
	pub delivered: usize,
}

/// Polls the GitHub events API and relays new events to the dispatchers.
pub struct Poller
{
	#[doc(hidden)]
	github_api_client: crate::github_api::Client,
	#[doc(hidden)]
	dispatchers: std::sync::Arc<crate::dispatchers::Dispatchers>,
	#[doc(hidden)]
	history: crate::history::History,
	#[doc(hidden)]
	repos: Vec<String>,
	#[doc(hidden)]
	interval: std::time::Duration,
	#[doc(hidden)]
	notification_delay: std::time::Duration,
}

impl Poller
{
	/// Create a poller for all repositories with a registered dispatcher.
	pub fn new(
		config: &Config,
		github_api_client: crate::github_api::Client,
		dispatchers: std::sync::Arc<crate::dispatchers::Dispatchers>)
		-> Self
	{
		// Dispatchers may share a repository, whose events must only be fetched once
		let mut seen = std::collections::HashSet::new();
		let repos = dispatchers.repos().into_iter()
			.filter(|repo| seen.insert(repo.to_lowercase()))
			.map(str::to_string)
			.collect();

		Self
		{
			github_api_client,
			dispatchers,
			history: crate::history::History::new(config.history_path()),
			repos,
			interval: config.interval(),
			notification_delay: config.notification_delay(),
		}
	}

	/// Run polling cycles forever. Failed cycles are logged and retried after the usual interval.
	pub async fn run(&self)
	{
		log::info!("polling events of {} repositories every {} seconds, remembering seen events in \
			“{}”", self.repos.len(), self.interval.as_secs(), self.history.path().display());

		loop
		{
			match self.run_cycle().await
			{
				Ok(summary) => log::info!("polling cycle finished: {summary:?}"),
				Err(error) =>
				{
					log::error!("polling cycle aborted");
					log::error!("{:?}", anyhow::Error::from(error));
				},
			}

			tokio::time::sleep(self.interval).await;
		}
	}

	/// Run a single polling cycle.
	///
	/// The IDs of all classified events are stored before any notification is sent, so an event
	/// is never announced twice even if delivery fails.
	pub async fn run_cycle(&self) -> Result<CycleSummary, crate::Error>
	{
		let mut summary = CycleSummary::default();
		let previous_ids = self.history.previous_ids()?;

		let mut raw_events = Vec::new();

		for repo in &self.repos
		{
			let events = self.github_api_client.repository_events(repo).await
				.map_err(|error| crate::Error::FetchRepositoryEvents
				{
					repo: repo.clone(),
					source: Box::new(error),
				})?;

			raw_events.extend(events);
		}

		summary.fetched = raw_events.len();

		let mut events = Vec::with_capacity(raw_events.len());

		for raw_event in raw_events
		{
			let event_id = raw_event.id.clone();

			match crate::repository_events::RepositoryEvent::new(raw_event)
			{
				Ok(event) => events.push(event),
				Err(error) =>
				{
					summary.skipped += 1;
					log::warn!("skipping event {event_id}");
					log::warn!("{:?}", anyhow::Error::from(error));
				},
			}
		}

		self.history.replace_ids(events.iter().map(|event| event.raw().id.as_str()))?;

		let mut new_events = events.into_iter()
			.filter(|event| !previous_ids.contains(&event.raw().id))
			.collect::<Vec<_>>();

		// The events API lists the most recent events first
		new_events.sort_by_key(|event| event.raw().created_at);

		summary.new = new_events.len();
		log::debug!("{} new events out of {} fetched", summary.new, summary.fetched);

		for (index, event) in new_events.iter().enumerate()
		{
			if index > 0
			{
				tokio::time::sleep(self.notification_delay).await;
			}

			if self.announce(event).await
			{
				summary.delivered += 1;
			}
		}

		Ok(summary)
	}

	/// Render an event and deliver it. Returns whether the delivery succeeded.
	#[doc(hidden)]
	async fn announce(&self, event: &crate::repository_events::RepositoryEvent) -> bool
	{
		for warning in event.warnings()
		{
			log::warn!("{} {}: {warning}", event.raw().humanized_type(), event.raw().id);
		}

		if !event.path().is_empty()
		{
			log::debug!("{} {} refers to “{}”", event.raw().humanized_type(), event.raw().id,
				event.path());
		}

		let message = event.say();

		let actor = match message.contains(crate::repository_events::ACTOR_PLACEHOLDER)
		{
			true => crate::github_api::resolve_display_name(Some(&self.github_api_client),
				event.username()).await,
			false => event.triggered_by().to_string(),
		};

		let message = crate::repository_events::fill_placeholders(&message, &actor, event);

		log::info!("announcing {} {} by “{}” in repository “{}”",
			event.raw().humanized_type(), event.raw().id, event.username(), event.repository());

		match self.dispatchers.process_message(event.repository(), &message).await
		{
			Ok(()) => true,
			Err(error) =>
			{
				log::error!("could not deliver {} {}", event.raw().humanized_type(),
					event.raw().id);
				log::error!("{:?}", anyhow::Error::from(error));
				false
			},
		}
	}
}

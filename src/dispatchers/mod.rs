//! Notification backends and the registry routing messages to them by repository name.

mod chat;
mod recording;
mod speech;

pub use chat::{ChatDispatcher, ChatFormat};
pub use recording::RecordingDispatcher;
pub use speech::SpeechDispatcher;

/// Default time after which outbound notification requests are abandoned.
pub const DEFAULT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// A destination capable of delivering rendered messages for a single repository.
///
/// The registry treats all backends alike and never branches on the concrete type.
#[async_trait::async_trait]
pub trait Dispatcher: Send + Sync
{
	/// The name of the repository whose messages this dispatcher delivers.
	fn repo(&self) -> &str;

	/// Deliver a message in a single attempt.
	async fn send_message(&self, message: &str) -> Result<(), crate::Error>;
}

// Allow dispatchers to be registered while keeping a handle to them (mostly useful for tests)
#[async_trait::async_trait]
impl<T> Dispatcher for std::sync::Arc<T>
where
	T: Dispatcher + ?Sized,
{
	fn repo(&self) -> &str
	{
		(**self).repo()
	}

	async fn send_message(&self, message: &str) -> Result<(), crate::Error>
	{
		(**self).send_message(message).await
	}
}

/// An ordered list of dispatchers, built once at startup and only read afterwards.
///
/// Lookups are read-only, so the registry can be shared between concurrently handled requests
/// behind an [std::sync::Arc] without any locking.
#[derive(Default)]
pub struct Dispatchers
{
	#[doc(hidden)]
	dispatchers: Vec<Box<dyn Dispatcher>>,
}

impl Dispatchers
{
	pub fn new() -> Self
	{
		Self::default()
	}

	/// Append a dispatcher. Dispatchers registered earlier take precedence.
	pub fn with<D>(mut self, dispatcher: D) -> Self
	where
		D: Dispatcher + 'static,
	{
		self.dispatchers.push(Box::new(dispatcher));
		self
	}

	/// Create one dispatcher for each watcher in the configuration.
	pub fn from_watchers(watchers: &crate::config::Watchers) -> Result<Self, crate::Error>
	{
		let http_client = reqwest::ClientBuilder::new()
			.user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
			.timeout(DEFAULT_TIMEOUT)
			.build().map_err(crate::Error::CreateHttpClient)?;

		let mut dispatchers = Self::new();

		for watcher in watchers.iter()
		{
			let chat_dispatcher = || -> Result<ChatDispatcher, crate::Error>
			{
				let url = watcher.webhook.clone()
					.ok_or_else(|| crate::Error::MissingWebhookUrl(watcher.repo.clone()))?;

				Ok(ChatDispatcher::new(&watcher.repo, url, watcher.format, http_client.clone()))
			};

			dispatchers = match watcher.backend
			{
				crate::config::Backend::Chat => dispatchers.with(chat_dispatcher()?),
				crate::config::Backend::Speech =>
					dispatchers.with(SpeechDispatcher::new(&watcher.repo, &watcher.speech_command)),
				crate::config::Backend::Test =>
				{
					let mut recording_dispatcher = RecordingDispatcher::new(&watcher.repo);

					if watcher.fail
					{
						recording_dispatcher = recording_dispatcher.failing();
					}

					if watcher.relay
					{
						recording_dispatcher = recording_dispatcher.relaying_to(chat_dispatcher()?);
					}

					dispatchers.with(recording_dispatcher)
				},
			};

			log::debug!("registered {:?} dispatcher for repository “{}”", watcher.backend,
				watcher.repo);
		}

		Ok(dispatchers)
	}

	/// Find the first dispatcher whose repository matches the given name, ignoring case.
	pub fn find(&self, repo: &str) -> Option<&dyn Dispatcher>
	{
		let repo = repo.to_lowercase();

		self.dispatchers.iter()
			.find(|dispatcher| dispatcher.repo().to_lowercase() == repo)
			.map(|dispatcher| &**dispatcher)
	}

	/// Deliver a message through the dispatcher registered for the given repository.
	///
	/// The result of the dispatcher is returned as is. There is no retry and no fallback to other
	/// dispatchers.
	///
	/// # Arguments
	/// - `repo`: The name of the repository the message is about (case-insensitive).
	/// - `message`: The rendered message.
	pub async fn process_message(&self, repo: &str, message: &str) -> Result<(), crate::Error>
	{
		match self.find(repo)
		{
			Some(dispatcher) => dispatcher.send_message(message).await,
			None => Err(crate::Error::NoDispatcher(repo.to_string())),
		}
	}

	/// Names of all repositories with a registered dispatcher, in registration order.
	pub fn repos(&self) -> Vec<&str>
	{
		self.dispatchers.iter().map(|dispatcher| dispatcher.repo()).collect()
	}
}

#[cfg(test)]
mod tests
{
	use super::{Dispatchers, RecordingDispatcher};
	use std::sync::Arc;

	#[tokio::test]
	async fn routes_to_matching_dispatcher_only()
	{
		let first = Arc::new(RecordingDispatcher::new("proj"));
		let second = Arc::new(RecordingDispatcher::new("other"));
		let dispatchers = Dispatchers::new().with(first.clone()).with(second.clone());

		for (repo, recorder) in [("proj", &first), ("other", &second)]
		{
			dispatchers.process_message(repo, "hello").await.unwrap();
			assert_eq!(recorder.last_message().as_deref(), Some("hello"));
		}

		assert_eq!(first.messages(), ["hello"]);
		assert_eq!(second.messages(), ["hello"]);
	}

	#[tokio::test]
	async fn matches_repository_case_insensitively()
	{
		let recorder = Arc::new(RecordingDispatcher::new("proj"));
		let dispatchers = Dispatchers::new().with(recorder.clone());

		dispatchers.process_message("PROJ", "hello").await.unwrap();

		assert_eq!(recorder.last_message().as_deref(), Some("hello"));
	}

	#[tokio::test]
	async fn first_match_wins()
	{
		let first = Arc::new(RecordingDispatcher::new("Proj"));
		let shadowed = Arc::new(RecordingDispatcher::new("proj"));
		let dispatchers = Dispatchers::new().with(first.clone()).with(shadowed.clone());

		dispatchers.process_message("proj", "hello").await.unwrap();

		assert_eq!(first.messages().len(), 1);
		assert!(shadowed.messages().is_empty());
	}

	#[tokio::test]
	async fn unknown_repository_is_routing_error()
	{
		let recorder = Arc::new(RecordingDispatcher::new("proj"));
		let dispatchers = Dispatchers::new().with(recorder.clone());

		let error = dispatchers.process_message("unknown", "hello").await.unwrap_err();

		assert!(matches!(error, crate::Error::NoDispatcher(ref repo) if repo == "unknown"));
		assert!(recorder.messages().is_empty());
	}

	#[tokio::test]
	async fn delivery_errors_are_returned_verbatim()
	{
		let failing = Arc::new(RecordingDispatcher::new("proj").failing());
		let fallback = Arc::new(RecordingDispatcher::new("proj"));
		let dispatchers = Dispatchers::new().with(failing.clone()).with(fallback.clone());

		let error = dispatchers.process_message("proj", "hello").await.unwrap_err();

		assert!(matches!(error, crate::Error::ConfiguredFailure));
		assert!(fallback.messages().is_empty());
	}

	#[tokio::test]
	async fn built_from_watchers()
	{
		let config = crate::Config::from_yaml("\
github_api:
  organization: acme
watchers:
  - repo: chat-repo
    webhook: https://hooks.slack.com/services/T000/B000/XXXX
  - repo: speech-repo
    backend: speech
  - repo: test-repo
    backend: test
  - repo: broken-repo
    backend: test
    fail: true
").unwrap();

		let dispatchers = Dispatchers::from_watchers(&config.watchers).unwrap();

		assert_eq!(dispatchers.repos(), ["chat-repo", "speech-repo", "test-repo", "broken-repo"]);
		assert!(dispatchers.find("SPEECH-REPO").is_some());
		assert!(dispatchers.find("missing").is_none());

		assert!(dispatchers.process_message("test-repo", "hello").await.is_ok());
		assert!(matches!(dispatchers.process_message("broken-repo", "hello").await,
			Err(crate::Error::ConfiguredFailure)));
	}
}

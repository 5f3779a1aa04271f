/// Dispatcher recording every message it receives, for tests and smoke tests.
///
/// Optionally, it always fails (to exercise failure paths), or additionally relays messages to a
/// real chat webhook.
pub struct RecordingDispatcher
{
	#[doc(hidden)]
	repo: String,
	#[doc(hidden)]
	messages: std::sync::Mutex<Vec<String>>,
	#[doc(hidden)]
	should_fail: bool,
	#[doc(hidden)]
	relay: Option<super::ChatDispatcher>,
}

impl RecordingDispatcher
{
	pub fn new(repo: &str) -> Self
	{
		Self
		{
			repo: repo.to_string(),
			messages: Default::default(),
			should_fail: false,
			relay: None,
		}
	}

	/// Make every delivery fail with [crate::Error::ConfiguredFailure] without recording it.
	pub fn failing(mut self) -> Self
	{
		self.should_fail = true;
		self
	}

	/// Also deliver recorded messages through a chat dispatcher.
	pub fn relaying_to(mut self, chat_dispatcher: super::ChatDispatcher) -> Self
	{
		self.relay = Some(chat_dispatcher);
		self
	}

	/// All messages recorded so far, oldest first.
	#[allow(dead_code)]
	pub fn messages(&self) -> Vec<String>
	{
		self.lock_messages().clone()
	}

	/// The message recorded last, if any.
	#[allow(dead_code)]
	pub fn last_message(&self) -> Option<String>
	{
		self.lock_messages().last().cloned()
	}

	#[doc(hidden)]
	fn lock_messages(&self) -> std::sync::MutexGuard<'_, Vec<String>>
	{
		// A panic while holding the lock can’t leave the list in an inconsistent state
		self.messages.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
	}
}

#[async_trait::async_trait]
impl super::Dispatcher for RecordingDispatcher
{
	fn repo(&self) -> &str
	{
		&self.repo
	}

	async fn send_message(&self, message: &str) -> Result<(), crate::Error>
	{
		if self.should_fail
		{
			return Err(crate::Error::ConfiguredFailure);
		}

		self.lock_messages().push(message.to_string());

		if let Some(relay) = &self.relay
		{
			log::info!("relaying recorded message for repository “{}”", self.repo);
			return relay.send_message(message).await;
		}

		Ok(())
	}
}

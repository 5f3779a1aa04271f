/// Dispatcher announcing messages with a local text-to-speech command (such as `say` on macOS).
pub struct SpeechDispatcher
{
	#[doc(hidden)]
	repo: String,
	#[doc(hidden)]
	command: String,
}

impl SpeechDispatcher
{
	/// Create a dispatcher for a repository.
	///
	/// # Arguments
	/// - `repo`: The name of the repository whose messages are announced.
	/// - `command`: The program to run, which receives the message as its only argument.
	pub fn new(repo: &str, command: &str) -> Self
	{
		Self
		{
			repo: repo.to_string(),
			command: command.to_string(),
		}
	}
}

#[async_trait::async_trait]
impl super::Dispatcher for SpeechDispatcher
{
	fn repo(&self) -> &str
	{
		&self.repo
	}

	async fn send_message(&self, message: &str) -> Result<(), crate::Error>
	{
		let status = tokio::process::Command::new(&self.command)
			.arg(message)
			.status().await
			.map_err(|source| crate::Error::RunSpeechCommand{command: self.command.clone(), source})?;

		if !status.success()
		{
			return Err(crate::Error::SpeechCommandFailed{command: self.command.clone(), status});
		}

		Ok(())
	}
}

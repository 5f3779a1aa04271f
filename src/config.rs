#[derive(serde::Deserialize)]
/// Top-level configuration of this application.
///
/// The configuration is read once at startup and handed to the components needing it. It is never
/// modified afterwards.
pub struct Config
{
	/// How this service watches repositories (optional, default: `api`).
	#[serde(default)]
	pub run_mode: RunMode,
	/// Address the webhook server listens on in `api` mode (optional, default: `127.0.0.1:2342`).
	#[serde(default = "default_listen_address")]
	pub listen_address: std::net::SocketAddr,
	/// Log filter in `env_logger` syntax, unless overridden by `RUST_LOG` (optional, default:
	/// `info`).
	pub log_level: Option<String>,
	/// Configuration options specific to the GitHub API.
	#[serde(default)]
	pub github_api: crate::github_api::Config,
	/// Configuration options for the `poll` and `once` run modes.
	#[serde(default)]
	pub polling: crate::polling::Config,
	/// The watched repositories and where to relay their events to.
	pub watchers: Watchers,
}

/// How this service learns about repository activity.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode
{
	/// Serve an HTTP endpoint receiving GitHub webhook deliveries.
	#[default]
	Api,
	/// Poll the GitHub events API periodically.
	Poll,
	/// Poll the GitHub events API once and exit.
	Once,
}

/// The kind of notification backend relaying a repository’s events.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend
{
	/// Post to a chat incoming webhook.
	#[default]
	Chat,
	/// Announce with a local text-to-speech command.
	Speech,
	/// Record messages only (and relay them to the chat webhook if `relay` is set).
	Test,
}

/// A watched repository and the destination its events are relayed to.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct Watcher
{
	/// The name of the repository (without the organization).
	pub repo: String,
	/// The chat incoming webhook URL (required for the chat backend).
	#[serde(default)]
	pub webhook: Option<url::Url>,
	#[serde(default)]
	pub backend: Backend,
	#[serde(default)]
	pub format: crate::dispatchers::ChatFormat,
	/// The text-to-speech program used by the speech backend (optional, default: `say`).
	#[serde(default = "default_speech_command")]
	pub speech_command: String,
	/// Whether the test backend also delivers messages to the chat webhook.
	#[serde(default)]
	pub relay: bool,
	/// Whether the test backend fails every delivery.
	#[serde(default)]
	pub fail: bool,
}

/// The static routing table of watched repositories.
#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(transparent)]
pub struct Watchers(Vec<Watcher>);

impl Watchers
{
	/// Find the watcher of a repository, ignoring case.
	#[allow(dead_code)]
	pub fn select(&self, repo: &str) -> Option<&Watcher>
	{
		let repo = repo.to_lowercase();

		self.0.iter().find(|watcher| watcher.repo.to_lowercase() == repo)
	}

	/// The names of all watched repositories.
	pub fn repos(&self) -> Vec<&str>
	{
		self.0.iter().map(|watcher| watcher.repo.as_str()).collect()
	}

	pub fn iter(&self) -> impl Iterator<Item = &Watcher>
	{
		self.0.iter()
	}
}

#[doc(hidden)]
fn default_listen_address() -> std::net::SocketAddr
{
	([127, 0, 0, 1], 2342).into()
}

#[doc(hidden)]
fn default_speech_command() -> String
{
	"say".to_string()
}

impl Config
{
	/// Attempt to read and parse the configuration from a YAML file.
	///
	/// The GitHub API token can be provided through the `API_TOKEN` environment variable instead
	/// of the configuration file, which takes precedence if set.
	///
	/// # Arguments
	/// `path`: Path to the configuration file in YAML format.
	pub fn from_file<P>(path: P) -> Result<Self, crate::Error>
	where
		P: AsRef<std::path::Path>
	{
		let yaml = std::fs::read_to_string(&path).map_err(crate::Error::ReadConfigFile)?;
		let mut config = Self::from_yaml(&yaml)?;

		if let Ok(token) = std::env::var("API_TOKEN")
		{
			config.github_api.set_token(token);
		}

		Ok(config)
	}

	/// Parse and validate the configuration from a YAML string.
	pub fn from_yaml(yaml: &str) -> Result<Self, crate::Error>
	{
		let config: Self = serde_yaml::from_str(yaml).map_err(crate::Error::ParseConfigFile)?;

		config.validate()?;

		Ok(config)
	}

	/// Check that the configuration is consistent.
	pub fn validate(&self) -> Result<(), crate::Error>
	{
		for watcher in self.watchers.iter()
		{
			let needs_webhook = match watcher.backend
			{
				Backend::Chat => true,
				Backend::Test => watcher.relay,
				Backend::Speech => false,
			};

			if needs_webhook && watcher.webhook.is_none()
			{
				return Err(crate::Error::MissingWebhookUrl(watcher.repo.clone()));
			}
		}

		if self.run_mode != RunMode::Api && self.github_api.organization().is_empty()
		{
			return Err(crate::Error::MissingOrganization);
		}

		Ok(())
	}
}

/// All errors that may occur during initialization, while handling webhook requests, or while
/// polling for repository events.
#[derive(Debug, thiserror::Error)]
pub enum Error
{
	#[error("could not read config file")]
	ReadConfigFile(#[source] std::io::Error),
	#[error("could not parse config file")]
	ParseConfigFile(#[source] serde_yaml::Error),
	#[error("watcher for repository “{0}” delivers to a chat webhook but has no webhook URL")]
	MissingWebhookUrl(String),
	#[error("polling requires the GitHub organization to be configured")]
	MissingOrganization,

	#[error("could not create HTTP client")]
	CreateHttpClient(#[source] reqwest::Error),

	#[error("could not parse URL")]
	ParseUrl(#[source] url::ParseError),
	#[error("could not make GitHub API request")]
	MakeGitHubApiRequest(#[source] reqwest::Error),
	#[error("received GitHub API client error (status code {status_code}): {response_body}")]
	ReceivedGitHubApiClientError
	{
		status_code: reqwest::StatusCode,
		url: url::Url,
		response_body: String,
	},
	#[error("could not decode GitHub API response body")]
	DecodeGitHubApiResponseBody(#[source] serde_json::Error),
	#[error("could not find a display name for user “{0}”")]
	MissingDisplayName(String),
	#[error("could not fetch events of repository “{repo}”")]
	FetchRepositoryEvents
	{
		repo: String,
		#[source]
		source: Box<Error>,
	},

	#[error("could not decode {kind} payload")]
	DecodePayloadBody
	{
		kind: String,
		#[source]
		source: serde_json::Error,
	},
	#[error("unknown event type: {0}")]
	UnknownEventType(String),
	#[error("could not decode payload of {kind} {event_id}")]
	DecodeEventPayload
	{
		event_id: String,
		kind: String,
		#[source]
		source: serde_json::Error,
	},
	#[error("could not parse commit: {0}")]
	MalformedCommit(String),

	#[error("couldn't find dispatcher to match repo: {0}")]
	NoDispatcher(String),
	#[error("could not send message to chat webhook")]
	SendChatMessage(#[source] reqwest::Error),
	#[error("received non-success response from chat webhook (status code {status_code}): \
		{response_body}")]
	ReceivedChatWebhookError
	{
		status_code: reqwest::StatusCode,
		response_body: String,
	},
	#[error("could not run speech command “{command}”")]
	RunSpeechCommand
	{
		command: String,
		#[source]
		source: std::io::Error,
	},
	#[error("speech command “{command}” failed ({status})")]
	SpeechCommandFailed
	{
		command: String,
		status: std::process::ExitStatus,
	},
	#[error("configured error")]
	ConfiguredFailure,

	#[error("could not read history file")]
	ReadHistoryFile(#[source] std::io::Error),
	#[error("could not write history file")]
	WriteHistoryFile(#[source] std::io::Error),
}

impl Error
{
	/// Render this error along with all of its sources on a single line, as used in the `reason`
	/// entries of client error responses.
	pub fn chain(&self) -> String
	{
		let mut chain = self.to_string();
		let mut source = std::error::Error::source(self);

		while let Some(error) = source
		{
			chain.push_str(": ");
			chain.push_str(&error.to_string());
			source = std::error::Error::source(error);
		}

		chain
	}
}

// Allow this crate’s error type to be used for failed HTTP responses
impl warp::reject::Reject for Error
{
}

#[cfg(test)]
mod tests
{
	#[test]
	fn chain_includes_sources()
	{
		let source = serde_json::from_str::<u32>("\"nope\"").unwrap_err();
		let error = crate::Error::DecodePayloadBody{kind: "push".to_string(), source};

		let chain = error.chain();

		assert!(chain.starts_with("could not decode push payload: "));
		assert!(chain.contains("invalid type"));
	}

	#[test]
	fn routing_error_names_repository()
	{
		let error = crate::Error::NoDispatcher("proj".to_string());

		assert_eq!(error.to_string(), "couldn't find dispatcher to match repo: proj");
	}
}

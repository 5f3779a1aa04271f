/// Configuration of the GitHub API client.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct Config
{
	/// The base URL of the GitHub API server with a trailing slash (optional, default:
	/// <https://api.github.com/>).
	#[serde(default = "github_com_api_base_url")]
	base_url: url::Url,
	/// The slug of the organization owning the watched repositories, as included in URLs (for an
	/// organization with the URL <https://github.com/example-organization>, this would be
	/// `example-organization`). Required for polling.
	#[serde(default)]
	organization: String,
	/// Personal access token used to authenticate with the GitHub API (optional, but unauthenticated
	/// requests are subject to very low rate limits). Can also be provided via `API_TOKEN`.
	#[serde(default)]
	token: Option<String>,
	/// Time after which API requests are abandoned (optional, default: 30 seconds).
	#[serde(default = "default_timeout_seconds")]
	timeout_seconds: u64,
}

#[doc(hidden)]
fn github_com_api_base_url() -> url::Url
{
	url::Url::parse("https://api.github.com/")
		.expect("this call is infallible because we know the URL to be well-formed")
}

#[doc(hidden)]
fn default_timeout_seconds() -> u64
{
	30
}

impl Default for Config
{
	fn default() -> Self
	{
		Self
		{
			base_url: github_com_api_base_url(),
			organization: String::new(),
			token: None,
			timeout_seconds: default_timeout_seconds(),
		}
	}
}

impl Config
{
	pub fn organization(&self) -> &str
	{
		&self.organization
	}

	#[doc(hidden)]
	pub(crate) fn set_token(&mut self, token: String)
	{
		self.token = Some(token);
	}
}

/// A GitHub API client for reading repository events and user profiles of a single organization.
///
/// The client can safely be shared between threads, which is achieved by internally using
/// thread-safe handles to the underlying data structures. This allows the client to be used in
/// request handlers asynchronously and concurrently.
#[derive(Clone)]
pub struct Client
{
	#[doc(hidden)]
	config: std::sync::Arc<Config>,
	#[doc(hidden)]
	reqwest_client: reqwest::Client,
}

impl Client
{
	/// Initialize a new GitHub API client with a given configuration.
	pub fn from_config(config: Config) -> Result<Self, crate::Error>
	{
		let timeout = std::time::Duration::from_secs(config.timeout_seconds);

		if config.token.is_none()
		{
			log::warn!("no GitHub API token configured, requests are subject to low rate limits");
		}

		let reqwest_client = reqwest::ClientBuilder::new()
			// Set a recognizable user agent to get meaningful debugging information from GitHub
			.user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
			.timeout(timeout)
			.build().map_err(crate::Error::CreateHttpClient)?;

		Ok(Self
		{
			config: std::sync::Arc::new(config),
			reqwest_client,
		})
	}

	/// Make an HTTP GET request to the GitHub API.
	///
	/// # Arguments
	/// - `endpoint`: The API endpoint (without host and leading slash, example:
	///   `repos/example_organization/example_repository/events`).
	pub async fn get<S, R>(&self, endpoint: S) -> Result<R, crate::Error>
	where
		S: AsRef<str>,
		R: serde::de::DeserializeOwned,
	{
		self.request(reqwest::Method::GET, endpoint).await
	}

	/// Fetch the most recent public events of a repository in the configured organization.
	///
	/// # Arguments
	/// - `repo`: The name of the repository (without the organization).
	pub async fn repository_events(&self, repo: &str)
		-> Result<Vec<crate::repository_events::Event>, crate::Error>
	{
		log::debug!("fetching events of repository “{}/{repo}”", self.config.organization);

		self.get(format!("repos/{}/{repo}/events", self.config.organization)).await
	}

	/// Look up the human-readable name of a user by their login.
	///
	/// Names of the form `Last, First` are rearranged to `First Last`.
	pub async fn display_name(&self, login: &str) -> Result<String, crate::Error>
	{
		let user: UserResponse = self.get(format!("users/{login}")).await?;

		user.name.as_deref()
			.and_then(display_name_from_profile_name)
			.ok_or_else(|| crate::Error::MissingDisplayName(login.to_string()))
	}

	#[doc(hidden)]
	async fn request<S, R>(&self, method: reqwest::Method, endpoint: S) -> Result<R, crate::Error>
	where
		S: AsRef<str>,
		R: serde::de::DeserializeOwned,
	{
		// Build the API endpoint URL from the base URL and the endpoint path
		let url = self.config.base_url.join(endpoint.as_ref()).map_err(crate::Error::ParseUrl)?;
		let mut request = self.reqwest_client.request(method, url)
			// Request the v3 REST API, as recommended by GitHub’s documentation
			.header(reqwest::header::ACCEPT, "application/vnd.github.v3+json");

		if let Some(token) = &self.config.token
		{
			request = request.bearer_auth(token);
		}

		let response = request.send().await.map_err(crate::Error::MakeGitHubApiRequest)?;

		// Return an error if there was a client error according to the response’s HTTP status
		if response.status().is_client_error()
		{
			let status_code = response.status();
			let url = response.url().to_owned();

			// Decode the body for debugging purposes
			let response_body = response.text().await
				.map_err(crate::Error::MakeGitHubApiRequest)?;

			return Err(crate::Error::ReceivedGitHubApiClientError{status_code, url, response_body});
		}

		let mut response_body = response
			// Return an error if there was a server error according to the response’s HTTP status
			.error_for_status().map_err(crate::Error::MakeGitHubApiRequest)?
			// Read the full response if there was no server error
			.bytes().await.map_err(crate::Error::MakeGitHubApiRequest)?;

		// Allow deserializing empty responses as empty dictionaries instead, as empty strings are
		// invalid JSON
		if response_body.is_empty()
		{
			response_body = "{}".as_bytes().into();
		}

		serde_json::from_slice(&response_body).map_err(crate::Error::DecodeGitHubApiResponseBody)
	}
}

/// Resolve the name to announce for a user, falling back to their login.
///
/// Lookup failures are logged and never fail the caller.
///
/// # Arguments
/// - `client`: The GitHub API client, if one is configured.
/// - `login`: The login of the user.
pub async fn resolve_display_name(client: Option<&Client>, login: &str) -> String
{
	let client = match client
	{
		Some(client) => client,
		None => return login.to_string(),
	};

	match client.display_name(login).await
	{
		Ok(display_name) => display_name,
		Err(error) =>
		{
			log::warn!("could not look up display name of user “{login}”, using login instead");
			log::warn!("{:?}", anyhow::Error::from(error));
			login.to_string()
		},
	}
}

/// Turn the name of a GitHub profile into the name to announce.
#[doc(hidden)]
fn display_name_from_profile_name(name: &str) -> Option<String>
{
	let name = name.trim();

	if name.is_empty()
	{
		return None;
	}

	match name.split_once(',')
	{
		Some((last, first)) if !first.trim().is_empty() =>
			Some(format!("{} {}", first.trim(), last.trim())),
		_ => Some(name.to_string()),
	}
}

/// Response from a request to retrieve a user’s profile.
#[doc(hidden)]
#[derive(Debug, serde::Deserialize)]
struct UserResponse
{
	#[serde(default)]
	name: Option<String>,
	// We just need the name, so ignore all other fields
}

#[cfg(test)]
mod tests
{
	use super::{Client, Config};

	/// Start a fake GitHub API answering user and event requests for the organization `acme`.
	async fn fake_github_api() -> url::Url
	{
		use warp::Filter as _;

		let users = warp::path!("users" / String)
			.map(|login: String| match login.as_str()
			{
				"alice" => warp::reply::with_status(
					warp::reply::json(&serde_json::json!({"login": "alice", "name": "Example, Alice"})),
					warp::http::StatusCode::OK),
				"bob" => warp::reply::with_status(
					warp::reply::json(&serde_json::json!({"login": "bob", "name": null})),
					warp::http::StatusCode::OK),
				_ => warp::reply::with_status(
					warp::reply::json(&serde_json::json!({"message": "Not Found"})),
					warp::http::StatusCode::NOT_FOUND),
			});

		let events = warp::path!("repos" / "acme" / "proj" / "events")
			.and(warp::header::optional::<String>("authorization"))
			.map(|authorization: Option<String>|
			{
				assert_eq!(authorization.as_deref(), Some("Bearer secret"));

				warp::reply::json(&serde_json::json!([{
					"id": "1",
					"type": "PushEvent",
					"actor": {"login": "alice"},
					"repo": {"name": "acme/proj"},
					"payload": {"ref": "refs/heads/main", "commits": []},
					"created_at": "2024-03-01T12:00:00Z",
				}]))
			});

		let (address, server) = warp::serve(users.or(events)).bind_ephemeral(([127, 0, 0, 1], 0));
		tokio::spawn(server);

		url::Url::parse(&format!("http://{address}/")).unwrap()
	}

	fn client(base_url: url::Url) -> Client
	{
		Client::from_config(Config
		{
			base_url,
			organization: "acme".to_string(),
			token: Some("secret".to_string()),
			..Config::default()
		}).unwrap()
	}

	#[test]
	fn profile_names()
	{
		assert_eq!(super::display_name_from_profile_name("Example, Alice").as_deref(),
			Some("Alice Example"));
		assert_eq!(super::display_name_from_profile_name("Alice Example").as_deref(),
			Some("Alice Example"));
		assert_eq!(super::display_name_from_profile_name("Example,").as_deref(), Some("Example,"));
		assert_eq!(super::display_name_from_profile_name("  "), None);
	}

	#[tokio::test]
	async fn fetches_repository_events()
	{
		let client = client(fake_github_api().await);

		let events = client.repository_events("proj").await.unwrap();

		assert_eq!(events.len(), 1);
		assert_eq!(events[0].type_, "PushEvent");
		assert_eq!(events[0].repo.name, "acme/proj");
	}

	#[tokio::test]
	async fn client_errors_include_status_code()
	{
		let client = client(fake_github_api().await);

		let error = client.repository_events("missing").await.unwrap_err();

		assert!(matches!(error, crate::Error::ReceivedGitHubApiClientError{status_code, ..}
			if status_code == reqwest::StatusCode::NOT_FOUND));
	}

	#[tokio::test]
	async fn display_names()
	{
		let client = client(fake_github_api().await);

		assert_eq!(client.display_name("alice").await.unwrap(), "Alice Example");
		assert!(matches!(client.display_name("bob").await,
			Err(crate::Error::MissingDisplayName(ref login)) if login == "bob"));

		assert_eq!(super::resolve_display_name(Some(&client), "alice").await, "Alice Example");
		assert_eq!(super::resolve_display_name(Some(&client), "bob").await, "bob");
		assert_eq!(super::resolve_display_name(Some(&client), "carol").await, "carol");
		assert_eq!(super::resolve_display_name(None, "alice").await, "alice");
	}

	#[test]
	fn default_config()
	{
		let config = Config::default();

		assert_eq!(config.base_url.as_str(), "https://api.github.com/");
		assert_eq!(config.organization(), "");
		assert_eq!(config.timeout_seconds, 30);
	}
}

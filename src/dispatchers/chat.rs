/// Shape of the JSON body posted to a chat webhook.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatFormat
{
	/// A single `mrkdwn` section block (`{"blocks": [...]}`).
	#[default]
	Blocks,
	/// A flat message (`{"text": "..."}`).
	Text,
}

/// Dispatcher posting messages to a chat incoming webhook (such as Slack’s).
pub struct ChatDispatcher
{
	#[doc(hidden)]
	repo: String,
	#[doc(hidden)]
	url: url::Url,
	#[doc(hidden)]
	format: ChatFormat,
	#[doc(hidden)]
	reqwest_client: reqwest::Client,
}

impl ChatDispatcher
{
	/// Create a dispatcher for a repository.
	///
	/// # Arguments
	/// - `repo`: The name of the repository whose messages are delivered.
	/// - `url`: The incoming webhook URL.
	/// - `format`: The shape of the posted JSON body.
	/// - `reqwest_client`: The HTTP client to use, which should have a request timeout configured.
	pub fn new(repo: &str, url: url::Url, format: ChatFormat, reqwest_client: reqwest::Client)
		-> Self
	{
		Self
		{
			repo: repo.to_string(),
			url,
			format,
			reqwest_client,
		}
	}

	/// Build the JSON body for a message.
	pub fn payload(&self, message: &str) -> serde_json::Value
	{
		match self.format
		{
			ChatFormat::Text => serde_json::json!({"text": message}),
			ChatFormat::Blocks => serde_json::json!({
				"blocks": [
					{
						"type": "section",
						"text": {"type": "mrkdwn", "text": message},
					},
				],
			}),
		}
	}
}

#[async_trait::async_trait]
impl super::Dispatcher for ChatDispatcher
{
	fn repo(&self) -> &str
	{
		&self.repo
	}

	async fn send_message(&self, message: &str) -> Result<(), crate::Error>
	{
		let response = self.reqwest_client.post(self.url.clone())
			.json(&self.payload(message))
			.send().await.map_err(crate::Error::SendChatMessage)?;

		let status_code = response.status();

		// Chat webhooks acknowledge messages with exactly 200 OK
		if status_code != reqwest::StatusCode::OK
		{
			// Keep the body for debugging purposes, but don’t fail just because it can’t be read
			let response_body = response.text().await.unwrap_or_default();

			log::error!("non-200 response from chat webhook for repository “{}” (status code \
				{status_code}): {response_body}", self.repo);

			return Err(crate::Error::ReceivedChatWebhookError{status_code, response_body});
		}

		log::debug!("delivered message for repository “{}” to chat webhook", self.repo);

		Ok(())
	}
}

#[cfg(test)]
mod tests
{
	use super::{ChatDispatcher, ChatFormat};
	use crate::dispatchers::Dispatcher as _;
	use warp::Filter as _;

	/// Serve a fake chat webhook on an ephemeral port that answers with the given status code and
	/// forwards every received body to the returned channel.
	fn serve_webhook(status_code: warp::http::StatusCode)
		-> (url::Url, tokio::sync::mpsc::UnboundedReceiver<serde_json::Value>)
	{
		let (sender, receiver) = tokio::sync::mpsc::unbounded_channel();

		let route = warp::post()
			.and(warp::body::json())
			.map(move |body: serde_json::Value|
			{
				let _ = sender.send(body);
				warp::reply::with_status("ok", status_code)
			});

		let (address, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
		tokio::spawn(server);

		let url = url::Url::parse(&format!("http://{address}/services/hook")).unwrap();

		(url, receiver)
	}

	#[test]
	fn payload_formats()
	{
		let url = url::Url::parse("https://hooks.slack.com/services/T000/B000/XXXX").unwrap();

		let text = ChatDispatcher::new("proj", url.clone(), ChatFormat::Text, reqwest::Client::new());
		assert_eq!(text.payload("hello \"world\""), serde_json::json!({"text": "hello \"world\""}));

		let blocks = ChatDispatcher::new("proj", url, ChatFormat::Blocks, reqwest::Client::new());
		assert_eq!(blocks.payload("hello")["blocks"][0], serde_json::json!({
			"type": "section",
			"text": {"type": "mrkdwn", "text": "hello"},
		}));
	}

	#[tokio::test]
	async fn delivers_message()
	{
		let (url, mut receiver) = serve_webhook(warp::http::StatusCode::OK);
		let dispatcher = ChatDispatcher::new("proj", url, ChatFormat::Text, reqwest::Client::new());

		dispatcher.send_message("*bold* news").await.unwrap();

		assert_eq!(receiver.recv().await, Some(serde_json::json!({"text": "*bold* news"})));
	}

	#[tokio::test]
	async fn non_200_response_is_delivery_error()
	{
		let (url, _receiver) = serve_webhook(warp::http::StatusCode::NOT_FOUND);
		let dispatcher = ChatDispatcher::new("proj", url, ChatFormat::Blocks, reqwest::Client::new());

		let error = dispatcher.send_message("hello").await.unwrap_err();

		match &error
		{
			crate::Error::ReceivedChatWebhookError{status_code, response_body} =>
			{
				assert_eq!(*status_code, reqwest::StatusCode::NOT_FOUND);
				assert_eq!(response_body, "ok");
			},
			error => panic!("unexpected error: {error:?}"),
		}

		assert!(error.to_string().contains("404"));
	}

	#[tokio::test]
	async fn other_success_statuses_are_failures_too()
	{
		let (url, _receiver) = serve_webhook(warp::http::StatusCode::ACCEPTED);
		let dispatcher = ChatDispatcher::new("proj", url, ChatFormat::Text, reqwest::Client::new());

		assert!(dispatcher.send_message("hello").await.is_err());
	}
}

use crate::markdown;
use crate::models::{Repository, User};
use crate::payloads::*;

/// The webhook event kinds that are decoded and rendered.
pub const SUPPORTED_KINDS: &[&str] = &["create", "gollum", "issue_comment", "issues",
	"project_card", "project_column", "pull_request", "pull_request_review",
	"pull_request_review_comment", "push"];

/// The result of classifying a webhook delivery by its `X-GitHub-Event` header.
#[derive(Debug)]
pub enum Classification
{
	/// A supported event that should be rendered and relayed.
	Event(WebhookEvent),
	/// A delivery that deliberately doesn’t result in a notification.
	Skip(SkipReason),
}

#[derive(Debug, Eq, PartialEq)]
pub enum SkipReason
{
	/// GitHub checks that the webhook is reachable.
	Ping,
	/// Commit status updates are too noisy to relay.
	Status,
	/// An event kind we don’t know how to render.
	Unknown(String),
}

impl std::fmt::Display for SkipReason
{
	fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result
	{
		match self
		{
			Self::Ping => write!(formatter, "ping event"),
			Self::Status => write!(formatter, "status event"),
			Self::Unknown(kind) => write!(formatter, "unknown event “{kind}”"),
		}
	}
}

/// A webhook event payload as delivered by the GitHub server, decoded according to its kind.
#[derive(Clone, Debug)]
pub struct WebhookEvent
{
	/// The repository for which this event is reported.
	pub repository: Repository,
	/// Record of the user causing this event.
	pub sender: User,
	pub payload: WebhookPayload,
}

/// Kind-specific part of a webhook event, one variant per supported `X-GitHub-Event` value.
#[derive(Clone, Debug)]
pub enum WebhookPayload
{
	Create(CreatePayload),
	Gollum(GollumPayload),
	IssueComment(IssueCommentPayload),
	Issues(IssuesPayload),
	ProjectCard(ProjectCardPayload),
	ProjectColumn(ProjectColumnPayload),
	PullRequest(PullRequestPayload),
	PullRequestReview(PullRequestReviewPayload),
	PullRequestReviewComment(PullRequestReviewCommentPayload),
	Push(PushPayload),
}

/// The top-level fields every webhook payload carries next to its kind-specific fields.
#[doc(hidden)]
#[derive(serde::Deserialize)]
struct Envelope<T>
{
	#[serde(default)]
	repository: Repository,
	#[serde(default)]
	sender: User,
	#[serde(flatten)]
	payload: T,
}

#[doc(hidden)]
fn decode<T>(kind: &str, body: &[u8]) -> Result<(Repository, User, T), crate::Error>
where
	T: serde::de::DeserializeOwned,
{
	let envelope: Envelope<T> = serde_json::from_slice(body)
		.map_err(|source| crate::Error::DecodePayloadBody{kind: kind.to_string(), source})?;

	Ok((envelope.repository, envelope.sender, envelope.payload))
}

impl WebhookEvent
{
	/// Classify a webhook delivery by its event kind and decode its payload.
	///
	/// Kinds are matched exactly against GitHub’s `X-GitHub-Event` vocabulary. `ping` and `status`
	/// deliveries as well as unknown kinds are skipped without looking at the body. A body that
	/// doesn’t match the schema of a supported kind is an error.
	///
	/// # Arguments
	/// - `kind`: The value of the `X-GitHub-Event` header.
	/// - `body`: The raw JSON payload.
	pub fn classify(kind: &str, body: &[u8]) -> Result<Classification, crate::Error>
	{
		macro_rules! decode_as
		{
			($variant:ident) =>
			{
				{
					let (repository, sender, payload) = decode(kind, body)?;
					WebhookEvent{repository, sender, payload: WebhookPayload::$variant(payload)}
				}
			};
		}

		let event = match kind
		{
			"create" => decode_as!(Create),
			"gollum" => decode_as!(Gollum),
			"issue_comment" => decode_as!(IssueComment),
			"issues" => decode_as!(Issues),
			"project_card" => decode_as!(ProjectCard),
			"project_column" => decode_as!(ProjectColumn),
			"pull_request" => decode_as!(PullRequest),
			"pull_request_review" => decode_as!(PullRequestReview),
			"pull_request_review_comment" => decode_as!(PullRequestReviewComment),
			"push" => decode_as!(Push),
			"ping" => return Ok(Classification::Skip(SkipReason::Ping)),
			"status" => return Ok(Classification::Skip(SkipReason::Status)),
			_ => return Ok(Classification::Skip(SkipReason::Unknown(kind.to_string()))),
		};

		Ok(Classification::Event(event))
	}

	/// The `X-GitHub-Event` value this event was classified as.
	pub fn event_type(&self) -> &'static str
	{
		match self.payload
		{
			WebhookPayload::Create(_) => "create",
			WebhookPayload::Gollum(_) => "gollum",
			WebhookPayload::IssueComment(_) => "issue_comment",
			WebhookPayload::Issues(_) => "issues",
			WebhookPayload::ProjectCard(_) => "project_card",
			WebhookPayload::ProjectColumn(_) => "project_column",
			WebhookPayload::PullRequest(_) => "pull_request",
			WebhookPayload::PullRequestReview(_) => "pull_request_review",
			WebhookPayload::PullRequestReviewComment(_) => "pull_request_review_comment",
			WebhookPayload::Push(_) => "push",
		}
	}

	/// The login of the user who triggered the event.
	pub fn username(&self) -> &str
	{
		&self.sender.login
	}

	/// The name of the repository the event happened in.
	pub fn repository(&self) -> &str
	{
		&self.repository.name
	}

	/// Problems encountered while interpreting the payload that didn’t prevent rendering it.
	pub fn warnings(&self) -> Vec<crate::Error>
	{
		match &self.payload
		{
			WebhookPayload::Push(push) => push.commit_messages().1,
			_ => Vec::new(),
		}
	}

	/// Render a chat message summarizing this event, to be prefixed with the name of the user who
	/// triggered it.
	///
	/// An empty summary means that this event is deliberately not relayed.
	pub fn summary(&self) -> String
	{
		match &self.payload
		{
			WebhookPayload::Create(create) =>
			{
				let ref_type = match create.ref_type.as_str()
				{
					"" => "branch",
					ref_type => ref_type,
				};

				match create.ref_.is_empty()
				{
					true => format!("created a {ref_type}"),
					false => format!("created a {ref_type}: {}", markdown::code(&create.ref_)),
				}
			},
			WebhookPayload::Gollum(gollum) =>
			{
				let pages = gollum.pages.iter()
					.map(|page| link_or_text(&page.html_url, page.display_name()));

				format!("updated some wiki content:\n{}", markdown::list(pages).trim_end())
			},
			WebhookPayload::IssueComment(issue_comment) => with_code_block(
				format!("{} on an issue: {}", issue_comment.action,
					link_or_text(&issue_comment.issue.html_url, &issue_comment.issue.title)),
				&issue_comment.comment.body),
			WebhookPayload::Issues(issues) => with_code_block(
				format!("{} an issue: {}", issues.action,
					link_or_text(&issues.issue.html_url, &issues.issue.title)),
				&issues.issue.body),
			WebhookPayload::ProjectCard(project_card) =>
			{
				let card = &project_card.project_card;
				let summary = format!("{} a card", project_card.action);

				match card.note.is_empty()
				{
					true => summary,
					false => format!("{summary}:\n{}", markdown::quote(&card.note)),
				}
			},
			WebhookPayload::ProjectColumn(project_column) => format!("{} a column: {}",
				project_column.action, markdown::bold(&project_column.project_column.name)),
			WebhookPayload::PullRequest(pull_request) => render_pull_request(pull_request),
			WebhookPayload::PullRequestReview(review) =>
			{
				let pull_request = &review.pull_request;
				let summary = format!("{} a pull request review for {}\nState: {}", review.action,
					link_or_text(&pull_request.html_url, &pull_request.title),
					markdown::bold(&review.review.state));

				with_code_block(summary, &review.review.body)
			},
			WebhookPayload::PullRequestReviewComment(review_comment) =>
			{
				let pull_request = &review_comment.pull_request;
				let mut summary = format!("{} a comment on a pull request review for {}",
					review_comment.action, link_or_text(&pull_request.html_url, &pull_request.title));

				if !review_comment.comment.path.is_empty()
				{
					summary += &format!(" in {}", markdown::code(&review_comment.comment.path));
				}

				with_code_block(summary, &review_comment.comment.body)
			},
			WebhookPayload::Push(push) =>
			{
				let header = format!("pushed some changes to {}",
					markdown::code(crate::models::short_ref_name(&push.ref_)));
				let header = match push.compare.is_empty()
				{
					true => header,
					false => markdown::link(&push.compare, &header),
				};
				let (messages, _) = push.commit_messages();

				match messages.is_empty()
				{
					true => header,
					false => format!("{header}\n{}\n{}", markdown::italic("Commits"),
						markdown::multiline_code(&messages.join("\n"))),
				}
			},
		}
	}
}

/// Pull requests are only relayed for actions people care about. Everything else, such as
/// synchronizations and review requests, renders to an empty summary.
#[doc(hidden)]
fn render_pull_request(payload: &PullRequestPayload) -> String
{
	let pull_request = &payload.pull_request;
	let title = link_or_text(&pull_request.html_url, &pull_request.title);

	match payload.action.as_str()
	{
		"opened" | "edited" => with_code_block(
			format!("{} a pull request: {title}", payload.action), &pull_request.body),
		"labeled" =>
		{
			let labels = pull_request.labels.iter().map(|label| markdown::code(&label.name));

			format!("labeled a pull request: {title}\n{}\n{}", markdown::italic("Labels"),
				markdown::list(labels).trim_end())
		},
		"closed" if pull_request.merged => format!("merged a pull request: {title}"),
		"closed" => format!("closed a pull request: {title}"),
		_ => String::new(),
	}
}

#[doc(hidden)]
fn link_or_text(url: &str, text: &str) -> String
{
	match url.is_empty()
	{
		true => text.to_string(),
		false => markdown::link(url, text),
	}
}

/// Append `body` as a code block on a new line unless it’s empty.
#[doc(hidden)]
fn with_code_block(summary: String, body: &str) -> String
{
	match body.trim().is_empty()
	{
		true => summary,
		false => format!("{summary}\n{}", markdown::multiline_code(body)),
	}
}

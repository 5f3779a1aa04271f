use crate::payloads::*;

/// Placeholder for the name of the user who triggered an event.
pub const ACTOR_PLACEHOLDER: &str = "#{actor}";
/// Placeholder for the (spoken) name of the branch an event refers to.
pub const BRANCH_PLACEHOLDER: &str = "#{branch}";
/// Placeholder for the comment an event refers to.
pub const COMMENT_PLACEHOLDER: &str = "#{comment}";

/// User who performed an event, as reported by the events API.
#[derive(Clone, Debug, Default, serde::Deserialize, serde::Serialize)]
pub struct Actor
{
	#[serde(default)]
	pub login: String,
	/// The login as displayed on GitHub, which may differ from `login` for bots.
	#[serde(default)]
	pub display_login: Option<String>,
}

/// Repository an event happened in, as reported by the events API.
#[derive(Clone, Debug, Default, serde::Deserialize, serde::Serialize)]
pub struct EventRepository
{
	/// The full name of the repository, including its owner (example: `acme/widgets`).
	pub name: String,
}

/// A raw event record as returned by the GitHub events API.
#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct Event
{
	pub id: String,
	/// The type of the event (example: `PushEvent`).
	#[serde(rename = "type")]
	pub type_: String,
	#[serde(default)]
	pub actor: Actor,
	#[serde(default)]
	pub repo: EventRepository,
	/// Kind-specific payload, decoded once the event type is known.
	#[serde(default)]
	pub payload: serde_json::Value,
	pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Event
{
	/// The event type split into words (`PullRequestEvent` becomes `Pull Request Event`).
	pub fn humanized_type(&self) -> String
	{
		let mut humanized = String::with_capacity(self.type_.len() + 4);

		for character in self.type_.chars()
		{
			if character.is_uppercase() && !humanized.is_empty()
			{
				humanized.push(' ');
			}

			humanized.push(character);
		}

		humanized
	}
}

/// Kind-specific details of an event from the events API.
#[derive(Clone, Debug)]
pub enum EventDetails
{
	Create(CreatePayload),
	Gollum(GollumPayload),
	IssueComment(IssueCommentPayload),
	Issues(IssuesPayload),
	ProjectCard(ProjectCardPayload),
	PullRequest(PullRequestPayload),
	PullRequestReviewComment(PullRequestReviewCommentPayload),
	Push(PushPayload),
}

/// An event from the GitHub events API, classified by its type.
///
/// Accessors for data that isn’t meaningful to the kind of event return empty strings.
#[derive(Clone, Debug)]
pub struct RepositoryEvent
{
	raw: Event,
	details: EventDetails,
}

impl RepositoryEvent
{
	/// Classify an event by its type and decode its payload.
	pub fn new(raw: Event) -> Result<Self, crate::Error>
	{
		fn decode<T>(raw: &Event) -> Result<T, crate::Error>
		where
			T: serde::de::DeserializeOwned,
		{
			<T as serde::Deserialize>::deserialize(&raw.payload)
				.map_err(|source| crate::Error::DecodeEventPayload
				{
					event_id: raw.id.clone(),
					kind: raw.type_.clone(),
					source,
				})
		}

		let details = match raw.type_.as_str()
		{
			"CreateEvent" => EventDetails::Create(decode(&raw)?),
			"GollumEvent" => EventDetails::Gollum(decode(&raw)?),
			"IssueCommentEvent" => EventDetails::IssueComment(decode(&raw)?),
			"IssuesEvent" => EventDetails::Issues(decode(&raw)?),
			"ProjectCardEvent" => EventDetails::ProjectCard(decode(&raw)?),
			"PullRequestEvent" => EventDetails::PullRequest(decode(&raw)?),
			"PullRequestReviewCommentEvent" => EventDetails::PullRequestReviewComment(decode(&raw)?),
			"PushEvent" => EventDetails::Push(decode(&raw)?),
			_ => return Err(crate::Error::UnknownEventType(raw.type_)),
		};

		Ok(Self{raw, details})
	}

	/// The login of the user who triggered the event.
	pub fn triggered_by(&self) -> &str
	{
		self.raw.actor.display_login.as_deref().unwrap_or(&self.raw.actor.login)
	}

	/// The login of the user who triggered the event, as used for API lookups.
	pub fn username(&self) -> &str
	{
		&self.raw.actor.login
	}

	pub fn event_type(&self) -> &str
	{
		&self.raw.type_
	}

	/// The name of the repository without its owner, as used for routing messages.
	pub fn repository(&self) -> &str
	{
		let name = &self.raw.repo.name;

		name.rsplit('/').next().unwrap_or(name)
	}

	/// The name of the branch the event refers to, in a form suitable for speech.
	pub fn branch_name(&self) -> String
	{
		match &self.details
		{
			EventDetails::Create(create) => create.ref_.clone(),
			EventDetails::PullRequest(pull_request) => pull_request.pull_request.head.ref_.clone(),
			EventDetails::Push(push) => crate::models::spoken_branch_name(&push.ref_),
			_ => String::new(),
		}
	}

	pub fn comment(&self) -> &str
	{
		match &self.details
		{
			EventDetails::IssueComment(issue_comment) => &issue_comment.comment.body,
			EventDetails::PullRequestReviewComment(comment) => &comment.comment.body,
			_ => "",
		}
	}

	#[allow(dead_code)]
	pub fn title(&self) -> &str
	{
		match &self.details
		{
			EventDetails::Issues(issues) => &issues.issue.title,
			EventDetails::PullRequest(pull_request) => &pull_request.pull_request.title,
			_ => "",
		}
	}

	#[allow(dead_code)]
	pub fn body(&self) -> &str
	{
		match &self.details
		{
			EventDetails::Issues(issues) => &issues.issue.body,
			EventDetails::PullRequest(pull_request) => &pull_request.pull_request.body,
			_ => "",
		}
	}

	/// The path to the content the event refers to (a URL, or the pushed ref).
	pub fn path(&self) -> &str
	{
		match &self.details
		{
			EventDetails::IssueComment(issue_comment) => &issue_comment.comment.html_url,
			EventDetails::Issues(issues) => &issues.issue.html_url,
			EventDetails::ProjectCard(project_card) => &project_card.project_card.html_url,
			EventDetails::PullRequest(pull_request) => &pull_request.pull_request.html_url,
			EventDetails::PullRequestReviewComment(comment) => &comment.comment.html_url,
			EventDetails::Push(push) => &push.ref_,
			_ => "",
		}
	}

	pub fn raw(&self) -> &Event
	{
		&self.raw
	}

	#[allow(dead_code)]
	pub fn details(&self) -> &EventDetails
	{
		&self.details
	}

	/// Render the message announcing this event.
	///
	/// The message may contain the placeholders [ACTOR_PLACEHOLDER], [BRANCH_PLACEHOLDER], and
	/// [COMMENT_PLACEHOLDER], which are filled in by [fill_placeholders] before delivery.
	pub fn say(&self) -> String
	{
		match &self.details
		{
			EventDetails::Create(create) =>
			{
				let ref_type = match create.ref_type.as_str()
				{
					"" => "branch",
					ref_type => ref_type,
				};

				match ref_type
				{
					"repository" => format!("{ACTOR_PLACEHOLDER} just created this repository"),
					_ => format!("{ACTOR_PLACEHOLDER} just created a {ref_type} named \
						{BRANCH_PLACEHOLDER}"),
				}
			},
			EventDetails::Gollum(gollum) =>
			{
				let pages = gollum.pages.iter()
					.map(|page| match page.html_url.is_empty()
					{
						true => page.display_name(),
						false => page.html_url.as_str(),
					})
					.collect::<Vec<_>>();

				format!("{ACTOR_PLACEHOLDER} just edited some wiki content:\n{}", pages.join("\n"))
			},
			EventDetails::IssueComment(issue_comment) => format!("{ACTOR_PLACEHOLDER} just \
				commented on an issue with the title: {}, here’s the comment: \
				{COMMENT_PLACEHOLDER}", issue_comment.issue.title),
			EventDetails::Issues(issues) => format!("{ACTOR_PLACEHOLDER} just {} an issue with \
				the title: {}", issues.action, issues.issue.title),
			EventDetails::ProjectCard(project_card) =>
			{
				let note = &project_card.project_card.note;

				match note.is_empty()
				{
					true => format!("{ACTOR_PLACEHOLDER} just {} a project card", project_card.action),
					false => format!("{ACTOR_PLACEHOLDER} just {} a project card: {note}",
						project_card.action),
				}
			},
			EventDetails::PullRequest(pull_request) => format!("{ACTOR_PLACEHOLDER} just {} a pull \
				request with the title: {}", pull_request.action, pull_request.pull_request.title),
			EventDetails::PullRequestReviewComment(comment) => format!("{ACTOR_PLACEHOLDER} just \
				commented on a pull request with the title: {},\nthe comment was in the file: {},\n\
				here’s the comment: {COMMENT_PLACEHOLDER}", comment.pull_request.title,
				comment.comment.path),
			EventDetails::Push(push) =>
			{
				let (messages, _) = push.commit_messages();
				let say = format!("{ACTOR_PLACEHOLDER} just pushed some code to branch \
					{BRANCH_PLACEHOLDER}");

				match messages.is_empty()
				{
					true => say,
					false => format!("{say}\n{}", messages.join("\n")),
				}
			},
		}
	}

	/// Problems encountered while interpreting the payload that didn’t prevent rendering it.
	pub fn warnings(&self) -> Vec<crate::Error>
	{
		match &self.details
		{
			EventDetails::Push(push) => push.commit_messages().1,
			_ => Vec::new(),
		}
	}
}

/// Substitute the placeholders in a rendered message.
///
/// Placeholders are replaced in a fixed order (actor, branch, comment), and only their first
/// occurrence is substituted. Text inserted for one placeholder is never scanned for the
/// placeholders preceding it.
///
/// # Arguments
/// - `message`: The message as rendered by [RepositoryEvent::say].
/// - `actor`: The name to insert for the user who triggered the event.
/// - `event`: The event the message was rendered from.
pub fn fill_placeholders(message: &str, actor: &str, event: &RepositoryEvent) -> String
{
	message
		.replacen(ACTOR_PLACEHOLDER, actor, 1)
		.replacen(BRANCH_PLACEHOLDER, &event.branch_name(), 1)
		.replacen(COMMENT_PLACEHOLDER, event.comment(), 1)
}

#[cfg(test)]
mod tests
{
	use super::RepositoryEvent;

	fn event(type_: &str, payload: serde_json::Value) -> super::Event
	{
		serde_json::from_value(serde_json::json!({
			"id": "12345",
			"type": type_,
			"actor": {"id": 1, "login": "alice", "display_login": "alice"},
			"repo": {"id": 2, "name": "acme/proj"},
			"payload": payload,
			"created_at": "2024-03-01T12:00:00Z",
		})).unwrap()
	}

	#[test]
	fn push_event()
	{
		let event = RepositoryEvent::new(event("PushEvent", serde_json::json!({
			"ref": "refs/heads/feature-x",
			"commits": [{"message": "fix bug"}, 42],
		}))).unwrap();

		assert_eq!(event.event_type(), "PushEvent");
		assert_eq!(event.triggered_by(), "alice");
		assert_eq!(event.username(), "alice");
		assert_eq!(event.repository(), "proj");
		assert_eq!(event.branch_name(), "feature x");
		assert_eq!(event.path(), "refs/heads/feature-x");
		assert_eq!(event.comment(), "");
		assert_eq!(event.title(), "");
		assert_eq!(event.raw().id, "12345");
		assert!(matches!(event.details(), super::EventDetails::Push(_)));

		let say = event.say();
		assert_eq!(say, "#{actor} just pushed some code to branch #{branch}\nfix bug");
		assert_eq!(event.warnings().len(), 1);

		assert_eq!(super::fill_placeholders(&say, "Alice Example", &event),
			"Alice Example just pushed some code to branch feature x\nfix bug");
	}

	#[test]
	fn unknown_event_type()
	{
		let result = RepositoryEvent::new(event("WatchEvent", serde_json::json!({
			"action": "started",
		})));

		let error = result.unwrap_err();
		assert!(matches!(error, crate::Error::UnknownEventType(_)));
		assert_eq!(error.to_string(), "unknown event type: WatchEvent");
	}

	#[test]
	fn malformed_payload()
	{
		let result = RepositoryEvent::new(event("IssuesEvent", serde_json::json!({
			"issue": {"title": "no action"},
		})));

		assert!(matches!(result,
			Err(crate::Error::DecodeEventPayload{ref event_id, ..}) if event_id == "12345"));
	}

	#[test]
	fn accessors_per_kind()
	{
		let issue_comment = RepositoryEvent::new(event("IssueCommentEvent", serde_json::json!({
			"action": "created",
			"issue": {"title": "Broken build"},
			"comment": {"body": "Works for me", "html_url": "https://github.com/acme/proj/issues/1#c"},
		}))).unwrap();

		assert_eq!(issue_comment.comment(), "Works for me");
		assert_eq!(issue_comment.path(), "https://github.com/acme/proj/issues/1#c");
		assert_eq!(issue_comment.branch_name(), "");

		let pull_request = RepositoryEvent::new(event("PullRequestEvent", serde_json::json!({
			"action": "opened",
			"pull_request": {
				"title": "Add feature",
				"body": null,
				"html_url": "https://github.com/acme/proj/pull/2",
				"head": {"ref": "feature-y"},
			},
		}))).unwrap();

		assert_eq!(pull_request.title(), "Add feature");
		assert_eq!(pull_request.body(), "");
		assert_eq!(pull_request.branch_name(), "feature-y");
		assert_eq!(pull_request.path(), "https://github.com/acme/proj/pull/2");
		assert_eq!(pull_request.say(),
			"#{actor} just opened a pull request with the title: Add feature");

		let gollum = RepositoryEvent::new(event("GollumEvent", serde_json::json!({
			"pages": [{"page_name": "Home", "html_url": "https://github.com/acme/proj/wiki/Home"}],
		}))).unwrap();

		assert_eq!(gollum.branch_name(), "");
		assert_eq!(gollum.say(),
			"#{actor} just edited some wiki content:\nhttps://github.com/acme/proj/wiki/Home");
	}

	#[test]
	fn placeholders_are_substituted_once_in_order()
	{
		let event = RepositoryEvent::new(event("IssueCommentEvent", serde_json::json!({
			"action": "created",
			"issue": {"title": "#{branch} everywhere"},
			"comment": {"body": "mentions #{actor}"},
		}))).unwrap();

		let message = super::fill_placeholders(&event.say(), "Alice", &event);

		// The branch placeholder in the title is replaced with the (empty) branch name, while the
		// actor placeholder inserted with the comment is left alone
		assert_eq!(message, "Alice just commented on an issue with the title:  everywhere, \
			here’s the comment: mentions #{actor}");

		let twice = super::fill_placeholders("#{actor} and #{actor}", "Alice", &event);
		assert_eq!(twice, "Alice and #{actor}");
	}

	#[test]
	fn humanized_type()
	{
		let raw = event("PullRequestReviewCommentEvent", serde_json::json!({}));

		assert_eq!(raw.humanized_type(), "Pull Request Review Comment Event");
	}

	#[test]
	fn rendering_is_repeatable()
	{
		let event = RepositoryEvent::new(event("CreateEvent", serde_json::json!({
			"ref": "release-1",
			"ref_type": "branch",
		}))).unwrap();

		assert_eq!(event.say(), "#{actor} just created a branch named #{branch}");
		assert_eq!(event.say(), event.say());
	}
}

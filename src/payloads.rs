//! Kind-specific payload schemas of GitHub events.
//!
//! Webhook deliveries and the events API share these shapes. The webhook flavor additionally
//! carries the repository and the sender at the top level, which [crate::webhook_events] decodes
//! separately, while the events API reports them in the surrounding event record.
//!
//! Fields GitHub marks as required for a kind (`ref` for pushes and ref creations, `pages` for wiki
//! updates, and `action` for everything else) must be present for a payload to decode. All other
//! fields fall back to empty defaults.

use crate::models::{null_as_default, Card, Column, Comment, Issue, Page, PullRequest, Review};

/// Payload of a branch or tag creation.
#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct CreatePayload
{
	/// The name of the created ref (`null` when a repository was created).
	#[serde(rename = "ref", deserialize_with = "null_as_default")]
	pub ref_: String,
	/// `branch`, `tag`, or `repository`.
	#[serde(default)]
	pub ref_type: String,
}

/// Payload of wiki page creations and updates.
#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct GollumPayload
{
	pub pages: Vec<Page>,
}

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct IssueCommentPayload
{
	pub action: String,
	#[serde(default)]
	pub issue: Issue,
	#[serde(default)]
	pub comment: Comment,
}

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct IssuesPayload
{
	pub action: String,
	#[serde(default)]
	pub issue: Issue,
}

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct ProjectCardPayload
{
	pub action: String,
	#[serde(default)]
	pub project_card: Card,
}

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct ProjectColumnPayload
{
	pub action: String,
	#[serde(default)]
	pub project_column: Column,
}

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct PullRequestPayload
{
	pub action: String,
	#[serde(default)]
	pub number: u64,
	#[serde(default)]
	pub pull_request: PullRequest,
}

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct PullRequestReviewPayload
{
	pub action: String,
	#[serde(default)]
	pub pull_request: PullRequest,
	#[serde(default)]
	pub review: Review,
}

/// Payload of a comment on a pull request’s unified diff.
#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct PullRequestReviewCommentPayload
{
	pub action: String,
	#[serde(default)]
	pub pull_request: PullRequest,
	#[serde(default)]
	pub comment: Comment,
}

/// Payload of a push to a branch or tag.
#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct PushPayload
{
	/// The full Git ref that was pushed to (example: `refs/heads/main`).
	#[serde(rename = "ref")]
	pub ref_: String,
	/// The pushed commits. Entries are interpreted lazily, see [crate::models::commit_messages].
	#[serde(default, deserialize_with = "null_as_default")]
	pub commits: Vec<serde_json::Value>,
	/// URL comparing the state before and after the push (webhook deliveries only).
	#[serde(default, deserialize_with = "null_as_default")]
	pub compare: String,
}

impl PushPayload
{
	/// Messages of all well-formed commits, and an error for every malformed one.
	pub fn commit_messages(&self) -> (Vec<&str>, Vec<crate::Error>)
	{
		crate::models::commit_messages(&self.commits)
	}
}

#[cfg(test)]
mod tests
{
	#[test]
	fn required_fields_are_enforced()
	{
		let error = serde_json::from_value::<super::PushPayload>(serde_json::json!({
			"commits": [],
		})).unwrap_err();
		assert!(error.to_string().contains("missing field `ref`"));

		let error = serde_json::from_value::<super::IssuesPayload>(serde_json::json!({
			"issue": {"title": "Broken build"},
		})).unwrap_err();
		assert!(error.to_string().contains("missing field `action`"));

		assert!(serde_json::from_value::<super::GollumPayload>(serde_json::json!({})).is_err());
	}

	#[test]
	fn create_payload_tolerates_null_ref()
	{
		let payload: super::CreatePayload = serde_json::from_value(serde_json::json!({
			"ref": null,
			"ref_type": "repository",
		})).unwrap();

		assert_eq!(payload.ref_, "");
		assert_eq!(payload.ref_type, "repository");
	}

	#[test]
	fn optional_sections_default()
	{
		let payload: super::PullRequestPayload = serde_json::from_value(serde_json::json!({
			"action": "opened",
		})).unwrap();

		assert_eq!(payload.number, 0);
		assert_eq!(payload.pull_request.title, "");
		assert_eq!(payload.pull_request.head.ref_, "");
	}
}

//! Partial GitHub data models shared by webhook payloads and events API payloads.
//!
//! GitHub sends `null` for many optional text fields. These fields decode to empty strings instead,
//! as absent data is rendered as absent rather than treated as an error.

/// Decode a field that may be `null` or missing to its default value.
#[doc(hidden)]
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
	D: serde::Deserializer<'de>,
	T: Default + serde::Deserialize<'de>,
{
	use serde::Deserialize as _;

	Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Partial user data model.
#[derive(Clone, Debug, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub struct User
{
	/// The user’s handle.
	#[serde(default)]
	pub login: String,
	// We don’t need the other fields, so ignore them
}

/// Partial repository data model.
#[derive(Clone, Debug, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Repository
{
	/// The name of the repository (without the owner).
	#[serde(default)]
	pub name: String,
	#[serde(default, deserialize_with = "null_as_default")]
	pub html_url: String,
}

#[derive(Clone, Debug, Default, serde::Deserialize, serde::Serialize)]
pub struct Label
{
	#[serde(default)]
	pub name: String,
}

/// Partial issue data model.
#[derive(Clone, Debug, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Issue
{
	#[serde(default, deserialize_with = "null_as_default")]
	pub html_url: String,
	#[serde(default)]
	pub title: String,
	#[serde(default, deserialize_with = "null_as_default")]
	pub body: String,
	#[serde(default, deserialize_with = "null_as_default")]
	pub labels: Vec<Label>,
}

/// Partial data model of a comment on an issue, or of a comment on a pull request’s diff.
#[derive(Clone, Debug, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Comment
{
	#[serde(default, deserialize_with = "null_as_default")]
	pub html_url: String,
	#[serde(default, deserialize_with = "null_as_default")]
	pub body: String,
	/// The path of the commented file (only present for comments on a pull request’s diff).
	#[serde(default, deserialize_with = "null_as_default")]
	pub path: String,
}

/// The head or base of a pull request.
#[derive(Clone, Debug, Default, serde::Deserialize, serde::Serialize)]
pub struct GitRef
{
	#[serde(rename = "ref", default)]
	pub ref_: String,
}

/// Partial pull request data model.
#[derive(Clone, Debug, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PullRequest
{
	#[serde(default, deserialize_with = "null_as_default")]
	pub html_url: String,
	#[serde(default)]
	pub title: String,
	#[serde(default, deserialize_with = "null_as_default")]
	pub body: String,
	#[serde(default)]
	pub state: String,
	/// Whether a closed pull request was merged rather than discarded.
	#[serde(default, deserialize_with = "null_as_default")]
	pub merged: bool,
	#[serde(default, deserialize_with = "null_as_default")]
	pub labels: Vec<Label>,
	#[serde(default)]
	pub head: GitRef,
}

/// Partial pull request review data model.
#[derive(Clone, Debug, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Review
{
	#[serde(default, deserialize_with = "null_as_default")]
	pub html_url: String,
	#[serde(default, deserialize_with = "null_as_default")]
	pub body: String,
	/// The state the review was submitted in (example: `approved`).
	#[serde(default)]
	pub state: String,
}

/// Partial project card data model.
#[derive(Clone, Debug, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Card
{
	#[serde(default, deserialize_with = "null_as_default")]
	pub html_url: String,
	/// The card’s text (empty for cards referring to issues or pull requests).
	#[serde(default, deserialize_with = "null_as_default")]
	pub note: String,
}

#[derive(Clone, Debug, Default, serde::Deserialize, serde::Serialize)]
pub struct Column
{
	#[serde(default)]
	pub name: String,
}

/// Partial data model of a wiki page touched by a Gollum event.
#[derive(Clone, Debug, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Page
{
	#[serde(default)]
	pub page_name: String,
	#[serde(default)]
	pub title: String,
	/// What happened to the page (`created` or `edited`).
	#[serde(default)]
	pub action: String,
	#[serde(default, deserialize_with = "null_as_default")]
	pub html_url: String,
}

impl Page
{
	/// The most readable name available for this page.
	pub fn display_name(&self) -> &str
	{
		match self.title.is_empty()
		{
			true => &self.page_name,
			false => &self.title,
		}
	}
}

/// Extract the commit messages from the commits of a push.
///
/// Commits are kept as plain JSON values so that a single malformed entry doesn’t prevent the
/// whole event from being decoded. Malformed entries are skipped and reported individually in the
/// returned list of errors, while the messages of all well-formed entries are returned.
pub fn commit_messages(commits: &[serde_json::Value]) -> (Vec<&str>, Vec<crate::Error>)
{
	let mut messages = Vec::with_capacity(commits.len());
	let mut errors = Vec::new();

	for (index, commit) in commits.iter().enumerate()
	{
		let commit = match commit.as_object()
		{
			Some(commit) => commit,
			None =>
			{
				errors.push(crate::Error::MalformedCommit(
					format!("commit #{index} is not an object")));
				continue;
			},
		};

		match commit.get("message").and_then(serde_json::Value::as_str)
		{
			Some(message) => messages.push(message),
			None => errors.push(crate::Error::MalformedCommit(
				format!("commit #{index} has no message"))),
		}
	}

	(messages, errors)
}

/// Strip the `refs/heads/` or `refs/tags/` prefix from a Git ref, if present.
pub fn short_ref_name(ref_: &str) -> &str
{
	ref_.strip_prefix("refs/heads/")
		.or_else(|| ref_.strip_prefix("refs/tags/"))
		.unwrap_or(ref_)
}

/// Turn a Git ref into a name that reads well when spoken (`refs/heads/feature-x` becomes
/// `feature x`).
pub fn spoken_branch_name(ref_: &str) -> String
{
	let branch = ref_.rsplit('/').next().unwrap_or(ref_);

	branch.split('-').collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests
{
	#[test]
	fn null_fields_decode_to_defaults()
	{
		let issue: super::Issue = serde_json::from_value(serde_json::json!({
			"title": "Broken build",
			"body": null,
			"labels": null,
		})).unwrap();

		assert_eq!(issue.title, "Broken build");
		assert_eq!(issue.body, "");
		assert!(issue.labels.is_empty());
		assert_eq!(issue.html_url, "");
	}

	#[test]
	fn commit_messages_skip_malformed_entries()
	{
		let commits = vec![
			serde_json::json!({"message": "fix bug"}),
			serde_json::json!({"messge": "typo in key"}),
			serde_json::json!("not an object"),
			serde_json::json!({"message": "add tests"}),
		];

		let (messages, errors) = super::commit_messages(&commits);

		assert_eq!(messages, ["fix bug", "add tests"]);
		assert_eq!(errors.len(), 2);
		assert!(errors[0].to_string().contains("commit #1"));
		assert!(errors[1].to_string().contains("commit #2"));
	}

	#[test]
	fn ref_names()
	{
		assert_eq!(super::short_ref_name("refs/heads/feature-x"), "feature-x");
		assert_eq!(super::short_ref_name("refs/tags/v1.0"), "v1.0");
		assert_eq!(super::short_ref_name("main"), "main");

		assert_eq!(super::spoken_branch_name("refs/heads/feature-x"), "feature x");
		assert_eq!(super::spoken_branch_name("main"), "main");
	}

	#[test]
	fn page_display_name_prefers_title()
	{
		let page = super::Page
		{
			page_name: "Home-Page".to_string(),
			title: "Home Page".to_string(),
			..Default::default()
		};

		assert_eq!(page.display_name(), "Home Page");
		assert_eq!(super::Page{page_name: "Setup".to_string(), ..Default::default()}.display_name(),
			"Setup");
	}
}

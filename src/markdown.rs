//! Formatting helpers producing fragments of the chat markup understood by Slack (`mrkdwn`).

/// Render a link with the given text.
///
/// # Arguments
/// - `url`: The link target.
/// - `text`: The text shown in place of the URL.
pub fn link(url: &str, text: &str) -> String
{
	format!("<{url}|{text}>")
}

pub fn bold(text: &str) -> String
{
	format!("*{text}*")
}

pub fn italic(text: &str) -> String
{
	format!("_{text}_")
}

/// Render a quote. Only the first line is quoted if `text` spans multiple lines.
pub fn quote(text: &str) -> String
{
	format!("> {text}")
}

/// Render inline code.
pub fn code(text: &str) -> String
{
	format!("`{text}`")
}

/// Render a code block, which may span multiple lines.
pub fn multiline_code(text: &str) -> String
{
	format!("```{text}```")
}

/// Render a bulleted list with one item per line. Every item, including the last one, is
/// terminated by a newline.
pub fn list<I, S>(items: I) -> String
where
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	items.into_iter()
		.map(|item| format!("- {}\n", item.as_ref()))
		.collect()
}

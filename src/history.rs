/// Persistent record of the event IDs that were seen in the previous polling cycle.
///
/// The IDs are stored as a single comma-separated line. The file is rewritten completely every
/// time, so only the IDs of the most recent cycle are remembered.
pub struct History
{
	#[doc(hidden)]
	path: std::path::PathBuf,
}

impl History
{
	pub fn new<P>(path: P) -> Self
	where
		P: Into<std::path::PathBuf>,
	{
		Self{path: path.into()}
	}

	pub fn path(&self) -> &std::path::Path
	{
		&self.path
	}

	/// Read the IDs stored by the previous cycle. A missing file means no IDs were stored yet.
	pub fn previous_ids(&self) -> Result<std::collections::HashSet<String>, crate::Error>
	{
		let content = match std::fs::read_to_string(&self.path)
		{
			Ok(content) => content,
			Err(error) if error.kind() == std::io::ErrorKind::NotFound =>
			{
				log::debug!("no history file at “{}” yet", self.path.display());
				return Ok(Default::default());
			},
			Err(error) => return Err(crate::Error::ReadHistoryFile(error)),
		};

		Ok(content.trim().split(',')
			.map(str::trim)
			.filter(|id| !id.is_empty())
			.map(str::to_string)
			.collect())
	}

	/// Replace the stored IDs with the given ones.
	pub fn replace_ids<I, S>(&self, ids: I) -> Result<(), crate::Error>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let content = ids.into_iter()
			.map(|id| id.as_ref().to_string())
			.collect::<Vec<_>>()
			.join(",");

		std::fs::write(&self.path, content).map_err(crate::Error::WriteHistoryFile)
	}
}

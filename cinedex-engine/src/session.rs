use crate::catalog::Catalog;
use crate::error::ExplorerError;

/// Per-client browsing context. Remembers the last record the user opened so
/// recommendations can be built without naming a source explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Session {
	last_viewed: Option<usize>,
}

impl Session {
	/// Mark `index` as viewed. Out-of-range indices are rejected and leave
	/// the session unchanged.
	pub fn view(&mut self, catalog: &Catalog, index: usize) -> Result<(), ExplorerError> {
		catalog.require(index)?;
		self.last_viewed = Some(index);
		Ok(())
	}

	pub fn last_viewed(&self) -> Option<usize> {
		self.last_viewed
	}

	/// Pick the explicit source if given, else the last viewed record.
	pub fn resolve_source(&self, explicit: Option<usize>) -> Result<usize, ExplorerError> {
		explicit.or(self.last_viewed).ok_or(ExplorerError::NoSource)
	}
}

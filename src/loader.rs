//! External library loader: one script node per URL per page.
//!
//! The first request for a URL injects `<script src=... async>` into the document head and
//! parks the callback; later requests join the same wait. When the node reports its load event
//! every waiter receives the same outcome, and that outcome is cached for the page lifetime.
//! There are no retries: a failed URL keeps failing until the page (and loader) is rebuilt.

// self
use crate::{
	_prelude::*,
	dom::{Document, DomError, LoadStatus, build_element},
	obs::debug_event,
};

/// Completion callback handed to [`LibraryLoader::load`].
pub type LoadCallback = Box<dyn FnOnce(Result<(), LoadError>) + Send>;

/// Library load failure.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Failed to load {url}: {cause}.")]
pub struct LoadError {
	/// Library URL.
	pub url: Url,
	/// Reason reported by the document or the DOM port.
	pub cause: String,
}

/// Observable state of a library URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LibraryStatus {
	/// Never requested.
	Unrequested,
	/// Script injected, waiting for its load event.
	Loading,
	/// Loaded successfully.
	Loaded,
	/// Failed to load.
	Failed(LoadError),
}

enum Entry {
	Loading(Vec<LoadCallback>),
	Loaded,
	Failed(LoadError),
}

type Entries = Arc<Mutex<HashMap<Url, Entry>>>;

/// Page-wide deduplicating script loader.
pub struct LibraryLoader {
	document: Arc<dyn Document>,
	entries: Entries,
}
impl LibraryLoader {
	/// Creates a loader that injects scripts into `document`.
	pub fn new(document: Arc<dyn Document>) -> Self {
		Self { document, entries: Default::default() }
	}

	/// Current state of `url`.
	pub fn status(&self, url: &Url) -> LibraryStatus {
		match self.entries.lock().get(url) {
			None => LibraryStatus::Unrequested,
			Some(Entry::Loading(_)) => LibraryStatus::Loading,
			Some(Entry::Loaded) => LibraryStatus::Loaded,
			Some(Entry::Failed(error)) => LibraryStatus::Failed(error.clone()),
		}
	}

	/// Requests `url`, invoking `done` once the library is available or has failed.
	///
	/// `done` may run before this method returns when the outcome is already known.
	pub fn load(&self, url: &Url, done: LoadCallback) {
		let mut entries = self.entries.lock();
		let cached = match entries.get(url) {
			Some(Entry::Loaded) => Some(Ok(())),
			Some(Entry::Failed(error)) => Some(Err(error.clone())),
			Some(Entry::Loading(_)) | None => None,
		};

		if let Some(outcome) = cached {
			drop(entries);
			done(outcome);

			return;
		}
		if let Some(Entry::Loading(waiters)) = entries.get_mut(url) {
			waiters.push(done);

			return;
		}

		entries.insert(url.clone(), Entry::Loading(vec![done]));
		drop(entries);

		if let Err(e) = self.inject(url) {
			settle(&self.entries, url, Err(LoadError { url: url.clone(), cause: e.to_string() }));
		}
	}

	fn inject(&self, url: &Url) -> Result<(), DomError> {
		debug_event!(url = url.as_str(), "injecting vendor library");

		let script =
			build_element(self.document.as_ref(), "script", &[("src", url.as_str()), ("async", "")])?;
		let entries = self.entries.clone();
		let target = url.clone();

		self.document.on_load(
			script,
			Box::new(move |status| {
				let outcome = match status {
					LoadStatus::Loaded => Ok(()),
					LoadStatus::Failed(cause) => Err(LoadError { url: target.clone(), cause }),
				};

				settle(&entries, &target, outcome);
			}),
		)?;
		self.document.append_child(self.document.head(), script)
	}
}
impl Debug for LibraryLoader {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LibraryLoader").field("libraries", &self.entries.lock().len()).finish()
	}
}

fn settle(entries: &Entries, url: &Url, outcome: Result<(), LoadError>) {
	let waiters = {
		let mut entries = entries.lock();
		let next = match &outcome {
			Ok(()) => Entry::Loaded,
			Err(error) => Entry::Failed(error.clone()),
		};

		match entries.insert(url.clone(), next) {
			Some(Entry::Loading(waiters)) => waiters,
			_ => Vec::new(),
		}
	};

	for waiter in waiters {
		waiter(outcome.clone());
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::dom::MemoryDocument;

	fn fixture() -> (MemoryDocument, LibraryLoader, Url) {
		let memory = MemoryDocument::new();
		let loader = LibraryLoader::new(Arc::new(memory.clone()));
		let url = Url::parse("https://cdn.example/vendor.js").expect("Library URL should parse.");

		(memory, loader, url)
	}

	fn recorder() -> (Arc<Mutex<Vec<Result<(), LoadError>>>>, impl Fn() -> LoadCallback) {
		let seen = Arc::new(Mutex::new(Vec::new()));
		let sink = seen.clone();

		(seen, move || {
			let sink = sink.clone();

			Box::new(move |outcome| sink.lock().push(outcome)) as LoadCallback
		})
	}

	#[test]
	fn concurrent_requests_share_one_script() {
		let (memory, loader, url) = fixture();
		let (seen, callback) = recorder();

		loader.load(&url, callback());
		loader.load(&url, callback());

		assert_eq!(memory.query_selector_all("script").len(), 1);
		assert_eq!(loader.status(&url), LibraryStatus::Loading);
		assert!(seen.lock().is_empty());
		assert_eq!(memory.complete_script(url.as_str(), LoadStatus::Loaded), 1);
		assert_eq!(*seen.lock(), vec![Ok(()), Ok(())]);

		loader.load(&url, callback());

		assert_eq!(seen.lock().len(), 3);
		assert_eq!(memory.query_selector_all("script").len(), 1);
		assert_eq!(loader.status(&url), LibraryStatus::Loaded);
	}

	#[test]
	fn failures_are_cached_without_retry() {
		let (memory, loader, url) = fixture();
		let (seen, callback) = recorder();

		loader.load(&url, callback());
		memory.complete_script(url.as_str(), LoadStatus::Failed("404".into()));
		loader.load(&url, callback());

		let expected = LoadError { url: url.clone(), cause: "404".into() };

		assert_eq!(*seen.lock(), vec![Err(expected.clone()), Err(expected.clone())]);
		assert_eq!(loader.status(&url), LibraryStatus::Failed(expected));
		assert_eq!(memory.query_selector_all("script").len(), 1);
	}
}

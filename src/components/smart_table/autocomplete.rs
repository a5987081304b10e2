use std::collections::HashMap;
use std::time::Duration;

use super::types::{Scalar, SearchFn, SelectOption};

/// Quiet period after the last keystroke before a search is issued.
pub const AUTOCOMPLETE_DEBOUNCE: Duration = Duration::from_millis(300);

/// Browser timers and `Date.now()` can disagree by a millisecond.
const CLOCK_SLACK_MS: f64 = 1.0;

/// Identifies one scheduled quiet period.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DebounceToken(u64);

/// Restartable quiet-period timer over an external millisecond clock.
/// Every `restart` supersedes the previous one, so only the latest token can
/// fire, once, after its deadline.
#[derive(Clone, Debug)]
pub struct Debouncer {
	delay: Duration,
	generation: u64,
	deadline: Option<f64>,
}

impl Default for Debouncer {
	fn default() -> Self {
		Self::new(AUTOCOMPLETE_DEBOUNCE)
	}
}

impl Debouncer {
	pub fn new(delay: Duration) -> Self {
		Self {
			delay,
			generation: 0,
			deadline: None,
		}
	}

	pub fn delay(&self) -> Duration {
		self.delay
	}

	pub fn is_pending(&self) -> bool {
		self.deadline.is_some()
	}

	pub fn restart(&mut self, now_ms: f64) -> DebounceToken {
		self.generation += 1;
		self.deadline = Some(now_ms + self.delay.as_secs_f64() * 1000.0);
		DebounceToken(self.generation)
	}

	pub fn cancel(&mut self) {
		self.generation += 1;
		self.deadline = None;
	}

	/// `true` exactly once for the latest token whose deadline has passed.
	pub fn fire(&mut self, token: DebounceToken, now_ms: f64) -> bool {
		match self.deadline {
			Some(deadline)
				if token.0 == self.generation && now_ms + CLOCK_SLACK_MS >= deadline =>
			{
				self.deadline = None;
				true
			}
			_ => false,
		}
	}
}

/// Identifies one autocomplete lookup. Only the most recently issued ticket
/// may deliver its results.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LookupTicket(pub(super) u64);

/// Labels of autocomplete values seen in search results, per column, keyed by
/// the value's display form.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LabelCache(HashMap<String, HashMap<String, String>>);

impl LabelCache {
	pub fn get(&self, column_key: &str, value: &Scalar) -> Option<&str> {
		self.0
			.get(column_key)
			.and_then(|labels| labels.get(&value.to_string()))
			.map(String::as_str)
	}

	pub fn merge(&mut self, column_key: &str, options: &[SelectOption]) {
		let labels = self.0.entry(column_key.to_string()).or_default();
		for option in options {
			labels.insert(option.value.to_string(), option.label.clone());
		}
	}
}

/// A single-shot option lookup for one column.
#[derive(Clone)]
pub enum OptionsQuery {
	/// The column has no search function.
	Empty,
	Search {
		ticket: LookupTicket,
		column_key: String,
		query: String,
		search: SearchFn,
	},
}

impl OptionsQuery {
	pub fn ticket(&self) -> Option<LookupTicket> {
		match self {
			OptionsQuery::Empty => None,
			OptionsQuery::Search { ticket, .. } => Some(*ticket),
		}
	}

	/// Runs the search. Nothing happens until the returned future is polled.
	pub async fn resolve(self) -> Vec<SelectOption> {
		match self {
			OptionsQuery::Empty => Vec::new(),
			OptionsQuery::Search { query, search, .. } => search(query).await,
		}
	}
}

//! Edit, sort and label state of the smart table, independent of the DOM.

use log::debug;

use super::autocomplete::{
	DebounceToken, Debouncer, LabelCache, LookupTicket, OptionsQuery,
};
use super::types::{
	CellChange, CellValue, Column, InputKind, Row, Scalar, SearchFn, SelectOption, Sort, SortOrder,
};

static NULL: Scalar = Scalar::Null;

#[derive(Clone, Debug, Default, PartialEq)]
pub enum EditState {
	#[default]
	Idle,
	Editing {
		row_index: usize,
		column_key: String,
		value: Scalar,
	},
}

/// Result of a keystroke inside a cell editor.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KeyOutcome {
	pub prevent_default: bool,
	pub change: Option<CellChange>,
}

#[derive(Clone, Debug, Default)]
pub struct GridState {
	columns: Vec<Column>,
	rows: Vec<Row>,
	edit: EditState,
	sort: Option<Sort>,
	cache: LabelCache,
	lookups: u64,
	debounce: Debouncer,
}

impl GridState {
	pub fn new(columns: Vec<Column>, rows: Vec<Row>) -> Self {
		Self {
			columns,
			rows,
			..Self::default()
		}
	}

	pub fn columns(&self) -> &[Column] {
		&self.columns
	}

	pub fn rows(&self) -> &[Row] {
		&self.rows
	}

	pub fn column(&self, key: &str) -> Option<&Column> {
		self.columns.iter().find(|c| c.key == key)
	}

	pub fn edit(&self) -> &EditState {
		&self.edit
	}

	pub fn sort(&self) -> Option<&Sort> {
		self.sort.as_ref()
	}

	pub fn cache(&self) -> &LabelCache {
		&self.cache
	}

	/// The host replaced its rows. A pending edit may point at a row that no
	/// longer exists, so it is dropped.
	pub fn replace_rows(&mut self, rows: Vec<Row>) {
		self.rows = rows;
		self.edit = EditState::Idle;
		self.abandon_lookups();
	}

	pub fn debouncer(&self) -> &Debouncer {
		&self.debounce
	}

	/// Lookups belong to the edit that issued them. Ending or switching the
	/// edit invalidates every outstanding ticket and the pending quiet period.
	fn abandon_lookups(&mut self) {
		self.lookups += 1;
		self.debounce.cancel();
	}

	pub fn is_editing(&self, row_index: usize, column_key: &str) -> bool {
		matches!(
			&self.edit,
			EditState::Editing { row_index: r, column_key: c, .. } if *r == row_index && c == column_key
		)
	}

	/// Starts editing a cell. Returns `false` and changes nothing when the
	/// column is read-only, the row does not exist, or the cell is already
	/// being edited.
	pub fn start_edit(&mut self, row_index: usize, column_key: &str) -> bool {
		if !self.column(column_key).is_some_and(Column::is_editable) {
			return false;
		}
		if self.is_editing(row_index, column_key) {
			return false;
		}
		let Some(row) = self.rows.get(row_index) else {
			return false;
		};

		let value = row.raw(column_key);
		self.abandon_lookups();
		debug!("edit started at row {row_index}, column {column_key}");
		self.edit = EditState::Editing {
			row_index,
			column_key: column_key.to_string(),
			value,
		};
		true
	}

	pub fn pending_value(&self) -> Option<&Scalar> {
		match &self.edit {
			EditState::Idle => None,
			EditState::Editing { value, .. } => Some(value),
		}
	}

	pub fn set_pending(&mut self, new_value: Scalar) {
		if let EditState::Editing { value, .. } = &mut self.edit {
			*value = new_value;
		}
	}

	/// Writes the pending value into its row and returns the change to emit.
	pub fn save_edit(&mut self) -> Option<CellChange> {
		let EditState::Editing {
			row_index,
			column_key,
			value,
		} = std::mem::take(&mut self.edit)
		else {
			return None;
		};
		self.abandon_lookups();

		if let Some(row) = self.rows.get_mut(row_index) {
			row.set(column_key.clone(), CellValue::Raw(value.clone()));
		}
		debug!("edit saved at row {row_index}, column {column_key}: {value}");
		Some(CellChange {
			row_index,
			column_key,
			value,
		})
	}

	pub fn cancel_edit(&mut self) {
		if self.edit != EditState::Idle {
			self.abandon_lookups();
		}
		self.edit = EditState::Idle;
	}

	/// Enter saves, Escape cancels; anything else is left to the editor.
	pub fn handle_key(&mut self, key: &str) -> KeyOutcome {
		match key {
			"Enter" => KeyOutcome {
				prevent_default: true,
				change: self.save_edit(),
			},
			"Escape" => {
				self.cancel_edit();
				KeyOutcome {
					prevent_default: true,
					change: None,
				}
			}
			_ => KeyOutcome::default(),
		}
	}

	/// Cycles none → ASC → DESC → none on one column. Another column starts
	/// again at ASC. Rows are not reordered here.
	pub fn sort_by_column(&mut self, column_key: &str) -> Option<Sort> {
		let order = match &self.sort {
			Some(s) if s.column_key == column_key => match s.order {
				SortOrder::Asc => Some(SortOrder::Desc),
				SortOrder::Desc => None,
			},
			_ => Some(SortOrder::Asc),
		};
		self.sort = order.map(|order| Sort {
			column_key: column_key.to_string(),
			order,
		});
		debug!("sorting by column {column_key}: {:?}", self.sort);
		self.sort.clone()
	}

	/// Header hint. While hovered it names what the next click does.
	pub fn sort_indicator(&self, column_key: &str, hovered: bool) -> &'static str {
		let active = self
			.sort
			.as_ref()
			.filter(|s| s.column_key == column_key)
			.map(|s| s.order);
		match (hovered, active) {
			(true, Some(SortOrder::Asc)) => "▼ (click to DESC)",
			(true, Some(SortOrder::Desc)) => "(click to clear)",
			(true, None) => "▲ (click to ASC)",
			(false, Some(SortOrder::Asc)) => "▲",
			(false, Some(SortOrder::Desc)) => "▼",
			(false, None) => "",
		}
	}

	/// Text to display for a cell: its own label, then the matching select
	/// option, then the cached autocomplete label, then the raw value.
	pub fn label_for(&self, row: &Row, column: &Column) -> String {
		let raw = match row.get(&column.key) {
			Some(CellValue::Labeled(option)) => return option.label.clone(),
			Some(CellValue::Raw(raw)) => raw,
			None => &NULL,
		};
		let label = match column.input {
			Some(InputKind::Select) => column
				.options
				.iter()
				.find(|o| o.value == *raw)
				.map(|o| o.label.as_str()),
			Some(InputKind::Autocomplete) => self
				.cache
				.get(&column.key, raw)
				.filter(|label| !label.is_empty()),
			_ => None,
		};
		label.map_or_else(|| raw.to_string(), str::to_string)
	}

	pub fn search_fn(&self, column_key: &str) -> Option<SearchFn> {
		self.column(column_key).and_then(|c| c.search.clone())
	}

	/// Starts or restarts the quiet period before searching `column_key`.
	/// `None` when nothing is being edited or the column cannot search.
	pub fn schedule_lookup(
		&mut self,
		column_key: &str,
		now_ms: f64,
	) -> Option<DebounceToken> {
		if self.pending_value().is_none() || self.search_fn(column_key).is_none() {
			return None;
		}
		Some(self.debounce.restart(now_ms))
	}

	/// Issues the lookup once the latest quiet period has run out, reading the
	/// pending value at that moment. Superseded or early calls get `Empty`.
	pub fn fire_lookup(
		&mut self,
		token: DebounceToken,
		column_key: &str,
		now_ms: f64,
	) -> OptionsQuery {
		if !self.debounce.fire(token, now_ms) {
			return OptionsQuery::Empty;
		}
		self.options_for(column_key)
	}

	/// Issues a lookup for the column using the pending edit value as the
	/// query. Any earlier ticket stops being current.
	pub fn options_for(&mut self, column_key: &str) -> OptionsQuery {
		let Some(search) = self.search_fn(column_key) else {
			return OptionsQuery::Empty;
		};
		let query = self
			.pending_value()
			.map(Scalar::to_string)
			.unwrap_or_default();
		self.lookups += 1;
		debug!("autocomplete search on {column_key}: {query:?}");
		OptionsQuery::Search {
			ticket: LookupTicket(self.lookups),
			column_key: column_key.to_string(),
			query,
			search,
		}
	}

	/// Caches the labels of a finished lookup. The options are handed back
	/// only if no newer lookup was issued meanwhile.
	pub fn finish_lookup(
		&mut self,
		ticket: LookupTicket,
		column_key: &str,
		options: Vec<SelectOption>,
	) -> Option<Vec<SelectOption>> {
		self.cache.merge(column_key, &options);
		if ticket.0 == self.lookups {
			Some(options)
		} else {
			debug!("discarding superseded autocomplete results for {column_key}");
			None
		}
	}
}

#[cfg(test)]
mod tests {
	use std::future::{Future, ready};
	use std::pin::pin;
	use std::task::{Context, Poll, Waker};

	use super::*;

	fn columns() -> Vec<Column> {
		vec![
			Column::new("uuid", "UUID"),
			Column::new("name", "Nom").text(),
			Column::new("age", "Âge").number(),
			Column::new("role", "Rôle").select(vec![
				SelectOption::new("ADMIN", "Administrateur"),
				SelectOption::new("MEMBER", "Membre"),
			]),
			Column::new("autocomplete", "Autocomplete").autocomplete(|query: String| {
				ready(
					["1", "2", "3"]
						.iter()
						.map(|v| SelectOption::new(*v, format!("Option {v}")))
						.filter(|o| o.label.to_lowercase().contains(&query.to_lowercase()))
						.collect::<Vec<_>>(),
				)
			}),
		]
	}

	fn rows() -> Vec<Row> {
		vec![
			Row::new().with("uuid", 1i64).with("name", "Alice").with("age", 28i64),
			Row::new()
				.with("uuid", 2i64)
				.with("name", "Bob")
				.with("age", 34i64)
				.with("role", "ADMIN")
				.with("autocomplete", SelectOption::new("2", "Option 2")),
		]
	}

	fn grid() -> GridState {
		GridState::new(columns(), rows())
	}

	fn block_on<F: Future>(fut: F) -> F::Output {
		let mut fut = pin!(fut);
		let mut cx = Context::from_waker(Waker::noop());
		match fut.as_mut().poll(&mut cx) {
			Poll::Ready(out) => out,
			Poll::Pending => panic!("search future was expected to be ready"),
		}
	}

	#[test]
	fn read_only_column_is_never_edited() {
		let mut grid = grid();
		assert!(!grid.start_edit(0, "uuid"));
		assert_eq!(grid.edit(), &EditState::Idle);

		assert!(!grid.start_edit(0, "missing"));
		assert_eq!(grid.edit(), &EditState::Idle);
	}

	#[test]
	fn start_edit_seeds_raw_value() {
		let mut grid = grid();
		assert!(grid.start_edit(1, "autocomplete"));
		assert_eq!(grid.pending_value(), Some(&Scalar::from("2")));

		assert!(grid.start_edit(0, "role"));
		assert_eq!(grid.pending_value(), Some(&Scalar::Null));
	}

	#[test]
	fn start_edit_on_active_cell_is_idempotent() {
		let mut grid = grid();
		assert!(grid.start_edit(0, "name"));
		grid.set_pending(Scalar::from("Alicia"));
		let before = grid.edit().clone();

		assert!(!grid.start_edit(0, "name"));
		assert_eq!(grid.edit(), &before);
	}

	#[test]
	fn start_edit_out_of_range_is_ignored() {
		let mut grid = grid();
		assert!(!grid.start_edit(5, "name"));
		assert_eq!(grid.edit(), &EditState::Idle);
	}

	#[test]
	fn save_writes_row_and_emits_change() {
		let mut grid = grid();
		grid.start_edit(0, "age");
		grid.set_pending(Scalar::Number(29.0));

		let change = grid.save_edit();
		assert_eq!(
			change,
			Some(CellChange {
				row_index: 0,
				column_key: "age".into(),
				value: Scalar::Number(29.0),
			})
		);
		assert_eq!(grid.rows()[0].raw("age"), Scalar::Number(29.0));
		assert_eq!(grid.edit(), &EditState::Idle);
	}

	#[test]
	fn save_while_idle_is_noop() {
		let mut grid = grid();
		assert_eq!(grid.save_edit(), None);
		assert_eq!(grid.rows(), rows().as_slice());
	}

	#[test]
	fn cancel_discards_pending_value() {
		let mut grid = grid();
		grid.start_edit(0, "name");
		grid.set_pending(Scalar::from("Zed"));
		grid.cancel_edit();

		assert_eq!(grid.edit(), &EditState::Idle);
		assert_eq!(grid.pending_value(), None);
		assert_eq!(grid.rows()[0].raw("name"), Scalar::from("Alice"));

		grid.cancel_edit();
		assert_eq!(grid.edit(), &EditState::Idle);
	}

	#[test]
	fn save_then_cancel_leaves_idle() {
		let mut grid = grid();
		grid.start_edit(0, "name");
		grid.save_edit();
		grid.cancel_edit();
		assert_eq!(grid.edit(), &EditState::Idle);
		assert_eq!(grid.pending_value(), None);
	}

	#[test]
	fn set_pending_while_idle_is_ignored() {
		let mut grid = grid();
		grid.set_pending(Scalar::from("x"));
		assert_eq!(grid.edit(), &EditState::Idle);
	}

	#[test]
	fn keyboard_contract() {
		let mut grid = grid();
		grid.start_edit(0, "name");
		grid.set_pending(Scalar::from("Alicia"));
		let outcome = grid.handle_key("Enter");
		assert!(outcome.prevent_default);
		assert_eq!(outcome.change.map(|c| c.value), Some(Scalar::from("Alicia")));

		grid.start_edit(1, "name");
		let outcome = grid.handle_key("Escape");
		assert_eq!(
			outcome,
			KeyOutcome {
				prevent_default: true,
				change: None
			}
		);
		assert_eq!(grid.edit(), &EditState::Idle);

		grid.start_edit(1, "name");
		assert_eq!(grid.handle_key("a"), KeyOutcome::default());
		assert!(grid.is_editing(1, "name"));
	}

	#[test]
	fn sort_cycles_per_column() {
		let mut grid = grid();
		let asc = grid.sort_by_column("x");
		assert_eq!(asc.map(|s| s.order), Some(SortOrder::Asc));
		let desc = grid.sort_by_column("x");
		assert_eq!(desc.map(|s| s.order), Some(SortOrder::Desc));
		assert_eq!(grid.sort_by_column("x"), None);
		assert_eq!(grid.sort(), None);
	}

	#[test]
	fn sorting_another_column_resets_to_asc() {
		let mut grid = grid();
		grid.sort_by_column("name");
		grid.sort_by_column("name");
		assert_eq!(
			grid.sort_by_column("age"),
			Some(Sort {
				column_key: "age".into(),
				order: SortOrder::Asc,
			})
		);
	}

	#[test]
	fn sort_indicator_hints_next_action() {
		let mut grid = grid();
		assert_eq!(grid.sort_indicator("name", false), "");
		assert_eq!(grid.sort_indicator("name", true), "▲ (click to ASC)");
		grid.sort_by_column("name");
		assert_eq!(grid.sort_indicator("name", false), "▲");
		assert_eq!(grid.sort_indicator("name", true), "▼ (click to DESC)");
		assert_eq!(grid.sort_indicator("age", true), "▲ (click to ASC)");
		grid.sort_by_column("name");
		assert_eq!(grid.sort_indicator("name", false), "▼");
		assert_eq!(grid.sort_indicator("name", true), "(click to clear)");
	}

	#[test]
	fn select_option_label() {
		let grid = grid();
		let row = Row::new().with("uuid", 1i64).with("role", "ADMIN");
		let role = grid.column("role").unwrap();
		assert_eq!(grid.label_for(&row, role), "Administrateur");

		let unknown = Row::new().with("role", "GUEST");
		assert_eq!(grid.label_for(&unknown, role), "GUEST");
	}

	#[test]
	fn autocomplete_cache_label() {
		let mut grid = grid();
		let column = grid.column("autocomplete").unwrap().clone();
		grid.finish_lookup(
			LookupTicket(0),
			"autocomplete",
			vec![SelectOption::new("2", "Option 2")],
		);

		let hit = Row::new().with("autocomplete", "2");
		assert_eq!(grid.label_for(&hit, &column), "Option 2");
		let miss = Row::new().with("autocomplete", "9");
		assert_eq!(grid.label_for(&miss, &column), "9");
	}

	#[test]
	fn label_precedence() {
		let mut grid = grid();
		grid.finish_lookup(
			LookupTicket(0),
			"autocomplete",
			vec![SelectOption::new("2", "Cached")],
		);
		let autocomplete = grid.column("autocomplete").unwrap().clone();
		let role = grid.column("role").unwrap().clone();
		let name = grid.column("name").unwrap().clone();

		// embedded label beats the cache
		let embedded = Row::new().with("autocomplete", SelectOption::new("2", "Embedded"));
		assert_eq!(grid.label_for(&embedded, &autocomplete), "Embedded");
		// and beats the select options
		let embedded = Row::new().with("role", SelectOption::new("ADMIN", "Boss"));
		assert_eq!(grid.label_for(&embedded, &role), "Boss");
		// plain columns show the raw value
		let plain = Row::new().with("name", "Alice").with("age", 28i64);
		assert_eq!(grid.label_for(&plain, &name), "Alice");
		let age = grid.column("age").unwrap().clone();
		assert_eq!(grid.label_for(&plain, &age), "28");
		// missing cells render empty
		assert_eq!(grid.label_for(&Row::new(), &name), "");
	}

	#[test]
	fn options_for_without_search_is_empty() {
		let mut grid = grid();
		let query = grid.options_for("name");
		assert!(query.ticket().is_none());
		assert!(block_on(query.resolve()).is_empty());
	}

	#[test]
	fn options_for_queries_with_pending_value_and_caches() {
		let mut grid = grid();
		grid.start_edit(0, "autocomplete");
		grid.set_pending(Scalar::from("option 3"));

		let query = grid.options_for("autocomplete");
		let ticket = query.ticket().unwrap();
		let options = block_on(query.resolve());
		let delivered = grid.finish_lookup(ticket, "autocomplete", options);

		assert_eq!(delivered, Some(vec![SelectOption::new("3", "Option 3")]));
		assert_eq!(
			grid.cache().get("autocomplete", &Scalar::from("3")),
			Some("Option 3")
		);
	}

	#[test]
	fn superseded_lookup_is_cached_but_not_delivered() {
		let mut grid = grid();
		grid.start_edit(0, "autocomplete");
		let first = grid.options_for("autocomplete");
		let second = grid.options_for("autocomplete");

		let old_ticket = first.ticket().unwrap();
		let old = block_on(first.resolve());
		assert_eq!(grid.finish_lookup(old_ticket, "autocomplete", old), None);
		assert_eq!(
			grid.cache().get("autocomplete", &Scalar::from("1")),
			Some("Option 1")
		);

		let new_ticket = second.ticket().unwrap();
		let new = block_on(second.resolve());
		assert_eq!(
			grid.finish_lookup(new_ticket, "autocomplete", new).map(|o| o.len()),
			Some(3)
		);
	}

	#[test]
	fn lookup_from_finished_edit_is_discarded() {
		let mut grid = grid();
		grid.start_edit(0, "autocomplete");
		let stale = grid.options_for("autocomplete");
		grid.cancel_edit();
		grid.start_edit(1, "autocomplete");

		let ticket = stale.ticket().unwrap();
		let options = block_on(stale.resolve());
		assert_eq!(grid.finish_lookup(ticket, "autocomplete", options), None);
		// the labels are still worth keeping
		assert_eq!(
			grid.cache().get("autocomplete", &Scalar::from("1")),
			Some("Option 1")
		);
	}

	#[test]
	fn saving_or_replacing_rows_invalidates_lookups() {
		let mut grid = grid();
		grid.start_edit(0, "autocomplete");
		let before_save = grid.options_for("autocomplete").ticket().unwrap();
		grid.save_edit();
		assert_eq!(grid.finish_lookup(before_save, "autocomplete", Vec::new()), None);

		grid.start_edit(0, "autocomplete");
		let before_replace = grid.options_for("autocomplete").ticket().unwrap();
		grid.replace_rows(rows());
		assert_eq!(
			grid.finish_lookup(before_replace, "autocomplete", Vec::new()),
			None
		);
	}

	#[test]
	fn debounced_lookup_uses_value_at_fire_time() {
		let mut grid = grid();
		grid.start_edit(0, "autocomplete");
		grid.set_pending(Scalar::from("o"));
		let first = grid.schedule_lookup("autocomplete", 0.0).unwrap();
		grid.set_pending(Scalar::from("option"));
		let second = grid.schedule_lookup("autocomplete", 120.0).unwrap();
		grid.set_pending(Scalar::from("option 3"));

		assert!(grid.fire_lookup(first, "autocomplete", 300.0).ticket().is_none());
		assert!(grid.fire_lookup(second, "autocomplete", 300.0).ticket().is_none());

		let query = grid.fire_lookup(second, "autocomplete", 420.0);
		let ticket = query.ticket().unwrap();
		let options = block_on(query.resolve());
		assert_eq!(
			grid.finish_lookup(ticket, "autocomplete", options),
			Some(vec![SelectOption::new("3", "Option 3")])
		);

		// a timer fires only once
		assert!(grid.fire_lookup(second, "autocomplete", 900.0).ticket().is_none());
	}

	#[test]
	fn ending_the_edit_cancels_the_quiet_period() {
		let mut grid = grid();
		grid.start_edit(0, "autocomplete");
		let token = grid.schedule_lookup("autocomplete", 0.0).unwrap();
		grid.save_edit();
		assert!(!grid.debouncer().is_pending());
		assert!(grid.fire_lookup(token, "autocomplete", 1000.0).ticket().is_none());

		assert_eq!(grid.schedule_lookup("autocomplete", 0.0), None);
		grid.start_edit(0, "name");
		assert_eq!(grid.schedule_lookup("name", 0.0), None);
	}

	#[test]
	fn replacing_rows_drops_pending_edit() {
		let mut grid = grid();
		grid.start_edit(1, "name");
		grid.sort_by_column("name");
		grid.replace_rows(vec![Row::new().with("name", "Carol")]);

		assert_eq!(grid.edit(), &EditState::Idle);
		assert_eq!(grid.rows().len(), 1);
		assert!(grid.sort().is_some());
	}
}

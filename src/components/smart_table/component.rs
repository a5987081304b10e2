use leptos::leptos_dom::helpers::{TimeoutHandle, set_timeout_with_handle};
use leptos::prelude::*;
use leptos::task::spawn_local;
use log::warn;
use web_sys::{FocusEvent, KeyboardEvent};

use super::autocomplete::OptionsQuery;
use super::state::GridState;
use super::types::{CellChange, Column, InputKind, Row, Scalar, SelectOption, Sort};

/// Reactive handles shared by every cell of one table.
#[derive(Clone, Copy)]
struct TableHandle {
	grid: RwSignal<GridState>,
	suggestions: RwSignal<Vec<SelectOption>>,
	pending_search: StoredValue<Option<TimeoutHandle>>,
	on_cell_change: Option<Callback<CellChange>>,
	on_sort_change: Option<Callback<Option<Sort>>>,
}

impl TableHandle {
	fn start_edit(self, row_index: usize, column_key: &str) {
		let mut started = false;
		self.grid
			.update(|g| started = g.start_edit(row_index, column_key));
		if started {
			self.clear_pending_search();
			self.suggestions.set(Vec::new());
		}
	}

	fn set_pending(self, value: Scalar) {
		self.grid.update_untracked(|g| g.set_pending(value));
	}

	fn save(self) {
		self.clear_pending_search();
		let mut change = None;
		self.grid.update(|g| change = g.save_edit());
		self.emit_change(change);
	}

	fn handle_key(self, ev: &KeyboardEvent) {
		let key = ev.key();
		if key != "Enter" && key != "Escape" {
			return;
		}
		self.clear_pending_search();
		let mut outcome = None;
		self.grid.update(|g| outcome = Some(g.handle_key(&key)));
		let Some(outcome) = outcome else {
			return;
		};
		if outcome.prevent_default {
			ev.prevent_default();
		}
		self.emit_change(outcome.change);
	}

	fn emit_change(self, change: Option<CellChange>) {
		if let (Some(change), Some(cb)) = (change, self.on_cell_change) {
			cb.run(change);
		}
	}

	fn sort(self, column_key: &str) {
		let mut next = None;
		self.grid.update(|g| next = g.sort_by_column(column_key));
		if let Some(cb) = self.on_sort_change {
			cb.run(next);
		}
	}

	fn label(self, row_index: usize, column: &Column) -> String {
		self.grid.with(|g| {
			g.rows()
				.get(row_index)
				.map(|row| g.label_for(row, column))
				.unwrap_or_default()
		})
	}

	fn clear_pending_search(self) {
		if let Some(handle) = self.pending_search.get_value() {
			handle.clear();
			self.pending_search.set_value(None);
		}
	}

	/// Restarts the quiet period; when it runs out, the column's search runs
	/// with the pending value of that moment and only the latest lookup
	/// reaches the list.
	fn request_options(self, column_key: String) {
		self.clear_pending_search();
		let mut scheduled = None;
		self.grid.update_untracked(|g| {
			scheduled = g
				.schedule_lookup(&column_key, js_sys::Date::now())
				.map(|token| (token, g.debouncer().delay()));
		});
		let Some((token, delay)) = scheduled else {
			self.suggestions.set(Vec::new());
			return;
		};

		let timer = set_timeout_with_handle(
			move || {
				let mut query = OptionsQuery::Empty;
				self.grid.update_untracked(|g| {
					query = g.fire_lookup(token, &column_key, js_sys::Date::now());
				});
				let Some(ticket) = query.ticket() else {
					return;
				};
				spawn_local(async move {
					let options = query.resolve().await;
					let mut delivered = None;
					self.grid
						.update(|g| delivered = g.finish_lookup(ticket, &column_key, options));
					if let Some(options) = delivered {
						self.suggestions.set(options);
					}
				});
			},
			delay,
		);
		match timer {
			Ok(handle) => self.pending_search.set_value(Some(handle)),
			Err(err) => warn!("could not schedule autocomplete search: {err:?}"),
		}
	}
}

/// Editable grid. Saved edits are written into the table's copy of the rows
/// and reported through `on_cell_change`; sort clicks only report the new
/// sort state through `on_sort_change`.
#[component]
pub fn SmartTable(
	columns: Vec<Column>,
	#[prop(into)] rows: Signal<Vec<Row>>,
	#[prop(optional, into)] on_cell_change: Option<Callback<CellChange>>,
	#[prop(optional, into)] on_sort_change: Option<Callback<Option<Sort>>>,
) -> impl IntoView {
	let table = TableHandle {
		grid: RwSignal::new(GridState::new(columns.clone(), rows.get_untracked())),
		suggestions: RwSignal::new(Vec::new()),
		pending_search: StoredValue::new(None),
		on_cell_change,
		on_sort_change,
	};
	let hovered = RwSignal::new(None::<String>);

	Effect::new(move |prev: Option<()>| {
		let rows = rows.get();
		if prev.is_some() {
			table.grid.update(|g| g.replace_rows(rows));
		}
	});

	let row_count = Memo::new(move |_| table.grid.with(|g| g.rows().len()));

	let header = columns
		.iter()
		.map(|col| {
			let (key_click, key_enter, key_hint) =
				(col.key.clone(), col.key.clone(), col.key.clone());
			view! {
				<th
					on:click=move |_| table.sort(&key_click)
					on:mouseenter=move |_| hovered.set(Some(key_enter.clone()))
					on:mouseleave=move |_| hovered.set(None)
				>
					{col.header.clone()}
					" "
					<span class="sort-indicator">
						{move || {
							let is_hovered = hovered.with(|h| h.as_deref() == Some(key_hint.as_str()));
							table.grid.with(|g| g.sort_indicator(&key_hint, is_hovered))
						}}
					</span>
				</th>
			}
		})
		.collect_view();

	let body = move || {
		(0..row_count.get())
			.map(|row_index| {
				let cells = columns
					.iter()
					.map(|col| cell_view(table, row_index, col.clone()))
					.collect_view();
				view! { <tr>{cells}</tr> }
			})
			.collect_view()
	};

	view! {
		<table class="smart-table">
			<thead>
				<tr>{header}</tr>
			</thead>
			<tbody>{body}</tbody>
		</table>
	}
}

fn cell_view(table: TableHandle, row_index: usize, column: Column) -> impl IntoView {
	let key = column.key.clone();
	let editable = column.is_editable();
	let editing = Memo::new({
		let key = key.clone();
		move |_| table.grid.with(|g| g.is_editing(row_index, &key))
	});

	view! {
		<td class:editable=editable on:click=move |_| table.start_edit(row_index, &key)>
			{move || {
				if editing.get() {
					editor(table, &column)
				} else {
					let column = column.clone();
					view! {
						<span class="cell-label">{move || table.label(row_index, &column)}</span>
					}
						.into_any()
				}
			}}
		</td>
	}
}

fn editor(table: TableHandle, column: &Column) -> AnyView {
	let pending = table
		.grid
		.with_untracked(|g| g.pending_value().cloned().unwrap_or_default());
	let on_keydown = move |ev: KeyboardEvent| table.handle_key(&ev);
	let on_blur = move |_: FocusEvent| table.save();

	match column.input {
		Some(InputKind::Select) => {
			let select_ref = NodeRef::<leptos::html::Select>::new();
			Effect::new(move |_| {
				if let Some(select) = select_ref.get() {
					let _ = select.focus();
				}
			});
			let options = column.options.clone();
			let selected = options.iter().position(|o| o.value == pending);
			let choices = options
				.iter()
				.enumerate()
				.map(|(i, o)| {
					view! {
						<option value=i.to_string() selected={selected == Some(i)}>
							{o.label.clone()}
						</option>
					}
				})
				.collect_view();
			let on_change = move |ev: web_sys::Event| {
				let picked = event_target_value(&ev)
					.parse::<usize>()
					.ok()
					.and_then(|i| options.get(i))
					.map(|o| o.value.clone())
					.unwrap_or_default();
				table.set_pending(picked);
			};
			view! {
				<select node_ref=select_ref on:change=on_change on:keydown=on_keydown on:blur=on_blur>
					<option value="" selected={selected.is_none()}>
						"—"
					</option>
					{choices}
				</select>
			}
			.into_any()
		}
		Some(InputKind::Autocomplete) => {
			let input_ref = focused_input();
			let list_id = format!("smart-table-{}-options", column.key);
			let (key_input, key_focus) = (column.key.clone(), column.key.clone());
			view! {
				<input
					node_ref=input_ref
					type="text"
					list=list_id.clone()
					prop:value=pending.to_string()
					on:input=move |ev| {
						table.set_pending(Scalar::Text(event_target_value(&ev)));
						table.request_options(key_input.clone());
					}
					on:focus=move |_| table.request_options(key_focus.clone())
					on:keydown=on_keydown
					on:blur=on_blur
				/>
				<datalist id=list_id>
					{move || {
						table
							.suggestions
							.get()
							.into_iter()
							.map(|o| view! { <option value=o.value.to_string()>{o.label}</option> })
							.collect_view()
					}}
				</datalist>
			}
			.into_any()
		}
		kind => {
			let input_ref = focused_input();
			let input_type = if kind == Some(InputKind::Number) {
				"number"
			} else {
				"text"
			};
			let column = column.clone();
			view! {
				<input
					node_ref=input_ref
					type=input_type
					prop:value=pending.to_string()
					on:input=move |ev| table.set_pending(column.parse_input(&event_target_value(&ev)))
					on:keydown=on_keydown
					on:blur=on_blur
				/>
			}
			.into_any()
		}
	}
}

fn focused_input() -> NodeRef<leptos::html::Input> {
	let input_ref = NodeRef::<leptos::html::Input>::new();
	Effect::new(move |_| {
		if let Some(input) = input_ref.get() {
			let _ = input.focus();
		}
	});
	input_ref
}

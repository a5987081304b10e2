use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Raw cell content.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Scalar {
	#[default]
	Null,
	Bool(bool),
	Number(f64),
	Text(String),
}

impl Scalar {
	pub fn is_null(&self) -> bool {
		matches!(self, Scalar::Null)
	}
}

impl fmt::Display for Scalar {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Scalar::Null => Ok(()),
			Scalar::Bool(b) => write!(f, "{b}"),
			Scalar::Number(n) => write!(f, "{n}"),
			Scalar::Text(s) => f.write_str(s),
		}
	}
}

impl From<&str> for Scalar {
	fn from(s: &str) -> Self {
		Scalar::Text(s.to_string())
	}
}

impl From<String> for Scalar {
	fn from(s: String) -> Self {
		Scalar::Text(s)
	}
}

impl From<f64> for Scalar {
	fn from(n: f64) -> Self {
		Scalar::Number(n)
	}
}

impl From<i64> for Scalar {
	fn from(n: i64) -> Self {
		Scalar::Number(n as f64)
	}
}

impl From<bool> for Scalar {
	fn from(b: bool) -> Self {
		Scalar::Bool(b)
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct SelectOption {
	pub value: Scalar,
	pub label: String,
}

impl SelectOption {
	pub fn new(value: impl Into<Scalar>, label: impl Into<String>) -> Self {
		Self {
			value: value.into(),
			label: label.into(),
		}
	}
}

/// A stored cell: either a plain value or a value that carries its own label.
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
	Raw(Scalar),
	Labeled(SelectOption),
}

impl CellValue {
	/// The underlying value, unwrapping a labeled pair.
	pub fn raw(&self) -> &Scalar {
		match self {
			CellValue::Raw(v) => v,
			CellValue::Labeled(o) => &o.value,
		}
	}
}

impl From<Scalar> for CellValue {
	fn from(value: Scalar) -> Self {
		CellValue::Raw(value)
	}
}

macro_rules! raw_cell_from {
	($($t:ty),*) => {
		$(impl From<$t> for CellValue {
			fn from(value: $t) -> Self {
				CellValue::Raw(value.into())
			}
		})*
	};
}

raw_cell_from!(&str, String, f64, i64, bool);

impl From<SelectOption> for CellValue {
	fn from(option: SelectOption) -> Self {
		CellValue::Labeled(option)
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row(BTreeMap<String, CellValue>);

impl Row {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with(mut self, key: impl Into<String>, value: impl Into<CellValue>) -> Self {
		self.0.insert(key.into(), value.into());
		self
	}

	pub fn get(&self, key: &str) -> Option<&CellValue> {
		self.0.get(key)
	}

	pub fn set(&mut self, key: impl Into<String>, value: CellValue) {
		self.0.insert(key.into(), value);
	}

	/// Raw value of a cell; a missing key reads as [`Scalar::Null`].
	pub fn raw(&self, key: &str) -> Scalar {
		self.get(key).map(|c| c.raw().clone()).unwrap_or_default()
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
	Text,
	Number,
	Select,
	Autocomplete,
}

pub type SearchFuture = Pin<Box<dyn Future<Output = Vec<SelectOption>>>>;

/// Asynchronous option lookup for autocomplete columns.
pub type SearchFn = Arc<dyn Fn(String) -> SearchFuture + Send + Sync>;

#[derive(Clone)]
pub struct Column {
	pub key: String,
	pub header: String,
	/// `None` makes the column read-only.
	pub input: Option<InputKind>,
	pub options: Vec<SelectOption>,
	pub search: Option<SearchFn>,
}

impl Column {
	pub fn new(key: impl Into<String>, header: impl Into<String>) -> Self {
		Self {
			key: key.into(),
			header: header.into(),
			input: None,
			options: Vec::new(),
			search: None,
		}
	}

	pub fn text(mut self) -> Self {
		self.input = Some(InputKind::Text);
		self
	}

	pub fn number(mut self) -> Self {
		self.input = Some(InputKind::Number);
		self
	}

	pub fn select(mut self, options: Vec<SelectOption>) -> Self {
		self.input = Some(InputKind::Select);
		self.options = options;
		self
	}

	pub fn autocomplete<F, Fut>(mut self, search: F) -> Self
	where
		F: Fn(String) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Vec<SelectOption>> + 'static,
	{
		self.input = Some(InputKind::Autocomplete);
		self.search = Some(Arc::new(move |query| Box::pin(search(query)) as SearchFuture));
		self
	}

	pub fn is_editable(&self) -> bool {
		self.input.is_some()
	}

	/// Converts text typed into this column's editor into a cell value.
	pub fn parse_input(&self, text: &str) -> Scalar {
		match self.input {
			Some(InputKind::Number) => match text.trim() {
				"" => Scalar::Null,
				t => t
					.parse::<f64>()
					.map(Scalar::Number)
					.unwrap_or_else(|_| Scalar::Text(text.to_string())),
			},
			_ => Scalar::Text(text.to_string()),
		}
	}
}

impl fmt::Debug for Column {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Column")
			.field("key", &self.key)
			.field("header", &self.header)
			.field("input", &self.input)
			.field("options", &self.options)
			.field("search", &self.search.is_some())
			.finish()
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
	Asc,
	Desc,
}

impl fmt::Display for SortOrder {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			SortOrder::Asc => "ASC",
			SortOrder::Desc => "DESC",
		})
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sort {
	pub column_key: String,
	pub order: SortOrder,
}

/// Emitted when an edit is saved.
#[derive(Clone, Debug, PartialEq)]
pub struct CellChange {
	pub row_index: usize,
	pub column_key: String,
	pub value: Scalar,
}

use thiserror::Error;
use wasm_bindgen::JsValue;

/// Failures at the browser boundary while mounting the graph canvas.
#[derive(Debug, Error)]
pub enum CanvasError {
	#[error("no browser window available")]
	NoWindow,
	#[error("canvas does not provide a 2d context")]
	NoContext,
	#[error("browser call failed: {0}")]
	Js(String),
}

impl From<JsValue> for CanvasError {
	fn from(value: JsValue) -> Self {
		CanvasError::Js(value.as_string().unwrap_or_else(|| format!("{value:?}")))
	}
}

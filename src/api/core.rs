//! WASM API for the span annotation engine
//!
//! JavaScript-facing functions over the WASM-owned engine state. The JS
//! layer supplies document text, persisted annotations and the codebook,
//! feeds normalized gesture events through, and reads back paint
//! instructions, popup rows and the exported annotation set.

use lazy_static::lazy_static;
use std::sync::Mutex;
use wasm_bindgen::prelude::*;

use crate::api::helpers::{deserialize, serialize, validate_index, validation_error};
use crate::models::{Code, Codebook, ContextUnit, EngineState, RawAnnotation, TextUnit};
use crate::select::{InputEvent, Outcome, PopupChoice};
use crate::{wasm_info, wasm_log};

// WASM-owned engine storage (canonical source of truth)
lazy_static! {
    static ref ENGINE: Mutex<Option<EngineState>> = Mutex::new(None);
}

/// Serialized transition outcome handed back to JS
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum OutcomeView {
    None,
    CursorMoved { token: usize },
    SelectionChanged,
    PopupOpened { token: usize },
    Committed { annotations: Vec<RawAnnotation> },
    Dismissed,
}

impl From<Outcome> for OutcomeView {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::None => OutcomeView::None,
            Outcome::CursorMoved { token } => OutcomeView::CursorMoved { token },
            Outcome::SelectionChanged => OutcomeView::SelectionChanged,
            Outcome::PopupOpened { token } => OutcomeView::PopupOpened { token },
            Outcome::Committed { annotations } => OutcomeView::Committed { annotations },
            Outcome::Dismissed => OutcomeView::Dismissed,
        }
    }
}

fn with_engine<T>(f: impl FnOnce(&mut EngineState) -> Result<T, JsValue>) -> Result<T, JsValue> {
    let mut guard = ENGINE
        .lock()
        .map_err(|_| validation_error("engine state poisoned"))?;
    match guard.as_mut() {
        Some(engine) => f(engine),
        None => Err(validation_error("no document loaded")),
    }
}

/// Load a document with its persisted annotations and codebook codes.
///
/// Returns the number of annotations dropped as malformed (out of
/// bounds or stale); the rest of the document always loads.
#[wasm_bindgen(js_name = loadDocument)]
pub fn load_document(
    text: &str,
    annotations_js: JsValue,
    codes_js: JsValue,
    variable: &str,
    editable: bool,
) -> Result<usize, JsValue> {
    let annotations: Vec<RawAnnotation> =
        deserialize(annotations_js, "Failed to deserialize annotations")?;
    let codes: Vec<Code> = deserialize(codes_js, "Failed to deserialize codebook codes")?;
    let codebook = Codebook::from_codes(variable, codes);

    let (engine, dropped) = EngineState::load(text, &annotations, codebook, variable, editable);
    wasm_info!(
        "loadDocument: {} tokens, {} annotations ({} dropped)",
        engine.tokens.len(),
        annotations.len(),
        dropped
    );

    let mut guard = ENGINE
        .lock()
        .map_err(|_| validation_error("engine state poisoned"))?;
    *guard = Some(engine);
    Ok(dropped)
}

/// Discard the loaded document and any in-flight gesture
#[wasm_bindgen(js_name = unloadDocument)]
pub fn unload_document() {
    if let Ok(mut guard) = ENGINE.lock() {
        *guard = None;
    }
}

/// Set the unit of work and context window, re-resolving the token view
#[wasm_bindgen(js_name = setUnit)]
pub fn set_unit(unit_js: JsValue, context_js: JsValue) -> Result<JsValue, JsValue> {
    let unit: TextUnit = deserialize(unit_js, "Failed to deserialize unit descriptor")?;
    let context: ContextUnit =
        deserialize(context_js, "Failed to deserialize context descriptor")?;

    with_engine(|engine| {
        engine.set_unit(unit, context);
        wasm_log!(
            "setUnit: primary {:?}, {} windowed tokens",
            engine.window.primary,
            engine.window.tokens.len()
        );
        serialize(&engine.window.tokens, "Failed to serialize window")
    })
}

/// Replace the codebook codes for a variable (read-time view change)
#[wasm_bindgen(js_name = setCodebook)]
pub fn set_codebook(variable: &str, codes_js: JsValue) -> Result<(), JsValue> {
    let codes: Vec<Code> = deserialize(codes_js, "Failed to deserialize codebook codes")?;
    with_engine(|engine| {
        let mut codebook = engine.codebook.clone();
        codebook.set_variable(variable, codes);
        engine.set_codebook(codebook);
        Ok(())
    })
}

/// Feed one normalized gesture event through the selection machine
#[wasm_bindgen(js_name = gesture)]
pub fn gesture(event_js: JsValue) -> Result<JsValue, JsValue> {
    let event: InputEvent = deserialize(event_js, "Failed to deserialize input event")?;
    with_engine(|engine| {
        let outcome = OutcomeView::from(engine.gesture(event));
        serialize(&outcome, "Failed to serialize outcome")
    })
}

/// Resolve the open popup with a code choice, delete or cancel
#[wasm_bindgen(js_name = popupChoice)]
pub fn popup_choice(choice_js: JsValue) -> Result<JsValue, JsValue> {
    let choice: PopupChoice = deserialize(choice_js, "Failed to deserialize popup choice")?;
    with_engine(|engine| {
        let outcome = OutcomeView::from(engine.popup_choice(choice));
        serialize(&outcome, "Failed to serialize outcome")
    })
}

/// Paint instructions for every token in the current window
#[wasm_bindgen(js_name = getTokenPaints)]
pub fn get_token_paints() -> Result<JsValue, JsValue> {
    with_engine(|engine| serialize(&engine.token_paints(), "Failed to serialize paints"))
}

/// Popup rows for the annotations covering a window position
#[wasm_bindgen(js_name = getPopupRows)]
pub fn get_popup_rows(array_index: usize) -> Result<JsValue, JsValue> {
    with_engine(|engine| {
        validate_index(array_index, engine.window.tokens.len(), "token")
            .map_err(validation_error)?;
        serialize(&engine.popup_rows(array_index), "Failed to serialize popup rows")
    })
}

/// The annotations side-table (one row per span)
#[wasm_bindgen(js_name = getAnnotationRows)]
pub fn get_annotation_rows() -> Result<JsValue, JsValue> {
    with_engine(|engine| {
        serialize(&engine.annotation_rows(), "Failed to serialize annotation rows")
    })
}

/// Recently used code values, most recent first
#[wasm_bindgen(js_name = getCodeHistory)]
pub fn get_code_history() -> Result<JsValue, JsValue> {
    with_engine(|engine| {
        let values: Vec<String> = engine.machine.history.values().to_vec();
        serialize(&values, "Failed to serialize code history")
    })
}

/// The authoritative annotation set in persisted offset/length form
#[wasm_bindgen(js_name = exportAnnotations)]
pub fn export_annotations() -> Result<JsValue, JsValue> {
    with_engine(|engine| {
        serialize(&engine.export_annotations(), "Failed to serialize annotations")
    })
}

// JS clocks arrive as f64; NaN and negative values clamp to 0 instead
// of wrapping through the cast.
fn clock_ms(now_ms: f64) -> u64 {
    now_ms.max(0.0) as u64
}

/// Buffer a job setting; superseded pending values are discarded
#[wasm_bindgen(js_name = submitSetting)]
pub fn submit_setting(key: &str, value_js: JsValue, now_ms: f64) -> Result<(), JsValue> {
    let value: serde_json::Value = deserialize(value_js, "Failed to deserialize setting value")?;
    with_engine(|engine| {
        engine.settings.submit(key, value, clock_ms(now_ms));
        Ok(())
    })
}

/// Flush settings whose quiescence window has elapsed
#[wasm_bindgen(js_name = pollSettings)]
pub fn poll_settings(now_ms: f64) -> Result<JsValue, JsValue> {
    with_engine(|engine| {
        let flushed = engine.settings.poll(clock_ms(now_ms));
        serialize(&flushed, "Failed to serialize flushed settings")
    })
}

//! Engine state management
//!
//! `EngineState` is the WASM-owned source of truth: the tokenized
//! document, the annotation index, the active codebook, the resolved
//! unit window and the selection machine. The JS layer only ever sees
//! serialized views of it.
//!
//! Lifecycle rules: loading a document rebuilds tokens and index and
//! hard-resets the selection machine; changing the unit or context
//! re-resolves the window and also resets the machine, so no gesture
//! ever spans two contexts.

use crate::index::AnnotationIndex;
use crate::models::{Codebook, ContextUnit, RawAnnotation, TextUnit, Token};
use crate::render::{self, AnnotationRow, PopupRow, TokenPaint};
use crate::select::{InputEvent, Outcome, PopupChoice, SelectionMachine};
use crate::settings::DebouncedSettings;
use crate::tokenize::tokenize;
use crate::window::{resolve_window, UnitWindow};

/// Complete annotation engine state (WASM-owned source of truth)
#[derive(Clone, Debug)]
pub struct EngineState {
    /// Source document text
    pub text: String,
    /// Full document token stream
    pub tokens: Vec<Token>,
    /// The annotation index, mutated only through commits
    pub index: AnnotationIndex,
    /// Active codebook
    pub codebook: Codebook,
    /// Current unit and context descriptors
    pub unit: TextUnit,
    pub context: ContextUnit,
    /// Resolved window for the current unit
    pub window: UnitWindow,
    /// Selection and editing state machine
    pub machine: SelectionMachine,
    /// Debounced job-settings buffer
    pub settings: DebouncedSettings,
}

impl EngineState {
    /// Load a document: tokenize, build the index, reset everything else.
    ///
    /// Returns the number of annotations dropped as malformed.
    pub fn load(
        text: &str,
        annotations: &[RawAnnotation],
        codebook: Codebook,
        variable: &str,
        editable: bool,
    ) -> (Self, usize) {
        let tokens = tokenize(text);
        let (index, dropped) = AnnotationIndex::build(annotations, &tokens);
        let unit = TextUnit::Document;
        let context = ContextUnit::default();
        let window = resolve_window(&tokens, unit, &context);

        let state = Self {
            text: text.to_string(),
            tokens,
            index,
            codebook,
            unit,
            context,
            window,
            machine: SelectionMachine::new(variable, editable),
            settings: DebouncedSettings::default(),
        };
        (state, dropped.len())
    }

    /// Change the unit of work and its context window.
    ///
    /// Any in-flight gesture is discarded: a selection made against the
    /// old window must not leak into the new one.
    pub fn set_unit(&mut self, unit: TextUnit, context: ContextUnit) {
        self.unit = unit;
        self.context = context;
        self.window = resolve_window(&self.tokens, unit, &context);
        self.machine.reset();
    }

    /// Replace the codebook (read-time view change, never touches the
    /// index)
    pub fn set_codebook(&mut self, codebook: Codebook) {
        self.codebook = codebook;
    }

    /// Feed a gesture event through the selection machine
    pub fn gesture(&mut self, event: InputEvent) -> Outcome {
        self.machine.handle(event, &self.window, &self.index)
    }

    /// Resolve an open popup choice, mutating the index on commit.
    ///
    /// A free-text `NewCode` registers the value in the codebook only
    /// once the machine actually commits it; a refused or dismissed
    /// choice leaves the codebook untouched (its color comes from the
    /// deterministic allocator unless an override is set later).
    pub fn popup_choice(&mut self, choice: PopupChoice) -> Outcome {
        let new_value = match &choice {
            PopupChoice::NewCode { value } => Some(value.clone()),
            _ => None,
        };
        let outcome = self
            .machine
            .resolve_popup(choice, &mut self.index, &self.tokens);
        if let (Some(value), Outcome::Committed { .. }) = (new_value, &outcome) {
            let variable = self.machine.variable().to_string();
            self.codebook.add_code(&variable, &value);
        }
        outcome
    }

    /// Paint instructions for the current window
    pub fn token_paints(&self) -> Vec<TokenPaint> {
        render::paint_tokens(
            &self.window,
            &self.index,
            &self.codebook,
            self.machine.selection(),
        )
    }

    /// Popup rows for a window position
    pub fn popup_rows(&self, array_index: usize) -> Vec<PopupRow> {
        match self.window.absolute_index(array_index) {
            Some(token_index) => render::popup_rows(&self.index, &self.codebook, token_index),
            None => Vec::new(),
        }
    }

    /// The annotations side-table for the whole document
    pub fn annotation_rows(&self) -> Vec<AnnotationRow> {
        render::annotation_rows(&self.index, &self.codebook, &self.tokens)
    }

    /// The authoritative annotation set in persisted (offset) form
    pub fn export_annotations(&self) -> Vec<RawAnnotation> {
        self.index.to_raw(&self.tokens)
    }
}

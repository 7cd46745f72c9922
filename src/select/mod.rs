//! Selection and editing state machine
//!
//! Consumes normalized input events (pointer, keyboard, touch reduced to
//! one abstract alphabet) to track an in-progress token selection, and on
//! commit mutates the annotation index with remove-then-add semantics.
//!
//! All state lives in the machine and is passed context explicitly; there
//! is no ambient shared selection. Anchor and focus preserve drag
//! direction and are normalized only at the point of use.

pub mod history;

pub use history::RecentCodeHistory;

use serde::{Deserialize, Serialize};

use crate::index::AnnotationIndex;
use crate::models::{AnnotationId, RawAnnotation, Token, TokenSpan};
use crate::window::UnitWindow;

/// Horizontal navigation direction for keyboard input
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    Left,
    Right,
}

/// The abstract input alphabet, as produced by the input-capture layer.
///
/// Token fields are window (array) indices. `held` distinguishes a press
/// held past the hold threshold from a short press; the threshold itself
/// is measured by the capture layer.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum InputEvent {
    PointerDown { token: usize },
    PointerDrag { token: usize },
    PointerUp { held: bool },
    KeyArrow { dir: Direction },
    KeySpaceDown,
    KeySpaceUp { held: bool },
    Tap { token: usize, count: u8 },
    Escape,
}

/// How an open popup is resolved
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PopupChoice {
    /// Choose an existing code value
    Code { value: String },
    /// Create a new code via free text, then choose it
    NewCode { value: String },
    /// Remove the annotation the popup was opened on
    Delete,
    /// Close without touching the index
    Cancel,
}

/// Machine state
#[derive(Clone, Debug, PartialEq)]
pub enum Phase {
    Idle,
    /// Anchor set, focus tracking (window indices, drag order preserved)
    Selecting { anchor: usize, focus: usize },
    /// A span is finalized or an existing annotation was activated,
    /// awaiting a code choice
    PopupOpen {
        /// Absolute token span the choice will apply to
        span: TokenSpan,
        /// Present when opened on an existing annotation
        existing: Option<(AnnotationId, String)>,
        /// Window index to anchor the popup at
        token: usize,
    },
}

/// What a transition produced, for the render/persistence layers
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    None,
    /// The current token moved (keyboard navigation, single tap)
    CursorMoved { token: usize },
    /// The in-progress selection changed
    SelectionChanged,
    /// A popup should be shown at the given window index
    PopupOpened { token: usize },
    /// The index was mutated; carries the new authoritative annotation set
    Committed { annotations: Vec<RawAnnotation> },
    /// Selection or popup was dismissed without mutation
    Dismissed,
}

/// The selection and editing state machine
#[derive(Clone, Debug)]
pub struct SelectionMachine {
    phase: Phase,
    /// Current token (window index) for keyboard navigation and popups
    cursor: usize,
    /// The codebook variable commits are written under
    variable: String,
    /// Capability flag: when false, gestures may view but never mutate
    editable: bool,
    pub history: RecentCodeHistory,
}

impl SelectionMachine {
    pub fn new(variable: &str, editable: bool) -> Self {
        Self {
            phase: Phase::Idle,
            cursor: 0,
            variable: variable.to_string(),
            editable,
            history: RecentCodeHistory::default(),
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// The in-progress selection as a normalized window-index range.
    /// Always `(min, max)` regardless of drag direction.
    pub fn selection(&self) -> Option<(usize, usize)> {
        match self.phase {
            Phase::Selecting { anchor, focus } => {
                Some((anchor.min(focus), anchor.max(focus)))
            }
            _ => None,
        }
    }

    /// Hard reset to Idle, discarding any in-flight gesture.
    ///
    /// Called when the document or unit changes mid-gesture, so a stale
    /// selection can never leak across contexts.
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.cursor = 0;
    }

    /// Feed one input event through the machine.
    ///
    /// Reading the index is allowed here (activation checks); mutation
    /// only ever happens in [`SelectionMachine::resolve_popup`].
    pub fn handle(
        &mut self,
        event: InputEvent,
        window: &UnitWindow,
        index: &AnnotationIndex,
    ) -> Outcome {
        if window.tokens.is_empty() {
            return Outcome::None;
        }
        self.cursor = self.cursor.min(window.tokens.len() - 1);

        match (&self.phase, event) {
            // popup consumes everything except escape
            (Phase::PopupOpen { .. }, InputEvent::Escape) => {
                self.phase = Phase::Idle;
                Outcome::Dismissed
            }
            (Phase::PopupOpen { .. }, _) => Outcome::None,

            (_, InputEvent::Escape) => {
                let was_idle = self.phase == Phase::Idle;
                self.phase = Phase::Idle;
                if was_idle {
                    Outcome::None
                } else {
                    Outcome::Dismissed
                }
            }

            (Phase::Idle, InputEvent::PointerDown { token }) => {
                self.cursor = self.clamp(token, window);
                if self.can_select(self.cursor, window) {
                    self.phase = Phase::Selecting {
                        anchor: self.cursor,
                        focus: self.cursor,
                    };
                    Outcome::SelectionChanged
                } else {
                    Outcome::CursorMoved { token: self.cursor }
                }
            }

            (Phase::Selecting { anchor, .. }, InputEvent::PointerDrag { token })
            | (Phase::Selecting { anchor, .. }, InputEvent::PointerDown { token }) => {
                let anchor = *anchor;
                let focus = self.clamp(token, window);
                self.cursor = focus;
                self.phase = Phase::Selecting { anchor, focus };
                Outcome::SelectionChanged
            }

            (Phase::Selecting { anchor, focus }, InputEvent::PointerUp { held })
            | (Phase::Selecting { anchor, focus }, InputEvent::KeySpaceUp { held }) => {
                let (anchor, focus) = (*anchor, *focus);
                self.commit(anchor, focus, held, window, index)
            }

            (Phase::Idle, InputEvent::PointerUp { held: false })
            | (Phase::Idle, InputEvent::KeySpaceUp { held: false }) => {
                // short press without a selection: activate an existing
                // annotation under the cursor, if any
                self.activate(self.cursor, window, index)
            }
            (Phase::Idle, InputEvent::PointerUp { .. })
            | (Phase::Idle, InputEvent::KeySpaceUp { .. }) => Outcome::None,

            (Phase::Idle, InputEvent::KeyArrow { dir }) => {
                self.cursor = self.step(self.cursor, dir, window);
                Outcome::CursorMoved { token: self.cursor }
            }
            (Phase::Selecting { anchor, .. }, InputEvent::KeyArrow { dir }) => {
                let anchor = *anchor;
                let focus = self.step(self.cursor, dir, window);
                self.cursor = focus;
                self.phase = Phase::Selecting { anchor, focus };
                Outcome::SelectionChanged
            }

            (Phase::Idle, InputEvent::KeySpaceDown) => {
                if self.can_select(self.cursor, window) {
                    self.phase = Phase::Selecting {
                        anchor: self.cursor,
                        focus: self.cursor,
                    };
                    Outcome::SelectionChanged
                } else {
                    Outcome::None
                }
            }
            (Phase::Selecting { .. }, InputEvent::KeySpaceDown) => Outcome::None,

            (Phase::Idle, InputEvent::Tap { token, count }) => {
                self.cursor = self.clamp(token, window);
                match count {
                    1 => Outcome::CursorMoved { token: self.cursor },
                    2 => {
                        if self.can_select(self.cursor, window) {
                            self.phase = Phase::Selecting {
                                anchor: self.cursor,
                                focus: self.cursor,
                            };
                            Outcome::SelectionChanged
                        } else {
                            Outcome::None
                        }
                    }
                    _ => self.activate(self.cursor, window, index),
                }
            }
            (Phase::Selecting { anchor, .. }, InputEvent::Tap { token, .. }) => {
                // touch flow: the second tap on another token closes the span
                let anchor = *anchor;
                let focus = self.clamp(token, window);
                self.cursor = focus;
                self.commit(anchor, focus, true, window, index)
            }

            (Phase::Idle, InputEvent::PointerDrag { .. }) => Outcome::None,
        }
    }

    /// Resolve an open popup. This is the only place the index is
    /// mutated: removal of the old span and insertion of the new one
    /// happen back-to-back inside this single transition, so no reader
    /// ever observes a half-edited span.
    pub fn resolve_popup(
        &mut self,
        choice: PopupChoice,
        index: &mut AnnotationIndex,
        tokens: &[Token],
    ) -> Outcome {
        let Phase::PopupOpen { span, existing, .. } = self.phase.clone() else {
            return Outcome::None;
        };
        self.phase = Phase::Idle;

        match choice {
            PopupChoice::Cancel => Outcome::Dismissed,

            PopupChoice::Delete => match existing {
                Some((id, _)) if self.editable => {
                    index.remove_span(id);
                    Outcome::Committed {
                        annotations: index.to_raw(tokens),
                    }
                }
                _ => Outcome::Dismissed,
            },

            PopupChoice::Code { value } | PopupChoice::NewCode { value } => {
                if !self.editable {
                    return Outcome::Dismissed;
                }
                match existing {
                    Some((id, old_value)) => {
                        index.remove_span(id);
                        // choosing the current value again means delete
                        if value != old_value {
                            index.add_span(span, &self.variable, &value);
                            self.history.push(&value);
                        }
                    }
                    None => {
                        index.add_span(span, &self.variable, &value);
                        self.history.push(&value);
                    }
                }
                Outcome::Committed {
                    annotations: index.to_raw(tokens),
                }
            }
        }
    }

    fn clamp(&self, token: usize, window: &UnitWindow) -> usize {
        token.min(window.tokens.len() - 1)
    }

    fn step(&self, from: usize, dir: Direction, window: &UnitWindow) -> usize {
        match dir {
            Direction::Left => from.saturating_sub(1),
            Direction::Right => self.clamp(from + 1, window),
        }
    }

    fn can_select(&self, token: usize, window: &UnitWindow) -> bool {
        self.editable && window.get(token).map(|t| t.codable).unwrap_or(false)
    }

    /// Open the popup on an existing annotation at a window index
    fn activate(
        &mut self,
        token: usize,
        window: &UnitWindow,
        index: &AnnotationIndex,
    ) -> Outcome {
        let Some(absolute) = window.absolute_index(token) else {
            return Outcome::None;
        };
        let entries = index.query_token(absolute);
        let Some(first) = entries.first() else {
            return Outcome::None;
        };
        self.phase = Phase::PopupOpen {
            span: first.span,
            existing: Some((first.id, first.value.clone())),
            token,
        };
        Outcome::PopupOpened { token }
    }

    /// Commit gesture: finalize the selection into a popup, or refuse it.
    ///
    /// A short press on a single annotated token activates the existing
    /// annotation instead of opening a creation popup.
    fn commit(
        &mut self,
        anchor: usize,
        focus: usize,
        held: bool,
        window: &UnitWindow,
        index: &AnnotationIndex,
    ) -> Outcome {
        self.phase = Phase::Idle;
        let (lo, hi) = (anchor.min(focus), anchor.max(focus));

        if !held && lo == hi {
            let activated = self.activate(lo, window, index);
            if activated != Outcome::None {
                return activated;
            }
        }

        if !self.editable {
            return Outcome::Dismissed;
        }

        // the whole range must exist and be codable
        let all_codable = (lo..=hi).all(|i| window.get(i).map(|t| t.codable).unwrap_or(false));
        if !all_codable {
            return Outcome::Dismissed;
        }
        let (Some(start), Some(end)) = (window.absolute_index(lo), window.absolute_index(hi))
        else {
            return Outcome::Dismissed;
        };

        self.phase = Phase::PopupOpen {
            span: (start, end),
            existing: None,
            token: hi,
        };
        Outcome::PopupOpened { token: hi }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContextScope, ContextUnit, RawAnnotation, TextUnit};
    use crate::tokenize::tokenize;
    use crate::window::{resolve_window, UnitWindow};

    fn setup(text: &str, raw: &[RawAnnotation]) -> (Vec<Token>, UnitWindow, AnnotationIndex) {
        let tokens = tokenize(text);
        let window = resolve_window(
            &tokens,
            TextUnit::Document,
            &ContextUnit::new(ContextScope::Document),
        );
        let (index, _) = AnnotationIndex::build(raw, &tokens);
        (tokens, window, index)
    }

    #[test]
    fn test_drag_selection_normalized_both_directions() {
        let (_, window, index) = setup("The cat sat.", &[]);
        let mut machine = SelectionMachine::new("topic", true);

        machine.handle(InputEvent::PointerDown { token: 2 }, &window, &index);
        machine.handle(InputEvent::PointerDrag { token: 0 }, &window, &index);
        // backwards drag still yields (min, max)
        assert_eq!(machine.selection(), Some((0, 2)));

        machine.handle(InputEvent::PointerDrag { token: 3 }, &window, &index);
        assert_eq!(machine.selection(), Some((2, 3)));
    }

    #[test]
    fn test_select_and_assign_code() {
        let (tokens, window, mut index) = setup("The cat sat.", &[]);
        let mut machine = SelectionMachine::new("topic", true);

        machine.handle(InputEvent::PointerDown { token: 1 }, &window, &index);
        let outcome = machine.handle(InputEvent::PointerUp { held: true }, &window, &index);
        assert_eq!(outcome, Outcome::PopupOpened { token: 1 });

        let outcome = machine.resolve_popup(
            PopupChoice::Code {
                value: "ANIMAL".to_string(),
            },
            &mut index,
            &tokens,
        );
        let Outcome::Committed { annotations } = outcome else {
            panic!("expected commit, got {:?}", outcome);
        };
        assert_eq!(annotations, vec![RawAnnotation::new(4, 3, "topic", "ANIMAL")]);
        assert_eq!(machine.history.values(), ["ANIMAL"]);
        assert_eq!(*machine.phase(), Phase::Idle);
    }

    #[test]
    fn test_short_press_activates_existing() {
        let raw = vec![RawAnnotation::new(4, 3, "topic", "ANIMAL")];
        let (_, window, index) = setup("The cat sat.", &raw);
        let mut machine = SelectionMachine::new("topic", true);

        machine.handle(InputEvent::PointerDown { token: 1 }, &window, &index);
        let outcome = machine.handle(InputEvent::PointerUp { held: false }, &window, &index);
        assert_eq!(outcome, Outcome::PopupOpened { token: 1 });
        match machine.phase() {
            Phase::PopupOpen { existing: Some((_, value)), span, .. } => {
                assert_eq!(value, "ANIMAL");
                assert_eq!(*span, (1, 1));
            }
            other => panic!("expected popup on existing annotation, got {:?}", other),
        }
    }

    #[test]
    fn test_reassigning_same_value_deletes() {
        let raw = vec![RawAnnotation::new(4, 3, "topic", "ANIMAL")];
        let (tokens, window, mut index) = setup("The cat sat.", &raw);
        let mut machine = SelectionMachine::new("topic", true);

        machine.handle(InputEvent::PointerDown { token: 1 }, &window, &index);
        machine.handle(InputEvent::PointerUp { held: false }, &window, &index);
        let outcome = machine.resolve_popup(
            PopupChoice::Code {
                value: "ANIMAL".to_string(),
            },
            &mut index,
            &tokens,
        );

        assert_eq!(outcome, Outcome::Committed { annotations: vec![] });
        assert!(index.query_token(1).is_empty());
        // a delete records nothing
        assert!(machine.history.values().is_empty());
    }

    #[test]
    fn test_edit_replaces_value_with_same_span() {
        let raw = vec![RawAnnotation::new(4, 3, "topic", "ANIMAL")];
        let (tokens, window, mut index) = setup("The cat sat.", &raw);
        let mut machine = SelectionMachine::new("topic", true);

        machine.handle(InputEvent::PointerDown { token: 1 }, &window, &index);
        machine.handle(InputEvent::PointerUp { held: false }, &window, &index);
        let outcome = machine.resolve_popup(
            PopupChoice::Code {
                value: "PET".to_string(),
            },
            &mut index,
            &tokens,
        );

        let Outcome::Committed { annotations } = outcome else {
            panic!("expected commit");
        };
        assert_eq!(annotations, vec![RawAnnotation::new(4, 3, "topic", "PET")]);
        let entries = index.query_token(1);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].value, "PET");
        assert_eq!(entries[0].span, (1, 1));
    }

    #[test]
    fn test_cancel_leaves_index_untouched() {
        let raw = vec![RawAnnotation::new(4, 3, "topic", "ANIMAL")];
        let (tokens, window, mut index) = setup("The cat sat.", &raw);
        let original = index.clone();
        let mut machine = SelectionMachine::new("topic", true);

        machine.handle(InputEvent::PointerDown { token: 1 }, &window, &index);
        machine.handle(InputEvent::PointerUp { held: false }, &window, &index);
        let outcome = machine.resolve_popup(PopupChoice::Cancel, &mut index, &tokens);

        assert_eq!(outcome, Outcome::Dismissed);
        assert_eq!(index, original);
        assert_eq!(*machine.phase(), Phase::Idle);
    }

    #[test]
    fn test_selection_over_non_codable_refused() {
        let text = "one two\n\nthree four five";
        let tokens = tokenize(text);
        let mut context = ContextUnit::new(ContextScope::Paragraph);
        context.paragraph = (1, 0);
        let window = resolve_window(&tokens, TextUnit::Paragraph { index: 1 }, &context);
        let (index, _) = AnnotationIndex::build(&[], &tokens);
        let mut machine = SelectionMachine::new("topic", true);

        // tokens 0-1 are context (not codable); start inside the unit
        // and drag into context
        machine.handle(InputEvent::PointerDown { token: 2 }, &window, &index);
        machine.handle(InputEvent::PointerDrag { token: 0 }, &window, &index);
        let outcome = machine.handle(InputEvent::PointerUp { held: true }, &window, &index);

        assert_eq!(outcome, Outcome::Dismissed);
        assert_eq!(*machine.phase(), Phase::Idle);
    }

    #[test]
    fn test_pointer_down_on_context_token_does_not_select() {
        let text = "one two\n\nthree";
        let tokens = tokenize(text);
        let mut context = ContextUnit::new(ContextScope::Paragraph);
        context.paragraph = (1, 0);
        let window = resolve_window(&tokens, TextUnit::Paragraph { index: 1 }, &context);
        let (index, _) = AnnotationIndex::build(&[], &tokens);
        let mut machine = SelectionMachine::new("topic", true);

        let outcome = machine.handle(InputEvent::PointerDown { token: 0 }, &window, &index);
        assert_eq!(outcome, Outcome::CursorMoved { token: 0 });
        assert_eq!(machine.selection(), None);
    }

    #[test]
    fn test_keyboard_selection_flow() {
        let (_, window, index) = setup("The cat sat.", &[]);
        let mut machine = SelectionMachine::new("topic", true);

        machine.handle(
            InputEvent::KeyArrow { dir: Direction::Right },
            &window,
            &index,
        );
        machine.handle(InputEvent::KeySpaceDown, &window, &index);
        machine.handle(
            InputEvent::KeyArrow { dir: Direction::Right },
            &window,
            &index,
        );
        assert_eq!(machine.selection(), Some((1, 2)));

        let outcome = machine.handle(InputEvent::KeySpaceUp { held: true }, &window, &index);
        assert_eq!(outcome, Outcome::PopupOpened { token: 2 });
    }

    #[test]
    fn test_arrow_clamped_at_edges() {
        let (_, window, index) = setup("a b", &[]);
        let mut machine = SelectionMachine::new("topic", true);

        let outcome = machine.handle(
            InputEvent::KeyArrow { dir: Direction::Left },
            &window,
            &index,
        );
        assert_eq!(outcome, Outcome::CursorMoved { token: 0 });

        for _ in 0..5 {
            machine.handle(
                InputEvent::KeyArrow { dir: Direction::Right },
                &window,
                &index,
            );
        }
        assert_eq!(machine.cursor(), 1);
    }

    #[test]
    fn test_touch_tap_flow() {
        let (_, window, index) = setup("The cat sat.", &[]);
        let mut machine = SelectionMachine::new("topic", true);

        machine.handle(InputEvent::Tap { token: 1, count: 2 }, &window, &index);
        assert_eq!(machine.selection(), Some((1, 1)));

        let outcome = machine.handle(InputEvent::Tap { token: 2, count: 1 }, &window, &index);
        assert_eq!(outcome, Outcome::PopupOpened { token: 2 });
        match machine.phase() {
            Phase::PopupOpen { span, existing: None, .. } => assert_eq!(*span, (1, 2)),
            other => panic!("expected creation popup, got {:?}", other),
        }
    }

    #[test]
    fn test_triple_tap_activates() {
        let raw = vec![RawAnnotation::new(4, 3, "topic", "ANIMAL")];
        let (_, window, index) = setup("The cat sat.", &raw);
        let mut machine = SelectionMachine::new("topic", true);

        let outcome = machine.handle(InputEvent::Tap { token: 1, count: 3 }, &window, &index);
        assert_eq!(outcome, Outcome::PopupOpened { token: 1 });
    }

    #[test]
    fn test_escape_cancels_selection() {
        let (_, window, index) = setup("The cat sat.", &[]);
        let mut machine = SelectionMachine::new("topic", true);

        machine.handle(InputEvent::PointerDown { token: 0 }, &window, &index);
        let outcome = machine.handle(InputEvent::Escape, &window, &index);
        assert_eq!(outcome, Outcome::Dismissed);
        assert_eq!(machine.selection(), None);
    }

    #[test]
    fn test_reset_discards_in_flight_gesture() {
        let (_, window, index) = setup("The cat sat.", &[]);
        let mut machine = SelectionMachine::new("topic", true);

        machine.handle(InputEvent::PointerDown { token: 2 }, &window, &index);
        assert!(machine.selection().is_some());
        machine.reset();
        assert_eq!(*machine.phase(), Phase::Idle);
        assert_eq!(machine.cursor(), 0);
    }

    #[test]
    fn test_read_only_machine_never_mutates() {
        let raw = vec![RawAnnotation::new(4, 3, "topic", "ANIMAL")];
        let (tokens, window, mut index) = setup("The cat sat.", &raw);
        let original = index.clone();
        let mut machine = SelectionMachine::new("topic", false);

        // cannot start a selection
        let outcome = machine.handle(InputEvent::PointerDown { token: 0 }, &window, &index);
        assert_eq!(outcome, Outcome::CursorMoved { token: 0 });

        // activation for viewing still works
        machine.handle(InputEvent::PointerDown { token: 1 }, &window, &index);
        let outcome = machine.handle(InputEvent::PointerUp { held: false }, &window, &index);
        assert_eq!(outcome, Outcome::PopupOpened { token: 1 });

        // but resolution refuses to write
        let outcome = machine.resolve_popup(PopupChoice::Delete, &mut index, &tokens);
        assert_eq!(outcome, Outcome::Dismissed);
        assert_eq!(index, original);
    }

    #[test]
    fn test_popup_swallows_other_events() {
        let raw = vec![RawAnnotation::new(4, 3, "topic", "ANIMAL")];
        let (_, window, index) = setup("The cat sat.", &raw);
        let mut machine = SelectionMachine::new("topic", true);

        machine.handle(InputEvent::Tap { token: 1, count: 3 }, &window, &index);
        let outcome = machine.handle(InputEvent::PointerDown { token: 0 }, &window, &index);
        assert_eq!(outcome, Outcome::None);
        assert!(matches!(machine.phase(), Phase::PopupOpen { .. }));
    }
}

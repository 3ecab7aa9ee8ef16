//! Annotation mode state machine and keyboard commands

use serde::{Deserialize, Serialize};

use crate::annotations::AnnotationType;

/// Current pointer interaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationMode {
    /// Neutral mode: pan the document, click annotations
    #[default]
    Cursor,
    Highlight,
    Underline,
}

impl AnnotationMode {
    /// Annotation type created by a selection in this mode
    pub fn selection_kind(self) -> Option<AnnotationType> {
        match self {
            AnnotationMode::Cursor => None,
            AnnotationMode::Highlight => Some(AnnotationType::Highlight),
            AnnotationMode::Underline => Some(AnnotationType::Underline),
        }
    }
}

/// What happens to the mode after a selection creates annotations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModePolicy {
    /// Stay in highlight/underline until the user switches
    #[default]
    Sticky,
    /// Return to cursor mode after each successful selection
    RevertToCursor,
}

/// Pointer behavior the viewer should use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerBehavior {
    Pan,
    TextSelect,
}

/// Tracks the active mode
#[derive(Debug, Clone, Default)]
pub struct ModeMachine {
    mode: AnnotationMode,
    policy: ModePolicy,
}

impl ModeMachine {
    pub fn new(policy: ModePolicy) -> Self {
        Self {
            mode: AnnotationMode::Cursor,
            policy,
        }
    }

    pub fn mode(&self) -> AnnotationMode {
        self.mode
    }

    pub fn policy(&self) -> ModePolicy {
        self.policy
    }

    /// Explicit switch from toolbar or keyboard. Returns true if it changed.
    pub fn set(&mut self, mode: AnnotationMode) -> bool {
        if self.mode == mode {
            return false;
        }
        tracing::debug!("Annotation mode {:?} -> {:?}", self.mode, mode);
        self.mode = mode;
        true
    }

    /// Annotation type a pointer release should create, if any
    pub fn selection_kind(&self) -> Option<AnnotationType> {
        self.mode.selection_kind()
    }

    /// Called after a selection produced at least one annotation
    pub fn selection_committed(&mut self) {
        if self.policy == ModePolicy::RevertToCursor {
            self.set(AnnotationMode::Cursor);
        }
    }

    pub fn viewer_behavior(&self) -> ViewerBehavior {
        match self.mode {
            AnnotationMode::Cursor => ViewerBehavior::Pan,
            AnnotationMode::Highlight | AnnotationMode::Underline => ViewerBehavior::TextSelect,
        }
    }

    /// Whether annotation hit-targets intercept pointer events
    pub fn hit_targets_active(&self) -> bool {
        self.mode == AnnotationMode::Cursor
    }
}

/// A user intent routed through the session dispatcher
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetMode(AnnotationMode),
    Undo,
    ClosePopup,
    CommitPopup,
    DeleteFromPopup,
}

/// Keys the viewer reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Escape,
}

/// A key press with its modifiers and focus context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Key,
    pub ctrl: bool,
    /// Command key on macOS
    pub meta: bool,
    pub shift: bool,
    /// Focus is inside a text field
    pub in_text_input: bool,
}

impl KeyInput {
    pub fn plain(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            meta: false,
            shift: false,
            in_text_input: false,
        }
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn in_text_input(mut self) -> Self {
        self.in_text_input = true;
        self
    }

    /// Translate the key press into a command.
    ///
    /// Mode and undo shortcuts are suppressed while typing in a text field;
    /// Escape still closes the popup from its note field.
    pub fn command(&self) -> Option<Command> {
        if self.key == Key::Escape {
            return Some(Command::ClosePopup);
        }
        if self.in_text_input {
            return None;
        }

        let modified = self.ctrl || self.meta;
        match self.key {
            Key::Escape => Some(Command::ClosePopup),
            Key::Char(c) if modified => match c.to_ascii_lowercase() {
                'z' if !self.shift => Some(Command::Undo),
                _ => None,
            },
            Key::Char(c) => match c.to_ascii_lowercase() {
                'h' => Some(Command::SetMode(AnnotationMode::Highlight)),
                'u' => Some(Command::SetMode(AnnotationMode::Underline)),
                'v' => Some(Command::SetMode(AnnotationMode::Cursor)),
                _ => None,
            },
        }
    }
}

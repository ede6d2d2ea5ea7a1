use crate::geometry::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Sprint,
    Interact,
    TogglePlayerLight,
    Escape,
}

impl InputAction {
    pub const ALL: [InputAction; 8] = [
        InputAction::MoveUp,
        InputAction::MoveDown,
        InputAction::MoveLeft,
        InputAction::MoveRight,
        InputAction::Sprint,
        InputAction::Interact,
        InputAction::TogglePlayerLight,
        InputAction::Escape,
    ];

    const fn bit(self) -> u8 {
        1 << match self {
            InputAction::MoveUp => 0,
            InputAction::MoveDown => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::Sprint => 4,
            InputAction::Interact => 5,
            InputAction::TogglePlayerLight => 6,
            InputAction::Escape => 7,
        }
    }
}

/// One bit per [`InputAction`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionStates {
    bits: u8,
}

impl ActionStates {
    pub fn set(&mut self, action: InputAction, is_down: bool) {
        if is_down {
            self.bits |= action.bit();
        } else {
            self.bits &= !action.bit();
        }
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.bits & action.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Pressed,
    Released,
}

/// Input for one simulation tick: held actions, actions whose press edge
/// happened since the previous tick, and the cursor in world space.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    held: ActionStates,
    pressed: ActionStates,
    cursor_world: Option<Vec2>,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.held.is_down(action)
    }

    pub fn was_pressed(&self, action: InputAction) -> bool {
        self.pressed.is_down(action)
    }

    pub fn interact_pressed(&self) -> bool {
        self.was_pressed(InputAction::Interact)
    }

    pub fn cursor_world(&self) -> Option<Vec2> {
        self.cursor_world
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.held.set(action, is_down);
        self
    }

    /// Marks a press edge; the action also counts as held for this tick.
    pub fn with_action_pressed(mut self, action: InputAction) -> Self {
        self.pressed.set(action, true);
        self.held.set(action, true);
        self
    }

    pub fn with_cursor_world(mut self, cursor_world: Option<Vec2>) -> Self {
        self.cursor_world = cursor_world;
        self
    }
}

/// Folds press/release events into per-tick snapshots. Press edges are
/// reported once; holding a key does not repeat them.
#[derive(Debug, Default)]
pub struct InputCollector {
    held: ActionStates,
    pressed_edges: ActionStates,
    cursor_world: Option<Vec2>,
}

impl InputCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_action(&mut self, action: InputAction, state: KeyState) {
        match state {
            KeyState::Pressed => {
                if !self.held.is_down(action) {
                    self.pressed_edges.set(action, true);
                }
                self.held.set(action, true);
            }
            KeyState::Released => self.held.set(action, false),
        }
    }

    pub fn set_cursor_world(&mut self, cursor_world: Vec2) {
        self.cursor_world = Some(cursor_world);
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.held.is_down(action)
    }

    pub fn snapshot_for_tick(&mut self) -> InputSnapshot {
        let snapshot = InputSnapshot {
            held: self.held,
            pressed: self.pressed_edges,
            cursor_world: self.cursor_world,
        };
        self.pressed_edges = ActionStates::default();
        snapshot
    }
}

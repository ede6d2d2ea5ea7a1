use engine::{
    Aabb, BlockerKind, GameSinks, HandlerKind, InteractableDef, InteractableType, LightDef,
    ObstructionSet,
};
use tracing::info;

use super::lighting::LightLayer;

pub(crate) const POWER_RESTORED_HINT: &str =
    "The power is back on, maybe the gates have been opened.";

/// Level-scoped power flag. Every switch in the level is a view onto it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct PowerState {
    pub on: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Interactable {
    pub object_id: u32,
    pub bounds: Aabb,
    pub kind: InteractableType,
    pub handler: HandlerKind,
}

impl Interactable {
    pub fn from_def(def: &InteractableDef) -> Self {
        Self {
            object_id: def.object_id,
            bounds: def.bounds,
            kind: def.kind,
            handler: def.handler.clone(),
        }
    }

    /// Lever pose for switches: `Some(true)` when pulled down.
    pub fn lever_down(&self, power: PowerState) -> Option<bool> {
        (self.kind == InteractableType::Switch).then_some(power.on)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InteractionOutcome {
    SwitchToggled {
        object_id: u32,
        power_on: bool,
        doors_opened: usize,
        lights_added: usize,
    },
    TextShown {
        object_id: u32,
    },
}

pub(crate) struct InteractionContext<'a> {
    pub player_body: Aabb,
    pub obstructions: &'a mut ObstructionSet,
    pub lights: &'a mut LightLayer,
    pub light_defs: &'a [LightDef],
    pub starts_lights_off: bool,
    pub power: &'a mut PowerState,
    pub sinks: &'a mut dyn GameSinks,
}

/// Fires the handler of every interactable the player overlaps, in level
/// order.
pub(crate) fn handle_interact(
    interactables: &[Interactable],
    ctx: &mut InteractionContext<'_>,
) -> Vec<InteractionOutcome> {
    let player_body = ctx.player_body;
    interactables
        .iter()
        .filter(|interactable| interactable.bounds.overlaps(&player_body))
        .map(|interactable| match &interactable.handler {
            HandlerKind::ToggleSwitch => toggle_switch(interactable.object_id, ctx),
            HandlerKind::DrawText { text } => {
                ctx.sinks.set_hint_text(text);
                InteractionOutcome::TextShown {
                    object_id: interactable.object_id,
                }
            }
        })
        .collect()
}

/// Flips the power. Turning it on opens every door and, on levels that start
/// dark, brings up the static lights. Turning it off again only changes the
/// switches; doors and lights stay as they are.
fn toggle_switch(object_id: u32, ctx: &mut InteractionContext<'_>) -> InteractionOutcome {
    ctx.power.on = !ctx.power.on;

    let mut doors_opened = 0;
    let mut lights_added = 0;
    if ctx.power.on {
        if ctx.starts_lights_off {
            lights_added = ctx.lights.materialize(ctx.light_defs, ctx.sinks);
            if lights_added > 0 {
                ctx.lights.raise_player_light(ctx.sinks);
            }
        }
        let doors = ctx
            .obstructions
            .ids_of_kind(BlockerKind::Door)
            .collect::<Vec<_>>();
        for door in doors {
            if ctx.obstructions.set_active(door, false) {
                doors_opened += 1;
            }
        }
    }
    if ctx.starts_lights_off {
        ctx.sinks.set_hint_text(POWER_RESTORED_HINT);
    }

    info!(
        object_id,
        power_on = ctx.power.on,
        doors_opened,
        lights_added,
        "switch_toggled"
    );
    InteractionOutcome::SwitchToggled {
        object_id,
        power_on: ctx.power.on,
        doors_opened,
        lights_added,
    }
}

#[cfg(test)]
mod tests {
    use engine::{RecordingSinks, Rgba, Vec2};

    use super::super::lighting::PLAYER_LIGHT;
    use super::*;

    fn rect(x: f32, y: f32, size: f32) -> Aabb {
        Aabb::from_center_size(Vec2::new(x, y), Vec2::new(size, size))
    }

    fn switch_at(object_id: u32, x: f32) -> Interactable {
        Interactable {
            object_id,
            bounds: rect(x, 0.0, 16.0),
            kind: InteractableType::Switch,
            handler: HandlerKind::ToggleSwitch,
        }
    }

    struct Fixture {
        obstructions: ObstructionSet,
        lights: LightLayer,
        light_defs: Vec<LightDef>,
        power: PowerState,
        sinks: RecordingSinks,
    }

    impl Fixture {
        fn new() -> Self {
            let mut obstructions = ObstructionSet::new();
            obstructions.add_wall(rect(0.0, 100.0, 20.0));
            obstructions.add_door(rect(50.0, 0.0, 20.0));
            obstructions.add_door(rect(-50.0, 0.0, 20.0));
            Self {
                obstructions,
                lights: LightLayer::new(Vec2::ZERO, 300.0),
                light_defs: vec![LightDef {
                    object_id: 7,
                    position: Vec2::new(0.0, 40.0),
                    radius: 120.0,
                    color: Rgba::opaque(255, 240, 200),
                }],
                power: PowerState::default(),
                sinks: RecordingSinks::new(),
            }
        }

        fn interact(
            &mut self,
            interactables: &[Interactable],
            player_at: Vec2,
            starts_lights_off: bool,
        ) -> Vec<InteractionOutcome> {
            let mut ctx = InteractionContext {
                player_body: Aabb::from_center_size(player_at, Vec2::new(20.0, 20.0)),
                obstructions: &mut self.obstructions,
                lights: &mut self.lights,
                light_defs: &self.light_defs,
                starts_lights_off,
                power: &mut self.power,
                sinks: &mut self.sinks,
            };
            handle_interact(interactables, &mut ctx)
        }
    }

    #[test]
    fn nothing_happens_out_of_reach() {
        let mut fixture = Fixture::new();
        let outcomes = fixture.interact(&[switch_at(1, 200.0)], Vec2::ZERO, true);

        assert!(outcomes.is_empty());
        assert!(!fixture.power.on);
        assert_eq!(fixture.obstructions.active_count(), 3);
    }

    #[test]
    fn toggle_opens_every_door_and_lights_dark_level() {
        let mut fixture = Fixture::new();
        fixture.lights.set_player_light(true, &mut fixture.sinks);

        let outcomes = fixture.interact(&[switch_at(1, 0.0)], Vec2::ZERO, true);

        assert_eq!(
            outcomes,
            vec![InteractionOutcome::SwitchToggled {
                object_id: 1,
                power_on: true,
                doors_opened: 2,
                lights_added: 1,
            }]
        );
        assert_eq!(fixture.obstructions.active_count(), 1);
        assert_eq!(fixture.sinks.hint_text(), Some(POWER_RESTORED_HINT));
        assert_eq!(fixture.sinks.top_light(), Some(PLAYER_LIGHT));
    }

    #[test]
    fn toggling_twice_never_duplicates_lights_or_recloses_doors() {
        let mut fixture = Fixture::new();
        let switches = [switch_at(1, 0.0)];
        fixture.interact(&switches, Vec2::ZERO, true);
        fixture.interact(&switches, Vec2::ZERO, true);
        fixture.interact(&switches, Vec2::ZERO, true);

        assert!(fixture.power.on);
        assert_eq!(fixture.lights.static_count(), 1);
        assert_eq!(fixture.sinks.light_count(), 1);
        assert_eq!(fixture.obstructions.active_count(), 1);
    }

    #[test]
    fn switches_share_one_power_state() {
        let mut fixture = Fixture::new();
        let near = switch_at(1, 0.0);
        let far = switch_at(2, 500.0);
        fixture.interact(&[near.clone(), far.clone()], Vec2::ZERO, false);

        assert_eq!(near.lever_down(fixture.power), Some(true));
        assert_eq!(far.lever_down(fixture.power), Some(true));
        assert_eq!(fixture.lights.static_count(), 0);
        assert_eq!(fixture.sinks.hint_text(), None);
    }

    #[test]
    fn sign_shows_its_text() {
        let mut fixture = Fixture::new();
        let sign = Interactable {
            object_id: 5,
            bounds: rect(0.0, 0.0, 16.0),
            kind: InteractableType::Sign,
            handler: HandlerKind::DrawText {
                text: "Keep moving.".to_string(),
            },
        };

        let outcomes = fixture.interact(&[sign.clone()], Vec2::ZERO, false);

        assert_eq!(outcomes, vec![InteractionOutcome::TextShown { object_id: 5 }]);
        assert_eq!(fixture.sinks.hint_text(), Some("Keep moving."));
        assert_eq!(sign.lever_down(fixture.power), None);
    }
}

use std::collections::BTreeMap;

use crate::content::Rgba;
use crate::geometry::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SoundId(pub &'static str);

impl SoundId {
    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKey {
    Menu,
    Game,
    Lose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LightId(pub u32);

impl LightId {
    /// Id kept for a light owned by the game itself. Level object ids never
    /// take this value.
    pub const RESERVED: Self = Self(u32::MAX);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightDesc {
    pub position: Vec2,
    pub radius: f32,
    pub color: Rgba,
}

/// Side effects the simulation pushes outward. Implementations own playback,
/// presentation and the light layer; the simulation never reads them back.
pub trait GameSinks {
    fn play_sound(&mut self, sound: SoundId, volume: f32, looping: bool);
    fn stop_sound(&mut self, sound: SoundId);
    fn show_view(&mut self, view: ViewKey);
    fn set_hint_text(&mut self, text: &str);
    /// Adds `light` on top of the layer. Re-adding an existing id moves it to
    /// the top and replaces its descriptor.
    fn add_light(&mut self, id: LightId, light: LightDesc);
    fn remove_light(&mut self, id: LightId);
    fn move_light(&mut self, id: LightId, position: Vec2);
}

#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    PlaySound {
        sound: SoundId,
        volume: f32,
        looping: bool,
    },
    StopSound {
        sound: SoundId,
    },
    ShowView(ViewKey),
    HintText(String),
    AddLight {
        id: LightId,
        light: LightDesc,
    },
    RemoveLight(LightId),
}

/// In-memory sink. Keeps the event log plus the state the events imply.
/// Light moves update state but are not logged; they happen every tick.
#[derive(Debug, Default)]
pub struct RecordingSinks {
    events: Vec<SinkEvent>,
    playing: BTreeMap<SoundId, (f32, bool)>,
    view: Option<ViewKey>,
    hint: Option<String>,
    lights: Vec<(LightId, LightDesc)>,
}

impl RecordingSinks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[SinkEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<SinkEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_playing(&self, sound: SoundId) -> bool {
        self.playing.contains_key(&sound)
    }

    pub fn volume(&self, sound: SoundId) -> Option<f32> {
        self.playing.get(&sound).map(|(volume, _)| *volume)
    }

    pub fn playing_sounds(&self) -> impl Iterator<Item = SoundId> + '_ {
        self.playing.keys().copied()
    }

    pub fn current_view(&self) -> Option<ViewKey> {
        self.view
    }

    pub fn hint_text(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn light_count(&self) -> usize {
        self.lights.len()
    }

    pub fn light(&self, id: LightId) -> Option<&LightDesc> {
        self.lights
            .iter()
            .find(|(light_id, _)| *light_id == id)
            .map(|(_, light)| light)
    }

    pub fn top_light(&self) -> Option<LightId> {
        self.lights.last().map(|(id, _)| *id)
    }

    pub fn count_events(&self, predicate: impl Fn(&SinkEvent) -> bool) -> usize {
        self.events.iter().filter(|event| predicate(event)).count()
    }
}

impl GameSinks for RecordingSinks {
    fn play_sound(&mut self, sound: SoundId, volume: f32, looping: bool) {
        self.playing.insert(sound, (volume, looping));
        self.events.push(SinkEvent::PlaySound {
            sound,
            volume,
            looping,
        });
    }

    fn stop_sound(&mut self, sound: SoundId) {
        self.playing.remove(&sound);
        self.events.push(SinkEvent::StopSound { sound });
    }

    fn show_view(&mut self, view: ViewKey) {
        self.view = Some(view);
        self.events.push(SinkEvent::ShowView(view));
    }

    fn set_hint_text(&mut self, text: &str) {
        self.hint = Some(text.to_string());
        self.events.push(SinkEvent::HintText(text.to_string()));
    }

    fn add_light(&mut self, id: LightId, light: LightDesc) {
        self.lights.retain(|(light_id, _)| *light_id != id);
        self.lights.push((id, light));
        self.events.push(SinkEvent::AddLight { id, light });
    }

    fn remove_light(&mut self, id: LightId) {
        self.lights.retain(|(light_id, _)| *light_id != id);
        self.events.push(SinkEvent::RemoveLight(id));
    }

    fn move_light(&mut self, id: LightId, position: Vec2) {
        if let Some((_, light)) = self.lights.iter_mut().find(|(light_id, _)| *light_id == id) {
            light.position = position;
        }
    }
}

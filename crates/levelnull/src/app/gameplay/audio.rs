use engine::{GameSinks, SoundId};
use tracing::debug;

pub(crate) const MUSIC_LOBBY: SoundId = SoundId("music.lobby");
pub(crate) const MUSIC_SCARY: SoundId = SoundId("music.scary");
pub(crate) const MUSIC_FIN: SoundId = SoundId("music.fin");
pub(crate) const AMBIENCE_HUM: SoundId = SoundId("ambience.light_hum");
pub(crate) const AMBIENCE_WAVES: SoundId = SoundId("ambience.waves");
pub(crate) const FOOTSTEPS: SoundId = SoundId("sfx.footsteps");

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Track {
    pub sound: SoundId,
    pub volume: f32,
}

impl Track {
    pub const fn new(sound: SoundId, volume: f32) -> Self {
        Self { sound, volume }
    }
}

/// What should be looping while a level runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LevelAudio {
    pub music: Option<Track>,
    pub ambience: Option<Track>,
}

/// Owns the music and ambience slots. A slot is only restarted when the
/// requested track differs from the one already playing.
#[derive(Debug, Default)]
pub(crate) struct AudioDirector {
    music: Option<Track>,
    ambience: Option<Track>,
}

impl AudioDirector {
    pub fn music(&self) -> Option<Track> {
        self.music
    }

    pub fn ambience(&self) -> Option<Track> {
        self.ambience
    }

    pub fn apply(&mut self, cue: LevelAudio, sinks: &mut dyn GameSinks) {
        Self::switch_slot(&mut self.music, cue.music, "music", sinks);
        Self::switch_slot(&mut self.ambience, cue.ambience, "ambience", sinks);
    }

    pub fn stop_all(&mut self, sinks: &mut dyn GameSinks) {
        Self::switch_slot(&mut self.music, None, "music", sinks);
        Self::switch_slot(&mut self.ambience, None, "ambience", sinks);
    }

    fn switch_slot(
        slot: &mut Option<Track>,
        next: Option<Track>,
        slot_name: &'static str,
        sinks: &mut dyn GameSinks,
    ) {
        if *slot == next {
            return;
        }
        if let Some(current) = slot.take() {
            sinks.stop_sound(current.sound);
        }
        if let Some(track) = next {
            sinks.play_sound(track.sound, track.volume, true);
            debug!(slot = slot_name, sound = track.sound.as_str(), volume = track.volume, "audio_track_started");
        }
        *slot = next;
    }
}

use engine::Aabb;

use super::enemy::Enemy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TransitionTrigger {
    Caught { enemy_index: usize },
    ReachedExit,
}

/// Checked after every body has moved. Contact with an enemy wins over the
/// exit when both happen on the same tick.
pub(crate) fn evaluate(player_body: Aabb, enemies: &[Enemy], exit: Aabb) -> Option<TransitionTrigger> {
    if let Some(enemy_index) = enemies
        .iter()
        .position(|enemy| enemy.body().overlaps(&player_body))
    {
        return Some(TransitionTrigger::Caught { enemy_index });
    }
    exit.overlaps(&player_body)
        .then_some(TransitionTrigger::ReachedExit)
}

/// Level to load after leaving `current`; `None` once the playthrough is over.
pub(crate) fn next_level(current: u32, level_count: u32) -> Option<u32> {
    let next = current.checked_add(1)?;
    (next <= level_count).then_some(next)
}

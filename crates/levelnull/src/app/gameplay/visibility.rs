use engine::{LineOfSight, Vec2};

/// Perception rule shared by every enemy: unobstructed sight within a fixed
/// radius, evaluated against the live obstruction set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct VisibilityOracle {
    max_distance: f32,
}

impl VisibilityOracle {
    pub fn new(max_distance: f32) -> Self {
        Self { max_distance }
    }

    pub fn can_see<W: LineOfSight + ?Sized>(&self, observer: Vec2, target: Vec2, world: &W) -> bool {
        can_see(observer, target, world, self.max_distance)
    }
}

pub(crate) fn can_see<W: LineOfSight + ?Sized>(
    observer: Vec2,
    target: Vec2,
    world: &W,
    max_distance: f32,
) -> bool {
    world.has_line_of_sight(observer, target, max_distance)
}

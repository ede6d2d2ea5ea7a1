use crate::geometry::{Aabb, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockerId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockerKind {
    Wall,
    Door,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Blocker {
    id: BlockerId,
    kind: BlockerKind,
    bounds: Aabb,
    active: bool,
}

/// Unobstructed-line query used for perception.
pub trait LineOfSight {
    /// True when `from` and `to` are at most `max_distance` apart and no active
    /// blocker intersects the segment between them.
    fn has_line_of_sight(&self, from: Vec2, to: Vec2, max_distance: f32) -> bool;
}

/// Overlap and swept-move queries used for movement.
pub trait CollisionWorld {
    fn overlaps_any(&self, body: Aabb) -> bool;

    /// Moves `body` by `delta`, stopping flush against active blockers, and
    /// returns the resolved center. X is resolved before Y.
    fn sweep(&self, body: Aabb, delta: Vec2) -> Vec2;
}

/// Walls and doors of one level. A door is open exactly when its blocker is
/// inactive, and this set is the only place that state lives; both movement
/// and sight queries read it.
#[derive(Debug, Clone, Default)]
pub struct ObstructionSet {
    blockers: Vec<Blocker>,
}

impl ObstructionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_wall(&mut self, bounds: Aabb) -> BlockerId {
        self.push(BlockerKind::Wall, bounds)
    }

    pub fn add_door(&mut self, bounds: Aabb) -> BlockerId {
        self.push(BlockerKind::Door, bounds)
    }

    fn push(&mut self, kind: BlockerKind, bounds: Aabb) -> BlockerId {
        let id = BlockerId(self.blockers.len() as u32);
        self.blockers.push(Blocker {
            id,
            kind,
            bounds,
            active: true,
        });
        id
    }

    /// Returns true if the state changed.
    pub fn set_active(&mut self, id: BlockerId, active: bool) -> bool {
        let Some(blocker) = self.blockers.get_mut(id.0 as usize) else {
            return false;
        };
        if blocker.active == active {
            return false;
        }
        blocker.active = active;
        true
    }

    pub fn kind(&self, id: BlockerId) -> Option<BlockerKind> {
        self.blockers.get(id.0 as usize).map(|blocker| blocker.kind)
    }

    pub fn ids_of_kind(&self, kind: BlockerKind) -> impl Iterator<Item = BlockerId> + '_ {
        self.blockers
            .iter()
            .filter(move |blocker| blocker.kind == kind)
            .map(|blocker| blocker.id)
    }

    pub fn len(&self) -> usize {
        self.blockers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blockers.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.blockers.iter().filter(|blocker| blocker.active).count()
    }

    fn active_bounds(&self) -> impl Iterator<Item = &Aabb> {
        self.blockers
            .iter()
            .filter(|blocker| blocker.active)
            .map(|blocker| &blocker.bounds)
    }
}

impl LineOfSight for ObstructionSet {
    fn has_line_of_sight(&self, from: Vec2, to: Vec2, max_distance: f32) -> bool {
        if from.distance(to) > max_distance {
            return false;
        }
        !self
            .active_bounds()
            .any(|bounds| bounds.intersects_segment(from, to))
    }
}

impl CollisionWorld for ObstructionSet {
    fn overlaps_any(&self, body: Aabb) -> bool {
        self.active_bounds().any(|bounds| bounds.overlaps(&body))
    }

    fn sweep(&self, body: Aabb, delta: Vec2) -> Vec2 {
        let half = body.half_extents;
        let mut center = body.center;

        if delta.x != 0.0 {
            let start = body.with_center(center);
            let mut x = center.x + delta.x;
            let swept = start.union(&body.with_center(Vec2::new(x, center.y)));
            for bounds in self.active_bounds() {
                // Blockers already overlapping the start box do not pin the body.
                if !bounds.overlaps(&swept) || bounds.overlaps(&start) {
                    continue;
                }
                if delta.x > 0.0 {
                    x = x.min(bounds.min().x - half.x);
                } else {
                    x = x.max(bounds.max().x + half.x);
                }
            }
            center.x = x;
        }

        if delta.y != 0.0 {
            let start = body.with_center(center);
            let mut y = center.y + delta.y;
            let swept = start.union(&body.with_center(Vec2::new(center.x, y)));
            for bounds in self.active_bounds() {
                if !bounds.overlaps(&swept) || bounds.overlaps(&start) {
                    continue;
                }
                if delta.y > 0.0 {
                    y = y.min(bounds.min().y - half.y);
                } else {
                    y = y.max(bounds.max().y + half.y);
                }
            }
            center.y = y;
        }

        center
    }
}

use std::ops::RangeInclusive;

use glam::{IVec3, Vec3};

use crate::{ChunkPos, ChunkStreamer};

/// What an update did to a [`ChunkWindow`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WindowUpdate {
    /// The center chunk did not change.
    Stable,
    /// The old and new windows overlapped; only the swept slabs changed.
    Shifted { requested: usize, released: usize },
    /// The windows were disjoint and every chunk was replaced.
    Replaced { requested: usize, released: usize },
}

/// A chunk window, encapsulating the set of chunks kept resident
/// around a player.
///
/// The window is a cube of side `2 * radius + 1` centered on the chunk
/// containing the player. After every call to [`ChunkWindow::update`],
/// exactly the chunks in that cube have been requested and every chunk
/// that left it has been released.
///
/// Operates on _chunks, not blocks_.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChunkWindow {
    center: ChunkPos,
    radius: i32,
}

impl ChunkWindow {
    /// Creates a window around `center` and requests all of its chunks.
    pub fn new<S>(center: ChunkPos, radius: u32, streamer: &mut S) -> Self
    where
        S: ChunkStreamer + ?Sized,
    {
        let window = Self {
            center,
            radius: radius as i32,
        };
        for chunk in window.iter() {
            streamer.request_chunk(chunk);
        }
        log::debug!(
            "Opened chunk window at {:?} with radius {}",
            center,
            radius
        );
        window
    }

    pub fn center(self) -> ChunkPos {
        self.center
    }

    pub fn radius(self) -> u32 {
        self.radius as u32
    }

    /// Number of chunks in the window.
    pub fn volume(self) -> usize {
        let side = (2 * self.radius + 1) as usize;
        side * side * side
    }

    /// Re-centers the window on the chunk containing `position`.
    pub fn update_for_position<S>(&mut self, position: Vec3, streamer: &mut S) -> WindowUpdate
    where
        S: ChunkStreamer + ?Sized,
    {
        self.update(ChunkPos::from_pos(position), streamer)
    }

    /// Re-centers the window on `new_center`, issuing the requests and
    /// releases needed to keep the resident set equal to the window.
    pub fn update<S>(&mut self, new_center: ChunkPos, streamer: &mut S) -> WindowUpdate
    where
        S: ChunkStreamer + ?Sized,
    {
        if new_center == self.center {
            return WindowUpdate::Stable;
        }

        let old = *self;
        let new = Self {
            center: new_center,
            radius: self.radius,
        };
        let delta = old.center.abs_delta(new_center);

        let update = if delta.max_element() > 2 * self.radius {
            let released = old.iter().inspect(|&c| streamer.release_chunk(c)).count();
            let requested = new.iter().inspect(|&c| streamer.request_chunk(c)).count();
            log::debug!(
                "Chunk window jumped {:?} -> {:?}: {} released, {} requested",
                old.center,
                new.center,
                released,
                requested
            );
            WindowUpdate::Replaced {
                requested,
                released,
            }
        } else {
            let released = sweep(old, new, |c| streamer.release_chunk(c));
            let requested = sweep(new, old, |c| streamer.request_chunk(c));
            log::debug!(
                "Chunk window shifted {:?} -> {:?}: {} released, {} requested",
                old.center,
                new.center,
                released,
                requested
            );
            WindowUpdate::Shifted {
                requested,
                released,
            }
        };

        *self = new;
        update
    }

    /// Releases every chunk in the window, consuming it.
    pub fn close<S>(self, streamer: &mut S) -> usize
    where
        S: ChunkStreamer + ?Sized,
    {
        let released = self.iter().inspect(|&c| streamer.release_chunk(c)).count();
        log::debug!("Closed chunk window at {:?}", self.center);
        released
    }

    /// Iterates over chunks in the window.
    pub fn iter(self) -> impl Iterator<Item = ChunkPos> {
        iter_3d(self.range(0), self.range(1), self.range(2))
    }

    /// Determines whether the given chunk is in the window.
    pub fn contains(&self, pos: ChunkPos) -> bool {
        let pos = IVec3::from(pos);
        (0..3).all(|axis| self.range(axis).contains(&pos[axis]))
    }

    fn range(self, axis: usize) -> RangeInclusive<i32> {
        let center = IVec3::from(self.center)[axis];
        (center - self.radius)..=(center + self.radius)
    }
}

/// Visits every chunk of `from` that is not in `to`, exactly once.
///
/// The difference is cut into one slab per axis, in order x, y, z. The slab
/// for an axis spans the full extent of `from` on the axes after it, and only
/// the part shared with `to` on the axes before it, so no chunk lies in two
/// slabs. An axis on which the windows are aligned yields an empty slab.
fn sweep(from: ChunkWindow, to: ChunkWindow, mut visit: impl FnMut(ChunkPos)) -> usize {
    let mut count = 0;
    for axis in 0..3 {
        let mut ranges = [from.range(0), from.range(1), from.range(2)];
        for earlier in 0..axis {
            ranges[earlier] = intersect(from.range(earlier), to.range(earlier));
        }

        let (from_axis, to_axis) = (from.range(axis), to.range(axis));
        // Part of `from` on this axis lying outside `to`.
        ranges[axis] = if to_axis.start() > from_axis.start() {
            *from_axis.start()..=(*to_axis.start() - 1).min(*from_axis.end())
        } else {
            (*to_axis.end() + 1).max(*from_axis.start())..=*from_axis.end()
        };

        let [x, y, z] = ranges;
        for chunk in iter_3d(x, y, z) {
            visit(chunk);
            count += 1;
        }
    }
    count
}

fn intersect(a: RangeInclusive<i32>, b: RangeInclusive<i32>) -> RangeInclusive<i32> {
    *a.start().max(b.start())..=*a.end().min(b.end())
}

fn iter_3d(
    x: RangeInclusive<i32>,
    y: RangeInclusive<i32>,
    z: RangeInclusive<i32>,
) -> impl Iterator<Item = ChunkPos> {
    x.flat_map(move |x| y.clone().map(move |y| (x, y)))
        .flat_map(move |(x, y)| z.clone().map(move |z| ChunkPos::new(x, y, z)))
}

use std::collections::{HashSet, VecDeque};

use thiserror::Error;
use tracing::debug;

use crate::color::HitboxColor;

/// Index of black, which is never handed out.
const RESERVED_INDEX: u32 = 0x00FF_FFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ColorHeapError {
    #[error("ran out of unique hitbox colors ({issued} issued)")]
    Exhausted { issued: u32 },
}

/// Hands out unique opaque identity colors, walking the RGB cube from white
/// toward black as a mixed-radix counter (red is the lowest digit).
#[derive(Debug, Default)]
pub struct ColorHeap {
    next_index: u32,
    freed: VecDeque<HitboxColor>,
    live: HashSet<HitboxColor>,
}

impl ColorHeap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_next(&mut self) -> Result<HitboxColor, ColorHeapError> {
        if let Some(color) = self.freed.pop_front() {
            self.live.insert(color);
            return Ok(color);
        }
        if self.next_index >= RESERVED_INDEX {
            return Err(ColorHeapError::Exhausted {
                issued: self.next_index,
            });
        }
        let color = color_for_index(self.next_index);
        self.next_index += 1;
        self.live.insert(color);
        Ok(color)
    }

    /// Queues `color` for reuse. Only colors issued by this heap and still live are accepted.
    pub fn release(&mut self, color: HitboxColor) -> bool {
        if !self.live.remove(&color) {
            debug!(color = %color, "color_release_rejected");
            return false;
        }
        self.freed.push_back(color);
        true
    }

    pub fn is_live(&self, color: HitboxColor) -> bool {
        self.live.contains(&color)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn pending_reuse(&self) -> usize {
        self.freed.len()
    }

    #[cfg(test)]
    fn starting_at(next_index: u32) -> Self {
        Self {
            next_index,
            ..Self::default()
        }
    }
}

fn color_for_index(index: u32) -> HitboxColor {
    let r = 255 - (index & 0xFF) as u8;
    let g = 255 - ((index >> 8) & 0xFF) as u8;
    let b = 255 - ((index >> 16) & 0xFF) as u8;
    HitboxColor::rgb(r, g, b)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn allocation_starts_at_white_and_decrements_red_first() {
        let mut heap = ColorHeap::new();
        assert_eq!(heap.get_next(), Ok(HitboxColor::rgb(255, 255, 255)));
        assert_eq!(heap.get_next(), Ok(HitboxColor::rgb(254, 255, 255)));
        assert_eq!(heap.get_next(), Ok(HitboxColor::rgb(253, 255, 255)));
    }

    #[test]
    fn red_underflow_wraps_and_decrements_green() {
        let mut heap = ColorHeap::new();
        let colors: Vec<_> = (0..258).map(|_| heap.get_next().expect("color")).collect();
        assert_eq!(colors[255], HitboxColor::rgb(0, 255, 255));
        assert_eq!(colors[256], HitboxColor::rgb(255, 254, 255));
        assert_eq!(colors[257], HitboxColor::rgb(254, 254, 255));
    }

    #[test]
    fn green_underflow_wraps_and_decrements_blue() {
        let mut heap = ColorHeap::starting_at(0xFFFF);
        assert_eq!(heap.get_next(), Ok(HitboxColor::rgb(0, 0, 255)));
        assert_eq!(heap.get_next(), Ok(HitboxColor::rgb(255, 255, 254)));
    }

    #[test]
    fn sequential_colors_are_pairwise_distinct() {
        let mut heap = ColorHeap::new();
        let mut seen = HashSet::new();
        for _ in 0..70_000 {
            assert!(seen.insert(heap.get_next().expect("color")));
        }
        assert_eq!(heap.live_count(), 70_000);
    }

    #[test]
    fn exhaustion_is_reported_instead_of_issuing_black() {
        let mut heap = ColorHeap::starting_at(RESERVED_INDEX - 2);
        assert_eq!(heap.get_next(), Ok(HitboxColor::rgb(2, 0, 0)));
        assert_eq!(heap.get_next(), Ok(HitboxColor::rgb(1, 0, 0)));
        assert!(matches!(
            heap.get_next(),
            Err(ColorHeapError::Exhausted { .. })
        ));
        assert!(heap.get_next().is_err());
    }

    #[test]
    fn released_colors_are_dispensed_before_fresh_ones() {
        let mut heap = ColorHeap::new();
        let first = heap.get_next().expect("first");
        let second = heap.get_next().expect("second");
        assert!(heap.release(second));
        assert!(heap.release(first));
        assert_eq!(heap.pending_reuse(), 2);

        assert_eq!(heap.get_next(), Ok(second));
        assert_eq!(heap.get_next(), Ok(first));
        assert_eq!(heap.get_next(), Ok(HitboxColor::rgb(253, 255, 255)));
    }

    #[test]
    fn release_rejects_foreign_and_double_release() {
        let mut heap = ColorHeap::new();
        let issued = heap.get_next().expect("issued");
        assert!(!heap.release(HitboxColor::rgb(10, 20, 30)));
        assert!(heap.release(issued));
        assert!(!heap.release(issued));
        assert_eq!(heap.pending_reuse(), 1);
        assert!(!heap.is_live(issued));
    }

    #[test]
    fn exhausted_heap_still_serves_released_colors() {
        let mut heap = ColorHeap::starting_at(RESERVED_INDEX - 1);
        let last = heap.get_next().expect("last fresh color");
        assert!(heap.get_next().is_err());
        assert!(heap.release(last));
        assert_eq!(heap.get_next(), Ok(last));
    }
}

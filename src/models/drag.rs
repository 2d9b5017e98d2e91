// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Label drag interaction.
//!
//! A single owner of the pointer: at most one label is being dragged at
//! any time. Each move reports the delta from the previous pointer
//! sample, not from where the drag started.

use super::scene::LayerId;
use crate::util::geometry::{pixel_delta_to_percent, Point, Size};

/// Current drag state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging { layer: LayerId, last: Point },
}

/// Anchor change produced by one pointer move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragStep {
    pub layer: LayerId,
    pub d_left: f32,
    pub d_bottom: f32,
}

#[derive(Debug, Default)]
pub struct DragMachine {
    state: DragState,
}

impl DragMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_layer(&self) -> Option<LayerId> {
        match self.state {
            DragState::Dragging { layer, .. } => Some(layer),
            DragState::Idle => None,
        }
    }

    /// Start dragging `layer`. Replaces any drag already in progress.
    pub fn begin(&mut self, layer: LayerId, pointer: Point) {
        if let DragState::Dragging { layer: previous, .. } = self.state {
            if previous != layer {
                log::warn!("Drag on {:?} cancelled by drag on {:?}", previous, layer);
            }
        }
        self.state = DragState::Dragging { layer, last: pointer };
    }

    /// Feed a pointer sample. Returns the anchor change, if dragging.
    pub fn move_to(&mut self, pointer: Point, container: Size) -> Option<DragStep> {
        let DragState::Dragging { layer, last } = self.state else {
            return None;
        };
        if container.is_empty() {
            return None;
        }

        let (d_left, d_bottom) =
            pixel_delta_to_percent(pointer.x - last.x, pointer.y - last.y, container);
        self.state = DragState::Dragging { layer, last: pointer };

        Some(DragStep { layer, d_left, d_bottom })
    }

    /// Release the pointer.
    pub fn end(&mut self) -> Option<LayerId> {
        let layer = self.active_layer();
        self.state = DragState::Idle;
        layer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_move_is_ignored() {
        let mut drag = DragMachine::new();
        assert!(drag.move_to(Point::new(10.0, 10.0), Size::square(500.0)).is_none());
        assert_eq!(drag.active_layer(), None);
    }

    #[test]
    fn test_delta_from_previous_sample() {
        let mut drag = DragMachine::new();
        drag.begin(LayerId::Name, Point::new(100.0, 100.0));

        let first = drag.move_to(Point::new(150.0, 100.0), Size::square(500.0)).unwrap();
        assert!((first.d_left - 10.0).abs() < 0.0001);

        // Second step measures from (150, 100), not from the origin
        let second = drag.move_to(Point::new(175.0, 125.0), Size::square(500.0)).unwrap();
        assert!((second.d_left - 5.0).abs() < 0.0001);
        assert!((second.d_bottom + 5.0).abs() < 0.0001);
    }

    #[test]
    fn test_last_begin_wins() {
        let mut drag = DragMachine::new();
        drag.begin(LayerId::Name, Point::new(0.0, 0.0));
        drag.begin(LayerId::Role, Point::new(20.0, 20.0));
        assert_eq!(drag.active_layer(), Some(LayerId::Role));

        let step = drag.move_to(Point::new(20.0, 20.0), Size::square(100.0)).unwrap();
        assert_eq!(step.layer, LayerId::Role);
        assert_eq!(step.d_left, 0.0);
    }

    #[test]
    fn test_end_returns_to_idle() {
        let mut drag = DragMachine::new();
        drag.begin(LayerId::Role, Point::new(0.0, 0.0));
        assert_eq!(drag.end(), Some(LayerId::Role));
        assert_eq!(drag.end(), None);
        assert!(drag.move_to(Point::new(5.0, 5.0), Size::square(100.0)).is_none());
    }

    #[test]
    fn test_empty_container_is_ignored() {
        let mut drag = DragMachine::new();
        drag.begin(LayerId::Name, Point::new(0.0, 0.0));
        assert!(drag.move_to(Point::new(5.0, 5.0), Size::new(0.0, 100.0)).is_none());
        assert_eq!(drag.active_layer(), Some(LayerId::Name));
    }
}

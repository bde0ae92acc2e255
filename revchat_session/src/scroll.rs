use crate::session::SessionEvent;

/// Distance from the bottom, in view units, still counted as "at the bottom".
pub const DEFAULT_BOTTOM_THRESHOLD: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollMetrics {
    /// Distance from the top of the content to the top of the viewport.
    pub offset: u32,
    pub content_height: u32,
    pub viewport_height: u32,
}

impl ScrollMetrics {
    pub fn distance_from_bottom(&self) -> u32 {
        self.content_height
            .saturating_sub(self.offset)
            .saturating_sub(self.viewport_height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollCommand {
    SmoothToBottom,
}

/// Keeps the newest message in view unless the user is reading older content.
#[derive(Debug, Clone)]
pub struct ScrollController {
    threshold: u32,
    scrolled_away: bool,
}

impl Default for ScrollController {
    fn default() -> Self {
        Self::with_threshold(DEFAULT_BOTTOM_THRESHOLD)
    }
}

impl ScrollController {
    pub fn with_threshold(threshold: u32) -> Self {
        Self {
            threshold,
            scrolled_away: false,
        }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn is_scrolled_away(&self) -> bool {
        self.scrolled_away
    }

    /// Whether the manual "scroll to bottom" control should be shown.
    pub fn shows_jump_to_bottom(&self) -> bool {
        self.scrolled_away
    }

    /// Records the viewport position after any scroll, user-driven or not.
    pub fn on_scroll(&mut self, metrics: ScrollMetrics) {
        self.scrolled_away = metrics.distance_from_bottom() >= self.threshold;
    }

    pub fn on_conversation_changed(&self) -> Option<ScrollCommand> {
        (!self.scrolled_away).then_some(ScrollCommand::SmoothToBottom)
    }

    pub fn jump_to_bottom(&mut self) -> ScrollCommand {
        self.scrolled_away = false;
        ScrollCommand::SmoothToBottom
    }

    /// Reacts to a session event. A new submission always brings the
    /// transcript back to the bottom.
    pub fn observe(&mut self, event: &SessionEvent) -> Option<ScrollCommand> {
        if let SessionEvent::Submitted { .. } = event {
            return Some(self.jump_to_bottom());
        }
        if event.mutates_conversation() {
            return self.on_conversation_changed();
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn metrics(offset: u32) -> ScrollMetrics {
        ScrollMetrics {
            offset,
            content_height: 1_000,
            viewport_height: 400,
        }
    }

    #[test]
    fn follows_new_content_while_near_bottom() {
        let mut controller = ScrollController::default();
        controller.on_scroll(metrics(550));

        assert!(!controller.is_scrolled_away());
        assert_eq!(
            controller.on_conversation_changed(),
            Some(ScrollCommand::SmoothToBottom)
        );
    }

    #[test]
    fn suppresses_auto_scroll_once_user_scrolls_away() {
        let mut controller = ScrollController::default();
        controller.on_scroll(metrics(100));

        assert!(controller.is_scrolled_away());
        assert!(controller.shows_jump_to_bottom());
        assert_eq!(controller.on_conversation_changed(), None);

        let event = SessionEvent::FragmentApplied {
            message_id: Uuid::new_v4(),
            len: 3,
        };
        assert_eq!(controller.observe(&event), None);
    }

    #[test]
    fn threshold_boundary_counts_as_away() {
        let mut controller = ScrollController::with_threshold(10);
        controller.on_scroll(ScrollMetrics {
            offset: 0,
            content_height: 30,
            viewport_height: 20,
        });
        assert!(controller.is_scrolled_away());

        controller.on_scroll(ScrollMetrics {
            offset: 1,
            content_height: 30,
            viewport_height: 20,
        });
        assert!(!controller.is_scrolled_away());
    }

    #[test]
    fn jump_to_bottom_clears_flag() {
        let mut controller = ScrollController::default();
        controller.on_scroll(metrics(0));

        assert_eq!(controller.jump_to_bottom(), ScrollCommand::SmoothToBottom);
        assert!(!controller.shows_jump_to_bottom());
        assert_eq!(
            controller.on_conversation_changed(),
            Some(ScrollCommand::SmoothToBottom)
        );
    }

    #[test]
    fn submission_resets_scrolled_away() {
        let mut controller = ScrollController::default();
        controller.on_scroll(metrics(0));

        let event = SessionEvent::Submitted {
            message_id: Uuid::new_v4(),
        };
        assert_eq!(
            controller.observe(&event),
            Some(ScrollCommand::SmoothToBottom)
        );
        assert!(!controller.is_scrolled_away());
    }

    #[test]
    fn status_changes_do_not_scroll() {
        let mut controller = ScrollController::default();
        let event = SessionEvent::StatusChanged(crate::session::SessionStatus::Idle);
        assert_eq!(controller.observe(&event), None);
    }

    #[test]
    fn short_content_is_always_at_bottom() {
        let mut controller = ScrollController::default();
        controller.on_scroll(ScrollMetrics {
            offset: 0,
            content_height: 10,
            viewport_height: 400,
        });
        assert!(!controller.is_scrolled_away());
    }
}

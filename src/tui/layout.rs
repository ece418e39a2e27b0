//! Two-pane layout with a resizable sidebar.

use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::{Constraint, Layout, Rect};

pub const MIN_SIDEBAR: u16 = 12;
pub const MIN_VIEWER: u16 = 20;
const DEFAULT_SIDEBAR: u16 = 32;
const STEP: u16 = 2;

/// Sidebar width plus divider drag state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaneLayout {
    sidebar_width: u16,
    dragging: bool,
}

impl Default for PaneLayout {
    fn default() -> Self {
        Self {
            sidebar_width: DEFAULT_SIDEBAR,
            dragging: false,
        }
    }
}

impl PaneLayout {
    /// Sidebar width that fits `total` columns.
    pub fn sidebar_width(&self, total: u16) -> u16 {
        clamp_width(self.sidebar_width, total)
    }

    pub fn widen(&mut self, total: u16) {
        self.sidebar_width = clamp_width(self.sidebar_width(total).saturating_add(STEP), total);
    }

    pub fn narrow(&mut self, total: u16) {
        self.sidebar_width = clamp_width(self.sidebar_width(total).saturating_sub(STEP), total);
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Split `area` into `[sidebar, viewer]`.
    pub fn split(&self, area: Rect) -> [Rect; 2] {
        Layout::horizontal([
            Constraint::Length(self.sidebar_width(area.width)),
            Constraint::Fill(1),
        ])
        .areas(area)
    }

    /// Follow a drag on the divider between the panes. Returns whether the
    /// event was consumed.
    pub fn on_mouse(&mut self, event: MouseEvent, area: Rect) -> bool {
        let divider = area.x + self.sidebar_width(area.width);
        match event.kind {
            MouseEventKind::Down(MouseButton::Left)
                if event.column.abs_diff(divider) <= 1
                    && (area.y..area.y + area.height).contains(&event.row) =>
            {
                self.dragging = true;
                true
            }
            MouseEventKind::Drag(MouseButton::Left) if self.dragging => {
                self.sidebar_width = clamp_width(event.column.saturating_sub(area.x), area.width);
                true
            }
            MouseEventKind::Up(MouseButton::Left) if self.dragging => {
                self.dragging = false;
                true
            }
            _ => false,
        }
    }
}

/// Keep both panes usable. On very narrow terminals the sidebar keeps its
/// minimum and the viewer gets what is left.
fn clamp_width(width: u16, total: u16) -> u16 {
    let max = total.saturating_sub(MIN_VIEWER).max(MIN_SIDEBAR);
    width.clamp(MIN_SIDEBAR, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn mouse(kind: MouseEventKind, column: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row: 5,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn width_is_clamped_to_terminal() {
        let mut layout = PaneLayout::default();
        assert_eq!(layout.sidebar_width(100), 32);
        assert_eq!(layout.sidebar_width(40), 20);
        assert_eq!(layout.sidebar_width(10), MIN_SIDEBAR);

        for _ in 0..100 {
            layout.narrow(100);
        }
        assert_eq!(layout.sidebar_width(100), MIN_SIDEBAR);
        for _ in 0..100 {
            layout.widen(100);
        }
        assert_eq!(layout.sidebar_width(100), 80);
    }

    #[test]
    fn split_respects_sidebar_width() {
        let layout = PaneLayout::default();
        let [side, view] = layout.split(Rect::new(0, 0, 100, 30));
        assert_eq!(side.width, 32);
        assert_eq!(view.x, 32);
        assert_eq!(view.width, 68);
    }

    #[test]
    fn dragging_the_divider_resizes() {
        let area = Rect::new(0, 1, 100, 30);
        let mut layout = PaneLayout::default();

        assert!(!layout.on_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 60), area));
        assert!(layout.on_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 32), area));
        assert!(layout.is_dragging());
        assert!(layout.on_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 50), area));
        assert_eq!(layout.sidebar_width(100), 50);
        assert!(layout.on_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 99), area));
        assert_eq!(layout.sidebar_width(100), 80);
        assert!(layout.on_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 99), area));
        assert!(!layout.is_dragging());
    }
}

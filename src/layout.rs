//! Screen geometry. Rendering and mouse hit-testing both read from here so a
//! click always lands on the row that was drawn.

use ratatui::layout::Rect;

use crate::panel::PanelId;

const SIDEBAR_WIDTH: u16 = 25;
const SHORTCUTS_MAX_HEIGHT: u16 = 8;
const INFO_HEIGHT: u16 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AppLayout {
    pub shortcuts: Rect,
    pub drives: Rect,
    pub primary: Rect,
    pub secondary: Option<Rect>,
    pub info: Rect,
    pub preview: Rect,
    pub status: Rect,
    pub help: Rect,
}

/// Where a mouse event landed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub panel: PanelId,
    /// Visible row inside the panel border, if the pointer is on a list row
    pub row: Option<usize>,
}

impl AppLayout {
    pub fn compute(area: Rect, dual_panel: bool) -> Self {
        let body_height = area.height.saturating_sub(2);
        let status = Rect::new(area.x, area.y + body_height, area.width, area.height.min(1));
        let help = Rect::new(
            area.x,
            area.y + body_height + 1,
            area.width,
            area.height.saturating_sub(body_height + 1).min(1),
        );

        let sidebar_width = if area.width >= 80 {
            SIDEBAR_WIDTH
        } else {
            area.width / 4
        };
        let rest = area.width - sidebar_width;
        let right_width = rest / 3;
        let trees_width = rest - right_width;

        let shortcuts_height = SHORTCUTS_MAX_HEIGHT.min(body_height / 2);
        let shortcuts = Rect::new(area.x, area.y, sidebar_width, shortcuts_height);
        let drives = Rect::new(
            area.x,
            area.y + shortcuts_height,
            sidebar_width,
            body_height - shortcuts_height,
        );

        let trees_x = area.x + sidebar_width;
        let (primary, secondary) = if dual_panel {
            let half = trees_width / 2;
            (
                Rect::new(trees_x, area.y, half, body_height),
                Some(Rect::new(trees_x + half, area.y, trees_width - half, body_height)),
            )
        } else {
            (Rect::new(trees_x, area.y, trees_width, body_height), None)
        };

        let right_x = trees_x + trees_width;
        let info_height = INFO_HEIGHT.min(body_height / 2);
        let info = Rect::new(right_x, area.y, right_width, info_height);
        let preview = Rect::new(
            right_x,
            area.y + info_height,
            right_width,
            body_height - info_height,
        );

        Self {
            shortcuts,
            drives,
            primary,
            secondary,
            info,
            preview,
            status,
            help,
        }
    }

    pub fn panel_rect(&self, panel: PanelId) -> Option<Rect> {
        match panel {
            PanelId::PrimaryTree => Some(self.primary),
            PanelId::SecondaryTree => self.secondary,
            PanelId::Shortcuts => Some(self.shortcuts),
            PanelId::Drives => Some(self.drives),
        }
    }

    pub fn hit_test(&self, col: u16, row: u16) -> Option<Hit> {
        let panels = [
            PanelId::PrimaryTree,
            PanelId::SecondaryTree,
            PanelId::Shortcuts,
            PanelId::Drives,
        ];
        panels.into_iter().find_map(|panel| {
            let rect = self.panel_rect(panel)?;
            contains(rect, col, row).then(|| Hit {
                panel,
                row: inner_row(rect, row),
            })
        })
    }
}

/// Rows available for list items inside a bordered block
pub fn list_height(rect: Rect) -> usize {
    rect.height.saturating_sub(2) as usize
}

fn contains(rect: Rect, col: u16, row: u16) -> bool {
    col >= rect.x && col < rect.x + rect.width && row >= rect.y && row < rect.y + rect.height
}

fn inner_row(rect: Rect, row: u16) -> Option<usize> {
    let first = rect.y + 1;
    let last = rect.y + rect.height.saturating_sub(1);
    (row >= first && row < last).then(|| (row - first) as usize)
}

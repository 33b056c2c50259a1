use ratatui::style::Color;

pub struct Theme {
    // Panel borders
    pub panel_active_border: Color,
    pub panel_inactive_border: Color,
    pub panel_title: Color,
    pub panel_error: Color,

    // Entries
    pub directory_fg: Color,
    pub file_fg: Color,
    pub symlink_fg: Color,
    pub special_fg: Color,
    pub hidden_fg: Color,
    pub marked_fg: Color,
    pub marked_bg: Color,
    pub clipboard_cut_fg: Color,

    // Cursor
    pub cursor_active_fg: Color,
    pub cursor_active_bg: Color,
    pub cursor_inactive_fg: Color,
    pub cursor_inactive_bg: Color,

    // Sidebar
    pub shortcut_fg: Color,
    pub drive_mounted_fg: Color,
    pub drive_unmounted_fg: Color,
    pub drive_degraded: Color,

    // Info and preview
    pub info_label: Color,
    pub info_value: Color,
    pub preview_fg: Color,
    pub preview_placeholder: Color,

    // Status bar
    pub status_info_fg: Color,
    pub status_warning_fg: Color,
    pub status_error_fg: Color,
    pub status_bg: Color,
    pub status_job_fg: Color,

    // Help bar
    pub help_key_fg: Color,
    pub help_key_bg: Color,
    pub help_desc_fg: Color,
    pub help_desc_bg: Color,

    // Dialogs
    pub dialog_bg: Color,
    pub dialog_border: Color,
    pub dialog_warning_border: Color,
    pub dialog_delete_border: Color,
    pub dialog_warning_text: Color,
    pub dialog_input_fg: Color,
    pub dialog_input_bg: Color,
    pub dialog_hint: Color,
    pub dialog_shadow: Color,
    pub dialog_button_fg: Color,
    pub dialog_button_bg: Color,
}

// Tokyo Night inspired color palette
pub const THEME: Theme = Theme {
    panel_active_border: Color::Rgb(122, 162, 247),   // #7aa2f7 - soft blue
    panel_inactive_border: Color::Rgb(86, 95, 137),   // #565f89 - muted gray
    panel_title: Color::Rgb(224, 175, 104),           // #e0af68 - muted yellow
    panel_error: Color::Rgb(247, 118, 142),           // #f7768e - soft red

    directory_fg: Color::Rgb(122, 162, 247),          // #7aa2f7 - soft blue
    file_fg: Color::Rgb(169, 177, 214),               // #a9b1d6 - light gray
    symlink_fg: Color::Rgb(125, 207, 255),            // #7dcfff - cyan
    special_fg: Color::Rgb(187, 154, 247),            // #bb9af7 - purple
    hidden_fg: Color::Rgb(86, 95, 137),               // #565f89 - muted gray
    marked_fg: Color::Rgb(224, 175, 104),             // #e0af68 - muted orange
    marked_bg: Color::Rgb(41, 46, 66),                // #292e42 - dark highlight
    clipboard_cut_fg: Color::Rgb(86, 95, 137),        // #565f89 - muted gray

    cursor_active_fg: Color::Rgb(26, 27, 38),         // #1a1b26 - dark bg
    cursor_active_bg: Color::Rgb(122, 162, 247),      // #7aa2f7 - soft blue
    cursor_inactive_fg: Color::Rgb(169, 177, 214),    // #a9b1d6 - light gray
    cursor_inactive_bg: Color::Rgb(41, 46, 66),       // #292e42 - dark highlight

    shortcut_fg: Color::Rgb(169, 177, 214),           // #a9b1d6 - light gray
    drive_mounted_fg: Color::Rgb(158, 206, 106),      // #9ece6a - soft green
    drive_unmounted_fg: Color::Rgb(86, 95, 137),      // #565f89 - muted gray
    drive_degraded: Color::Rgb(224, 175, 104),        // #e0af68 - muted orange

    info_label: Color::Rgb(86, 95, 137),              // #565f89 - muted gray
    info_value: Color::Rgb(169, 177, 214),            // #a9b1d6 - light gray
    preview_fg: Color::Rgb(169, 177, 214),            // #a9b1d6 - light gray
    preview_placeholder: Color::Rgb(86, 95, 137),     // #565f89 - muted gray

    status_info_fg: Color::Rgb(158, 206, 106),        // #9ece6a - soft green
    status_warning_fg: Color::Rgb(224, 175, 104),     // #e0af68 - muted orange
    status_error_fg: Color::Rgb(247, 118, 142),       // #f7768e - soft red
    status_bg: Color::Rgb(26, 27, 38),                // #1a1b26 - dark bg
    status_job_fg: Color::Rgb(187, 154, 247),         // #bb9af7 - purple

    help_key_fg: Color::Rgb(26, 27, 38),              // #1a1b26 - dark bg
    help_key_bg: Color::Rgb(140, 160, 210),           // #8ca0d2 - soft periwinkle
    help_desc_fg: Color::Rgb(169, 177, 214),          // #a9b1d6 - light gray
    help_desc_bg: Color::Rgb(36, 40, 59),             // #24283b - slightly lighter bg

    dialog_bg: Color::Rgb(26, 27, 38),                // #1a1b26 - dark bg
    dialog_border: Color::Rgb(122, 162, 247),         // #7aa2f7 - soft blue
    dialog_warning_border: Color::Rgb(224, 175, 104), // #e0af68 - muted orange
    dialog_delete_border: Color::Rgb(247, 118, 142),  // #f7768e - soft red
    dialog_warning_text: Color::Rgb(224, 175, 104),   // #e0af68 - muted orange
    dialog_input_fg: Color::Rgb(169, 177, 214),       // #a9b1d6 - light gray
    dialog_input_bg: Color::Rgb(41, 46, 66),          // #292e42 - dark highlight
    dialog_hint: Color::Rgb(86, 95, 137),             // #565f89 - muted gray
    dialog_shadow: Color::Rgb(15, 15, 20),            // #0f0f14 - very dark
    dialog_button_fg: Color::Rgb(169, 177, 214),      // #a9b1d6 - light gray
    dialog_button_bg: Color::Rgb(56, 62, 87),         // #383e57 - button bg
};

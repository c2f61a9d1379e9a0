use serde::Serialize;

pub const DEFAULT_WINDOW_SIZE: u32 = 5;

/// The page buttons to show around the current page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageWindow {
    pub current_page: u32,
    pub total_pages: u32,
    pub pages: Vec<u32>,
    /// Show a "1" button before the window.
    pub show_first: bool,
    pub leading_ellipsis: bool,
    pub trailing_ellipsis: bool,
    /// Show a button for the last page after the window.
    pub show_last: bool,
    pub has_previous: bool,
}

/// Center a window of `window_size` pages on `current_page`, clamped to
/// `1..=total_pages`. Near the end the window slides down so it keeps
/// `min(window_size, total_pages)` pages.
pub fn page_window(current_page: u32, total_pages: u32, window_size: u32) -> PageWindow {
    let window_size = window_size.max(1);

    let mut start = current_page.saturating_sub(window_size / 2).max(1);
    let end = total_pages.min(start.saturating_add(window_size - 1));

    if end < start {
        return PageWindow {
            current_page,
            total_pages,
            pages: Vec::new(),
            show_first: false,
            leading_ellipsis: false,
            trailing_ellipsis: false,
            show_last: false,
            has_previous: current_page > 1,
        };
    }

    if end - start < window_size - 1 {
        start = end.saturating_sub(window_size - 1).max(1);
    }

    PageWindow {
        current_page,
        total_pages,
        pages: (start..=end).collect(),
        show_first: start > 1,
        leading_ellipsis: start > 2,
        trailing_ellipsis: total_pages - end > 1,
        show_last: end < total_pages,
        has_previous: current_page > 1,
    }
}

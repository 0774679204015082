//! Fixed-size pages over the sorted currency list

use fx_rates::Entry;

use crate::session::PageState;
use crate::types::QuickReply;

/// Currencies shown per page
pub const PAGE_SIZE: usize = 10;

/// Quick reply payload of the "More" button
pub const NEXT_PAYLOAD: &str = "Next";

/// Title of the "More" button
pub const NEXT_TITLE: &str = "More";

/// Entries shown on `page` (1-based). Out-of-range pages are empty.
pub fn window(entries: &[Entry], page: usize) -> &[Entry] {
    let start = page.saturating_sub(1) * PAGE_SIZE;
    if page == 0 || start >= entries.len() {
        return &[];
    }
    let end = (start + PAGE_SIZE).min(entries.len());
    &entries[start..end]
}

/// Entries the user can currently pick from
pub fn active_window(entries: &[Entry], state: PageState) -> &[Entry] {
    match state {
        PageState::NoSession => &[],
        PageState::Paginated(page) => window(entries, page),
    }
}

/// Page shown after "More": wraps to 1 once the current page reaches the
/// end of the list.
pub fn next_page(state: PageState, total: usize) -> usize {
    let current = state.page().unwrap_or(0);
    if current * PAGE_SIZE >= total {
        1
    } else {
        current + 1
    }
}

/// Look a currency code up in the active page only.
pub fn find_in_page<'a>(entries: &'a [Entry], state: PageState, code: &str) -> Option<&'a Entry> {
    active_window(entries, state)
        .iter()
        .find(|entry| entry.currency_code == code)
}

/// One button per currency of the page, then the "More" button.
pub fn page_buttons(entries: &[Entry], page: usize) -> Vec<QuickReply> {
    window(entries, page)
        .iter()
        .map(|entry| QuickReply::text(&entry.currency_name, &entry.currency_code))
        .chain(std::iter::once(QuickReply::text(NEXT_TITLE, NEXT_PAYLOAD)))
        .collect()
}

//! Bounded aggregation over a paged remote listing.

use calclaw_core::calendar::Page;
use std::future::Future;

/// Request pages until `max_total` items are collected or the provider
/// reports no further page.
///
/// Each request asks for `min(page_cap, max_total - collected)` items, so a
/// zero-sized page is never requested and `max_total == 0` makes no call at
/// all. Provider order is kept; anything beyond `max_total` is dropped.
/// Errors are returned as-is, without retry.
pub async fn fetch_all<T, E, F, Fut>(
    max_total: usize,
    page_cap: u32,
    mut fetch_page: F,
) -> Result<Vec<T>, E>
where
    F: FnMut(u32, Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
{
    let mut items = Vec::new();
    let mut cursor: Option<String> = None;
    let page_cap = page_cap.max(1) as usize;

    while items.len() < max_total {
        let page_size = page_cap.min(max_total - items.len());
        let page = fetch_page(page_size as u32, cursor.take()).await?;
        items.extend(page.items);

        match page.next_page_token {
            Some(token) if !token.is_empty() => cursor = Some(token),
            _ => break,
        }
    }

    items.truncate(max_total);
    Ok(items)
}

// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::future::Future;

use crate::{ListOptions, Page};

/// Walk a cursor-paginated listing to the end, returning every item.
///
/// `fetch` is called with the page size and the cursor of the previous page (empty for the
/// first). The walk ends when a page comes back with an empty cursor, or with fewer items
/// than requested. A page that is short but still carries a cursor, or that hands back the
/// cursor it was requested with, is logged and treated as the end of the listing.
///
/// Any error from `fetch` aborts the walk immediately; items from earlier pages are
/// discarded. Nothing is retried.
pub async fn paginate<T, E, F, Fut>(per_page: usize, mut fetch: F) -> Result<Vec<T>, E>
where
    F: FnMut(ListOptions) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
{
    let mut items = Vec::new();
    let mut cursor = String::new();
    let mut pages = 0usize;
    loop {
        let requested = cursor.clone();
        let page = fetch(ListOptions {
            per_page,
            cursor: std::mem::take(&mut cursor),
        })
        .await?;
        pages += 1;
        let received = page.items.len();
        items.extend(page.items);

        if page.next_cursor.is_empty() {
            break;
        }
        if received < per_page {
            tracing::debug!(
                received,
                per_page,
                "short page still carries a cursor, treating as end of listing"
            );
            break;
        }
        if page.next_cursor == requested {
            tracing::debug!(
                cursor = %requested,
                "cursor did not advance, treating as end of listing"
            );
            break;
        }
        cursor = page.next_cursor;
    }
    tracing::debug!(pages, items = items.len(), "listing complete");
    Ok(items)
}

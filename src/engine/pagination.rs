use tokio::task::JoinHandle;

use crate::backend::MessagePage;
use crate::engine::lifecycle::ChatEngine;

/// Backward cursor over message history. Page 1 is the newest page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    /// Last page applied to the list; 0 until the first page lands, so a
    /// failed initial load is retried as page 1.
    page: u32,
    page_size: u32,
    exhausted: bool,
}

impl PageCursor {
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 0,
            page_size: page_size.max(1),
            exhausted: false,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn has_more(&self) -> bool {
        !self.exhausted
    }

    /// Next older page, if history is known to continue.
    pub fn next_page(&self) -> Option<u32> {
        self.has_more().then_some(self.page + 1)
    }

    /// Records a successful fetch. The cursor never moves back toward newer pages.
    pub fn advance(&mut self, page: u32, has_more: bool) {
        if page < self.page {
            return;
        }
        self.page = page;
        self.exhausted = !has_more;
    }
}

impl ChatEngine {
    /// Fetches the next older page and puts it above the current list.
    ///
    /// No-op (returns `None`) when nothing is open, a page fetch is already in
    /// flight, or history is exhausted.
    pub fn load_more(&self) -> Option<JoinHandle<()>> {
        let (generation, conversation_id, page) = {
            let mut state = self.shared.lock();
            let generation = state.generation;
            let conv = state.current.as_mut()?;
            if conv.loading || conv.loading_more {
                tracing::debug!(conversation_id = %conv.conversation_id, "Page fetch already in flight");
                return None;
            }
            let page = conv.cursor.next_page()?;
            conv.loading_more = true;
            (generation, conv.conversation_id.clone(), page)
        };
        self.shared.notify();

        let engine = self.clone();
        Some(tokio::spawn(async move {
            let applied = engine
                .load_page(generation, &conversation_id, page, true)
                .await;
            // Retry of a failed initial load.
            if applied && page == 1 {
                engine.mark_read(generation, &conversation_id).await;
            }
        }))
    }

    /// Fetches page `page` and merges it in front of the list.
    ///
    /// `append` marks a history fetch (`loading_more`) as opposed to the
    /// initial load (`loading`). The cursor only advances on success, so a
    /// failed fetch is retried by requesting the same page. Returns whether
    /// the page was applied.
    pub(crate) async fn load_page(
        &self,
        generation: u64,
        conversation_id: &str,
        page: u32,
        append: bool,
    ) -> bool {
        let result = self
            .backend
            .fetch_message_page(conversation_id, page, self.page_size)
            .await;

        self.shared
            .with_current(generation, |conv| {
                if append {
                    conv.loading_more = false;
                } else {
                    conv.loading = false;
                }

                match result {
                    Ok(MessagePage { items, has_more }) => {
                        let received = items.len();
                        let added = conv.messages.prepend_page(items);
                        conv.cursor.advance(page, has_more);
                        conv.last_error = None;
                        tracing::debug!(
                            conversation_id,
                            page,
                            received,
                            added,
                            has_more,
                            "Applied message page"
                        );
                        true
                    }
                    Err(e) => {
                        tracing::error!(conversation_id, page, "Failed to load messages: {}", e);
                        conv.last_error = Some(format!("Failed to load messages: {}", e));
                        false
                    }
                }
            })
            .unwrap_or(false)
    }
}

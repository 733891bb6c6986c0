use crate::engine::lifecycle::ChatEngine;

impl ChatEngine {
    /// Best-effort "mark all unread as read" for the open conversation.
    ///
    /// Local read flags are left alone; they change only through update
    /// events from the live feed.
    pub(crate) async fn mark_read(&self, generation: u64, conversation_id: &str) {
        if !self.shared.is_current(generation) {
            return;
        }

        match self.backend.mark_all_unread_as_read(conversation_id).await {
            Ok(()) => tracing::debug!(conversation_id, "Marked conversation as read"),
            Err(e) => tracing::warn!(conversation_id, "Failed to mark messages as read: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::backend::mock::{mock_backend, settle, MockFeed};
    use crate::backend::{BackendError, MessagePage};
    use crate::engine::message_list::tests::message;
    use crate::engine::ChatEngine;
    use crate::models::{LiveAction, LiveEvent};

    #[tokio::test]
    async fn test_marks_read_once_after_first_page() {
        let (backend, mut server) = mock_backend();
        let engine = ChatEngine::new(backend, MockFeed::new(), 50);
        engine.open(Some("c1"), Some("me"));

        let page = server.next_page().await;
        settle().await;
        assert!(server.try_next_mark_read().is_none());

        page.reply.ok(MessagePage {
            items: vec![message("m1", "u2", "a")],
            has_more: true,
        });
        let request = server.next_mark_read().await;
        assert_eq!(request.conversation_id, "c1");
        request.reply.ok(());

        // History paging does not mark again.
        let handle = engine.load_more().unwrap();
        server.next_page().await.reply.ok(MessagePage {
            items: vec![message("m0", "u2", "z")],
            has_more: false,
        });
        handle.await.unwrap();
        settle().await;
        assert!(server.try_next_mark_read().is_none());
    }

    #[tokio::test]
    async fn test_mark_read_failure_is_silent() {
        let (backend, mut server) = mock_backend();
        let feed = MockFeed::new();
        let engine = ChatEngine::new(backend, feed.clone(), 50);
        engine.open(Some("c1"), Some("me"));

        server.next_page().await.reply.ok(MessagePage {
            items: vec![message("m1", "u2", "a")],
            has_more: false,
        });
        server
            .next_mark_read()
            .await
            .reply
            .err(BackendError::RequestFailed("HTTP 500".to_string()));
        settle().await;

        let snap = engine.snapshot();
        assert!(snap.error.is_none());
        assert!(!snap.messages[0].read);

        // Read state flips locally only through an update event.
        let mut read = message("m1", "u2", "a");
        read.read = true;
        feed.emit_message("c1", LiveEvent::new(LiveAction::Update, read));
        assert!(engine.snapshot().messages[0].read);
    }
}

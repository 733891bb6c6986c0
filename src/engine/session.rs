use crate::engine::lifecycle::ChatEngine;

impl ChatEngine {
    /// Fetches conversation metadata once. Failure is surfaced but leaves
    /// the message list alone; there is no retry short of reopening.
    pub(crate) async fn load_session(&self, generation: u64, conversation_id: &str) {
        let result = self.backend.fetch_session(conversation_id).await;

        self.shared.with_current(generation, |conv| match result {
            Ok(session) => {
                conv.session = Some(session);
                conv.last_error = None;
            }
            Err(e) => {
                tracing::error!(conversation_id, "Failed to load conversation: {}", e);
                conv.last_error = Some(format!("Failed to load conversation: {}", e));
            }
        });
    }
}

use std::sync::{Arc, Weak};

use crate::backend::{MessageCallback, SessionCallback, Subscription};
use crate::engine::lifecycle::ChatEngine;
use crate::engine::reconcile::Applied;
use crate::engine::state::{OpenConversation, Shared};
use crate::models::{ConversationSession, LiveAction, LiveEvent, Message};

/// Folds one remote event into the open conversation.
///
/// Creates that echo one of our own in-flight sends are skipped: the send
/// response reconciles those. Correlation uses the echoed client token;
/// records without a token fall back to "sender is the current user".
pub(crate) fn reconcile_message_event(
    conv: &mut OpenConversation,
    event: LiveEvent<Message>,
) -> Applied {
    let record = &event.record;
    if record.conversation_id != conv.conversation_id || record.is_pending() {
        return Applied::Ignored;
    }

    if event.action == LiveAction::Create {
        let own_echo = match record.client_token.as_deref() {
            Some(token) => conv.messages.has_pending_token(token),
            None => record.sender_id == conv.current_user,
        };
        if own_echo {
            return Applied::Ignored;
        }
    }

    conv.messages.apply_remote(event)
}

impl ChatEngine {
    /// Opens the message and session feeds for `conversation_id`.
    ///
    /// Callbacks hold the state weakly and carry the generation, so a feed
    /// that fires after teardown writes nothing.
    pub(crate) fn subscribe_live(&self, generation: u64, conversation_id: &str) -> Vec<Subscription> {
        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        let on_message: MessageCallback = Arc::new(move |event: LiveEvent<Message>| {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            let action = event.action;
            let id = event.record.id.to_string();
            if let Some(applied) =
                shared.with_current(generation, |conv| reconcile_message_event(conv, event))
            {
                tracing::debug!(action = action.as_str(), %id, ?applied, "Live message event");
            }
        });

        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        let on_session: SessionCallback = Arc::new(move |session: ConversationSession| {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            shared.with_current(generation, |conv| {
                if session.id == conv.conversation_id {
                    conv.session = Some(session);
                }
            });
        });

        vec![
            self.feed.subscribe_to_messages(conversation_id, on_message),
            self.feed.subscribe_to_session(conversation_id, on_session),
        ]
    }
}

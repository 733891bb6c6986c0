pub mod attachment;
pub mod conversation;
pub mod event;
pub mod message;
pub mod notification;

pub use attachment::AttachmentRef;
pub use conversation::ConversationSession;
pub use event::{LiveAction, LiveEvent};
pub use message::{Message, MessageId, MessageKind};
pub use notification::Notification;

//! Relay domain module

mod envelope;
mod notification;
mod payload;
mod policy;

pub use envelope::ClientMessage;
pub use notification::{NotificationClick, NotificationRequest, DEFAULT_ACTION};
pub use payload::{PushPayload, SafeData};
pub use policy::{
    ClickStrategy, RelayPolicy, TagStrategy, TitleSource, DEFAULT_FALLBACK_BODY,
    DEFAULT_FALLBACK_TITLE, DEFAULT_FIXED_TAG, DEFAULT_ICON, DEFAULT_TAG_PREFIX, DEFAULT_URL,
};

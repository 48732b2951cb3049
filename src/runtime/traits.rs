//! Trait abstractions for runtime I/O
//!
//! The inference seam lives in `crate::inference`; this file holds the
//! platform services a UI shell provides.

use crate::conversation::MessageId;
use std::sync::Arc;

/// Platform side capabilities. Every call is fire-and-forget.
pub trait PlatformCapabilities: Send + Sync {
    fn copy_to_clipboard(&self, text: &str);

    fn present_share(&self, text: &str);

    /// Start speaking `text`, stopping any utterance already playing
    fn speak(&self, text: &str);

    /// Haptic success notification
    fn notify_success(&self);

    /// Offer to undo the deletion of `message_id`; acceptance comes back as an undo call
    fn confirm_undo(&self, message_id: MessageId, text: &str);
}

// ============================================================================
// Arc implementation for trait objects
// ============================================================================

impl<T: PlatformCapabilities + ?Sized> PlatformCapabilities for Arc<T> {
    fn copy_to_clipboard(&self, text: &str) {
        (**self).copy_to_clipboard(text);
    }

    fn present_share(&self, text: &str) {
        (**self).present_share(text);
    }

    fn speak(&self, text: &str) {
        (**self).speak(text);
    }

    fn notify_success(&self) {
        (**self).notify_success();
    }

    fn confirm_undo(&self, message_id: MessageId, text: &str) {
        (**self).confirm_undo(message_id, text);
    }
}

//! Screenshot history trimming.
//!
//! Every computer action returns a screenshot, so long runs accumulate far
//! more images than the model needs. Before each request the oldest images
//! are stripped from `tool_result` blocks, in whole chunks, so the retained
//! boundary only moves every `chunk_size` screenshots and the request prefix
//! stays cache-friendly.

use deskpilot_core::message::Conversation;
use tracing::debug;

/// Default number of images removed at a time.
pub const DEFAULT_CHUNK_SIZE: usize = 10;

/// Remove old image items so that at most `keep` remain, rounded so that
/// only a multiple of `chunk_size` images is ever removed.
///
/// Only image items inside `tool_result` blocks are touched; text items,
/// blocks and turns are never removed. Returns the number of images removed.
pub fn trim_images(conversation: &mut Conversation, keep: usize, chunk_size: usize) -> usize {
    let total = conversation.image_count();
    if total <= keep {
        return 0;
    }

    let mut excess = total - keep;
    if chunk_size > 0 {
        excess -= excess % chunk_size;
    }
    if excess == 0 {
        return 0;
    }

    let mut remaining = excess;
    for content in conversation.tool_results_mut() {
        if remaining == 0 {
            break;
        }
        content.retain(|item| {
            if remaining > 0 && item.is_image() {
                remaining -= 1;
                false
            } else {
                true
            }
        });
    }

    let removed = excess - remaining;
    debug!(total, keep, removed, "Trimmed screenshot history");
    removed
}

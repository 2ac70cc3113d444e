// User-facing notices (the toast side channel)
use serde::Serialize;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

pub mod messages {
    pub const LOAD_FAILED: &str = "Failed to load posts";
    pub const LOGIN_TO_VOTE: &str = "Please log in to vote";
    pub const VOTE_FAILED: &str = "Failed to vote";
    pub const LOGIN_TO_SAVE: &str = "Please log in to save posts";
    pub const SAVED: &str = "Post saved to library! 📌";
    pub const UNSAVED: &str = "Post removed from library";
    pub const SAVE_FAILED: &str = "Failed to save post";
    pub const POST_CREATED: &str = "Post created successfully! 🔥";
    pub const POST_FAILED: &str = "Failed to create post";
    pub const REPORTED: &str = "Post reported. Thanks for keeping Roastr clean! 🚫";
    pub const REPORT_FAILED: &str = "Failed to report post";
    pub const LOGIN_TO_DELETE: &str = "Please log in to delete posts";
    pub const POST_DELETED: &str = "Post deleted";
    pub const NOT_YOUR_POST: &str = "You can only delete your own posts";
    pub const DELETE_FAILED: &str = "Failed to delete post";
    pub const LOGIN_FOR_LIBRARY: &str = "Please log in to see your library";
    pub const LIBRARY_FAILED: &str = "Failed to load saved posts";
    pub const LOGIN_FOR_PROFILE: &str = "Please log in to edit your profile";
    pub const PROFILE_UPDATED: &str = "Profile updated successfully!";
    pub const PROFILE_FAILED: &str = "Failed to update profile";
}

/// Receives notices raised while handling a viewer's action.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Collects notices for a single request so they can be returned with it.
#[derive(Debug, Default)]
pub struct NoticeLog {
    notices: Mutex<Vec<Notice>>,
}

impl NoticeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far, oldest first.
    pub fn snapshot(&self) -> Vec<Notice> {
        match self.notices.lock() {
            Ok(notices) => notices.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn drain(&self) -> Vec<Notice> {
        match self.notices.lock() {
            Ok(mut notices) => std::mem::take(&mut *notices),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl Notifier for NoticeLog {
    fn notify(&self, notice: Notice) {
        tracing::debug!(level = ?notice.level, message = %notice.message, "notice");
        match self.notices.lock() {
            Ok(mut notices) => notices.push(notice),
            Err(poisoned) => poisoned.into_inner().push(notice),
        }
    }
}

use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::flag::{AssemblyError, CandidateFlags, MasterFlag, SLOT_COUNT};

/// How long the "Copied!" label stays up after a successful copy.
pub const COPIED_DISPLAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClipboardError {
    #[error("Could not copy flag to clipboard.")]
    Unavailable(String),
}

pub trait Clipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// System clipboard, opened lazily on every copy.
#[derive(Default)]
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
        clipboard
            .set_text(text)
            .map_err(|e| ClipboardError::Unavailable(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Editing,
    Success(MasterFlag),
    Failed(AssemblyError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyOutcome {
    Copied,
    /// Nothing to copy, or the previous copy is still being displayed.
    Ignored,
    Failed,
}

/// State of the assembler panel: the four inputs plus the last outcome.
#[derive(Debug, Default)]
pub struct AssemblerSession {
    flags: CandidateFlags,
    phase: Phase,
    copied_at: Option<Instant>,
    clipboard_error: Option<ClipboardError>,
}

impl AssemblerSession {
    pub fn new() -> Self {
        AssemblerSession::default()
    }

    pub fn slot(&self, index: usize) -> &str {
        self.flags.slot(index).map(String::as_str).unwrap_or("")
    }

    /// Gives mutable access to a 0-based slot. Any edit drops the previous outcome.
    pub fn edit(&mut self, index: usize) -> Option<&mut String> {
        if index >= SLOT_COUNT {
            return None;
        }
        self.reset_outcome();
        self.flags.slot_mut(index)
    }

    pub fn set_slot(&mut self, index: usize, value: &str) {
        if let Some(slot) = self.edit(index) {
            *slot = value.to_owned();
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn master_flag(&self) -> Option<&MasterFlag> {
        match &self.phase {
            Phase::Success(flag) => Some(flag),
            _ => None,
        }
    }

    pub fn is_copied(&self) -> bool {
        self.copied_at.is_some()
    }

    /// The single message to show, if any. A clipboard failure is reported
    /// on top of a successful assembly without hiding the flag.
    pub fn message(&self) -> Option<String> {
        if let Some(e) = &self.clipboard_error {
            return Some(e.to_string());
        }
        match &self.phase {
            Phase::Failed(e) => Some(e.to_string()),
            _ => None,
        }
    }

    pub fn assemble(&mut self) -> &Phase {
        self.copied_at = None;
        self.clipboard_error = None;
        self.phase = match self.flags.assemble() {
            Ok(flag) => {
                info!("master flag assembled");
                Phase::Success(flag)
            }
            Err(e) => {
                debug!(slot = ?e.slot(), "assembly failed: {e}");
                Phase::Failed(e)
            }
        };
        &self.phase
    }

    pub fn copy(&mut self, clipboard: &mut dyn Clipboard, now: Instant) -> CopyOutcome {
        if self.copied_at.is_some() {
            return CopyOutcome::Ignored;
        }
        let Phase::Success(flag) = &self.phase else {
            return CopyOutcome::Ignored;
        };

        match clipboard.set_text(flag.as_str()) {
            Ok(()) => {
                self.clipboard_error = None;
                self.copied_at = Some(now);
                CopyOutcome::Copied
            }
            Err(e) => {
                warn!("failed to copy master flag: {e:?}");
                self.clipboard_error = Some(e);
                CopyOutcome::Failed
            }
        }
    }

    /// Reverts the copied display once [`COPIED_DISPLAY`] has passed.
    pub fn tick(&mut self, now: Instant) {
        if let Some(copied_at) = self.copied_at
            && now.saturating_duration_since(copied_at) >= COPIED_DISPLAY
        {
            self.copied_at = None;
        }
    }

    fn reset_outcome(&mut self) {
        self.phase = Phase::Editing;
        self.copied_at = None;
        self.clipboard_error = None;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Default)]
    struct FakeClipboard {
        contents: Option<String>,
        fail: bool,
    }

    impl Clipboard for FakeClipboard {
        fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
            if self.fail {
                return Err(ClipboardError::Unavailable("no display".to_owned()));
            }
            self.contents = Some(text.to_owned());
            Ok(())
        }
    }

    fn filled_session() -> AssemblerSession {
        let mut session = AssemblerSession::new();
        session.set_slot(0, "Dark_Flag{ABCDEFGH}");
        session.set_slot(1, "Dark_Flag{IJKLMNOP}");
        session.set_slot(2, "Dark_Flag{QRSTUVWX}");
        session.set_slot(3, "Dark_Flag{YZ012345}");
        session
    }

    #[test]
    fn test_starts_editing() {
        let session = AssemblerSession::new();
        assert_eq!(session.phase(), &Phase::Editing);
        assert_eq!(session.message(), None);
        assert_eq!(session.slot(0), "");
    }

    #[test]
    fn test_success_then_failure_replace_each_other() {
        let mut session = filled_session();
        session.assemble();
        assert_eq!(
            session.master_flag().map(MasterFlag::as_str),
            Some("Dark_Flag{CDEFKLMNSTUV0123}")
        );
        assert_eq!(session.message(), None);

        session.set_slot(2, "nope");
        assert_eq!(session.phase(), &Phase::Editing);
        session.assemble();
        assert_eq!(session.master_flag(), None);
        assert_eq!(
            session.phase(),
            &Phase::Failed(AssemblyError::FormatMismatch { slot: 3 })
        );
        assert!(session.message().unwrap().starts_with("Flag #3"));

        session.set_slot(2, "Dark_Flag{QRSTUVWX}");
        session.assemble();
        assert_eq!(session.message(), None);
        assert!(session.master_flag().is_some());
    }

    #[test]
    fn test_edit_out_of_range() {
        let mut session = filled_session();
        session.assemble();
        assert!(session.edit(SLOT_COUNT).is_none());
        assert!(session.master_flag().is_some());
    }

    #[test]
    fn test_copy_and_revert() {
        let mut session = filled_session();
        let mut clipboard = FakeClipboard::default();
        let start = Instant::now();

        assert_eq!(session.copy(&mut clipboard, start), CopyOutcome::Ignored);

        session.assemble();
        assert_eq!(session.copy(&mut clipboard, start), CopyOutcome::Copied);
        assert_eq!(
            clipboard.contents.as_deref(),
            Some("Dark_Flag{CDEFKLMNSTUV0123}")
        );
        assert!(session.is_copied());
        assert_eq!(session.copy(&mut clipboard, start), CopyOutcome::Ignored);

        session.tick(start + Duration::from_millis(1999));
        assert!(session.is_copied());
        session.tick(start + COPIED_DISPLAY);
        assert!(!session.is_copied());
        assert!(session.master_flag().is_some());
    }

    #[test]
    fn test_copy_failure_keeps_flag() {
        let mut session = filled_session();
        let mut clipboard = FakeClipboard {
            fail: true,
            ..Default::default()
        };
        session.assemble();

        assert_eq!(session.copy(&mut clipboard, Instant::now()), CopyOutcome::Failed);
        assert!(!session.is_copied());
        assert_eq!(
            session.message().as_deref(),
            Some("Could not copy flag to clipboard.")
        );
        assert_eq!(
            session.master_flag().map(MasterFlag::as_str),
            Some("Dark_Flag{CDEFKLMNSTUV0123}")
        );

        clipboard.fail = false;
        assert_eq!(session.copy(&mut clipboard, Instant::now()), CopyOutcome::Copied);
        assert_eq!(session.message(), None);
    }

    #[test]
    fn test_edit_clears_copied_state() {
        let mut session = filled_session();
        let mut clipboard = FakeClipboard::default();
        session.assemble();
        session.copy(&mut clipboard, Instant::now());

        session.edit(0).unwrap().push('x');
        assert!(!session.is_copied());
        assert_eq!(session.phase(), &Phase::Editing);
        assert_eq!(session.slot(0), "Dark_Flag{ABCDEFGH}x");
    }
}

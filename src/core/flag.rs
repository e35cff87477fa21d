use std::{fmt::Display, ops::Range, sync::LazyLock};

use regex::Regex;
use thiserror::Error;

pub const SLOT_COUNT: usize = 4;
pub const FLAG_PREFIX: &str = "Dark_Flag{";
pub const FLAG_SUFFIX: &str = "}";
pub const MIN_INNER_LEN: usize = 6;
/// Character positions (0-based, end exclusive) of the fragment inside `{}`.
pub const FRAGMENT_RANGE: Range<usize> = 2..6;

// `.` stops only at `\n`. A `\r` or other separator inside the braces is content.
static FLAG_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Dark_Flag\{(.+?)\}$").expect("flag pattern compiles"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    #[error("Please enter all four real flags.")]
    MissingInput,
    #[error("Flag #{slot} has an invalid format. It must look like: Dark_Flag{{...}}")]
    FormatMismatch { slot: usize },
    #[error(
        "Flag #{slot}'s content is too short. The text inside {{}} must be at least {minimum} characters long."
    )]
    ContentTooShort { slot: usize, minimum: usize },
}

impl AssemblyError {
    /// 1-based slot the error refers to, `None` for the blanket missing input error.
    pub fn slot(&self) -> Option<usize> {
        match self {
            Self::MissingInput => None,
            Self::FormatMismatch { slot } | Self::ContentTooShort { slot, .. } => Some(*slot),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterFlag(String);

impl MasterFlag {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for MasterFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The four user supplied flags, in slot order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateFlags([String; SLOT_COUNT]);

impl CandidateFlags {
    /// Returns the candidate for a 0-based slot index.
    pub fn slot(&self, index: usize) -> Option<&String> {
        self.0.get(index)
    }

    pub fn slot_mut(&mut self, index: usize) -> Option<&mut String> {
        self.0.get_mut(index)
    }

    pub fn assemble(&self) -> Result<MasterFlag, AssemblyError> {
        assemble(&self.0)
    }
}

/// Validates a single candidate and returns its four character fragment.
///
/// `slot` is 1-based and only used to label the error.
pub fn extract_fragment(slot: usize, candidate: &str) -> Result<&str, AssemblyError> {
    let inner = FLAG_FORMAT
        .captures(candidate.trim())
        .and_then(|caps| caps.get(1))
        .ok_or(AssemblyError::FormatMismatch { slot })?
        .as_str();

    if inner.chars().count() < MIN_INNER_LEN {
        return Err(AssemblyError::ContentTooShort {
            slot,
            minimum: MIN_INNER_LEN,
        });
    }

    Ok(char_slice(inner, FRAGMENT_RANGE))
}

/// Builds the master flag from the fragments of all four candidates.
///
/// Validation is fail-fast: the first failing slot is reported and later
/// slots are not looked at.
pub fn assemble<S: AsRef<str>>(candidates: &[S; SLOT_COUNT]) -> Result<MasterFlag, AssemblyError> {
    if candidates.iter().any(|c| c.as_ref().trim().is_empty()) {
        return Err(AssemblyError::MissingInput);
    }

    let mut fragments = String::with_capacity(SLOT_COUNT * FRAGMENT_RANGE.len());
    for (i, candidate) in candidates.iter().enumerate() {
        fragments.push_str(extract_fragment(i + 1, candidate.as_ref())?);
    }

    Ok(MasterFlag(format!("{FLAG_PREFIX}{fragments}{FLAG_SUFFIX}")))
}

/// Slices by character position, truncating at the end of the string.
fn char_slice(s: &str, range: Range<usize>) -> &str {
    let byte_at = |n: usize| s.char_indices().nth(n).map(|(i, _)| i).unwrap_or(s.len());
    let start = byte_at(range.start);
    let end = byte_at(range.end);
    &s[start..end.max(start)]
}

//! Commit message extraction from email-style patch headers.
//!
//! `git format-patch` output looks like:
//!
//! ```text
//! From 1a2b3c... Mon Sep 17 00:00:00 2001
//! From: Someone <someone@example.com>
//! Date: Tue, 1 Oct 2024 14:00:00 +0200
//! Subject: [PATCH 3/5] 001-Fix login redirect
//!
//! The redirect lost the query string.
//! ---
//!  src/login.js | 2 +-
//! ```
//!
//! [`MessageExtractor`] walks those lines through four states:
//!
//! | State           | Line                         | Effect                              |
//! |-----------------|------------------------------|-------------------------------------|
//! | `BeforeSubject` | `Subject: ...`               | subject recorded, → `InSubject`     |
//! | `BeforeSubject` | anything else                | ignored                             |
//! | `InSubject`     | starts with space/tab        | folded subject continuation         |
//! | `InSubject`     | blank                        | → `AfterBlank`                      |
//! | `InSubject`     | other header                 | ignored                             |
//! | `AfterBlank`    | non-blank                    | trimmed, appended to the body       |
//! | any             | starts with `---`            | → `Done`                            |
//!
//! The subject loses a leading `[PATCH ...]` tag and then a leading numeric
//! list marker such as `001-` or `12 `.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static PATCH_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[PATCH.*?\]\s*").expect("valid patch tag regex"));
static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+[-\s]+").expect("valid list marker regex"));

const SUBJECT_PREFIX: &str = "Subject:";
const DIFF_MARKER: &str = "---";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Position of the extractor within the patch header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderState {
    /// No `Subject:` line seen yet.
    BeforeSubject,
    /// Inside the header block that holds the subject.
    InSubject,
    /// Past the blank line that ends the header; collecting body lines.
    AfterBlank,
    /// Reached the `---` diff marker; further input is ignored.
    Done,
}

/// A commit message recovered from a patch header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitMessage {
    pub subject: String,
    pub body: Vec<String>,
}

/// Subject line, then one line per body line.
impl fmt::Display for CommitMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.subject)?;
        for line in &self.body {
            write!(f, "\n{line}")?;
        }
        Ok(())
    }
}

/// Why a header did not yield a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MessageError {
    /// No `Subject:` line appeared before the diff marker or end of input.
    MissingSubject,
    /// The subject was empty once the patch tag and list marker were removed.
    EmptySubject {
        /// The subject as written in the header.
        raw: String,
    },
}

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSubject => {
                write!(f, "no 'Subject:' line found before the '---' diff marker")
            }
            Self::EmptySubject { raw } => {
                write!(f, "subject '{raw}' is empty after removing the patch tag")
            }
        }
    }
}

impl std::error::Error for MessageError {}

// ---------------------------------------------------------------------------
// MessageExtractor
// ---------------------------------------------------------------------------

/// Line-at-a-time header scanner.
#[derive(Clone, Debug)]
pub struct MessageExtractor {
    state: HeaderState,
    subject: Option<String>,
    body: Vec<String>,
}

impl Default for MessageExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageExtractor {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: HeaderState::BeforeSubject,
            subject: None,
            body: Vec::new(),
        }
    }

    #[must_use]
    pub const fn state(&self) -> HeaderState {
        self.state
    }

    /// Consume one line (without its line terminator) and return the new
    /// state.
    pub fn feed(&mut self, line: &str) -> HeaderState {
        if self.state == HeaderState::Done {
            return self.state;
        }
        if line.starts_with(DIFF_MARKER) {
            self.state = HeaderState::Done;
            return self.state;
        }

        match self.state {
            HeaderState::BeforeSubject => {
                if let Some(rest) = line.strip_prefix(SUBJECT_PREFIX) {
                    self.subject = Some(rest.trim().to_owned());
                    self.state = HeaderState::InSubject;
                }
            }
            HeaderState::InSubject => {
                if line.trim().is_empty() {
                    self.state = HeaderState::AfterBlank;
                } else if line.starts_with([' ', '\t']) {
                    if let Some(subject) = &mut self.subject {
                        subject.push(' ');
                        subject.push_str(line.trim());
                    }
                }
            }
            HeaderState::AfterBlank => {
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    self.body.push(trimmed.to_owned());
                }
            }
            HeaderState::Done => {}
        }
        self.state
    }

    /// Finish scanning and produce the message.
    ///
    /// # Errors
    /// [`MessageError::MissingSubject`] if no subject was seen,
    /// [`MessageError::EmptySubject`] if it cleaned down to nothing.
    pub fn finish(self) -> Result<CommitMessage, MessageError> {
        let raw = self.subject.ok_or(MessageError::MissingSubject)?;
        let subject = clean_subject(&raw);
        if subject.is_empty() {
            return Err(MessageError::EmptySubject { raw });
        }
        Ok(CommitMessage {
            subject,
            body: self.body,
        })
    }
}

/// Strip the `[PATCH ...]` tag, then a leading numeric list marker.
#[must_use]
pub fn clean_subject(raw: &str) -> String {
    let without_tag = PATCH_TAG.replace(raw.trim(), "");
    let without_marker = LIST_MARKER.replace(&without_tag, "");
    without_marker.trim().to_owned()
}

/// Extract the commit message from the full text of a patch file.
///
/// # Errors
/// See [`MessageExtractor::finish`].
pub fn extract(text: &str) -> Result<CommitMessage, MessageError> {
    let mut extractor = MessageExtractor::new();
    for line in text.lines() {
        if extractor.feed(line) == HeaderState::Done {
            break;
        }
    }
    extractor.finish()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

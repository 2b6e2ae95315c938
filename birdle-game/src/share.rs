//! Result sharing.
//!
//! Builds the fixed-shape share text for a finished daily puzzle and drives
//! the platform share paths in order: native share sheet, clipboard, then
//! handing the text back for direct display. The result is never silently
//! lost.

use crate::state::DailyGameRecord;

const WIN_SQUARE: char = '\u{1F7E9}'; // 🟩
const LOSS_SQUARE: char = '\u{1F7E5}'; // 🟥
const PAD_SQUARE: char = '\u{2B1B}'; // ⬛

/// Render the share block for a completed record.
///
/// Shape: title line with the date, region line, result line
/// (`<guesses>/<max>` on a win, `X/<max>` otherwise), blank line, one
/// square per guess padded to the guess limit, blank line, URL.
#[must_use]
pub fn share_text(record: &DailyGameRecord, url: &str) -> String {
    let result = if record.won {
        format!("{}/{}", record.guess_count(), record.max_guesses)
    } else {
        format!("X/{}", record.max_guesses)
    };

    let mut grid = String::new();
    for guess in &record.guesses {
        grid.push(if guess.correct { WIN_SQUARE } else { LOSS_SQUARE });
    }
    for _ in 0..record.guesses_remaining() {
        grid.push(PAD_SQUARE);
    }

    format!(
        "\u{1F426} Audio-Birdle {date}\nRegion: {region}\n{result}\n\n{grid}\n\n{url}",
        date = record.date,
        region = record.region,
    )
}

/// Platform share capabilities.
///
/// Both methods report success; the driver decides what to try next. The
/// core never touches the OS share sheet or clipboard itself.
pub trait ShareSink {
    /// Hand the text to the OS share sheet. False when unavailable or refused.
    fn native_share(&self, text: &str) -> bool;

    /// Copy the text to the clipboard. False on failure.
    fn copy_to_clipboard(&self, text: &str) -> bool;
}

/// How a share attempt was ultimately delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareDelivery {
    /// The OS share sheet took it.
    Native,
    /// Copied to the clipboard.
    Clipboard,
    /// Neither path worked; the caller must show the text directly.
    Displayed,
}

/// Try every share path in order.
pub fn deliver_share<S: ShareSink>(sink: &S, text: &str) -> ShareDelivery {
    if sink.native_share(text) {
        ShareDelivery::Native
    } else if sink.copy_to_clipboard(text) {
        ShareDelivery::Clipboard
    } else {
        ShareDelivery::Displayed
    }
}

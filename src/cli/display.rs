// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Boxed key/value report used by `fuzzytm inspect`.
//!
//! Colors are on only when stdout is a terminal and `NO_COLOR` is unset.
//! `FUZZYTM_THEME=light` (or a light `COLORFGBG` background) switches to a
//! palette readable on white.

use std::io::IsTerminal;
use std::sync::OnceLock;

/// Columns between the two vertical borders.
const BOX_WIDTH: usize = 72;

const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Frame,
    Title,
    Good,
    Bad,
}

/// Resolved once per process from the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Style {
    color: bool,
    light: bool,
}

impl Style {
    const PLAIN: Style = Style {
        color: false,
        light: false,
    };

    fn from_env() -> Self {
        let color = std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal();
        let light = match std::env::var("FUZZYTM_THEME") {
            Ok(theme) => theme.eq_ignore_ascii_case("light"),
            // "fg;bg": backgrounds 7 and 9-15 are light
            Err(_) => std::env::var("COLORFGBG")
                .ok()
                .and_then(|v| v.rsplit(';').next()?.parse::<u8>().ok())
                .is_some_and(|bg| bg == 7 || bg > 8),
        };
        Self { color, light }
    }

    fn rgb(&self, tone: Tone) -> (u8, u8, u8) {
        match (tone, self.light) {
            (Tone::Frame, false) => (92, 99, 112),
            (Tone::Frame, true) => (160, 161, 167),
            (Tone::Title, false) => (86, 182, 194),
            (Tone::Title, true) => (1, 132, 188),
            (Tone::Good, false) => (152, 195, 121),
            (Tone::Good, true) => (80, 161, 79),
            (Tone::Bad, false) => (224, 108, 117),
            (Tone::Bad, true) => (228, 86, 73),
        }
    }

    fn paint(&self, tone: Tone, text: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        let (r, g, b) = self.rgb(tone);
        let bold = if tone == Tone::Frame { "" } else { "\x1b[1m" };
        format!("{bold}\x1b[38;2;{r};{g};{b}m{text}{RESET}")
    }

    fn field_line(&self, label: &str, value: &str) -> String {
        let gap = BOX_WIDTH.saturating_sub(visible_len(label) + visible_len(value) + 2);
        let bar = self.paint(Tone::Frame, "│");
        format!("{bar} {label}{}{value} {bar}", " ".repeat(gap))
    }

    fn top_line(&self, title: &str) -> String {
        let title = format!(" {} ", self.paint(Tone::Title, title));
        let fill = BOX_WIDTH.saturating_sub(visible_len(&title) + 1);
        format!(
            "{}{title}{}",
            self.paint(Tone::Frame, "┌─"),
            self.paint(Tone::Frame, &format!("{}┐", "─".repeat(fill)))
        )
    }

    fn bottom_line(&self) -> String {
        self.paint(Tone::Frame, &format!("└{}┘", "─".repeat(BOX_WIDTH)))
    }
}

fn style() -> &'static Style {
    static STYLE: OnceLock<Style> = OnceLock::new();
    STYLE.get_or_init(Style::from_env)
}

/// Printed width of `s`, skipping ANSI escape sequences.
pub fn visible_len(s: &str) -> usize {
    let mut len = 0;
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            chars.by_ref().find(|&c| c == 'm');
        } else {
            len += 1;
        }
    }
    len
}

/// One row with `label` on the left and `value` flush right.
pub fn field(label: &str, value: &str) {
    println!("{}", style().field_line(label, value));
}

pub fn section_top(title: &str) {
    println!("{}", style().top_line(title));
}

pub fn section_bot() {
    println!("{}", style().bottom_line());
}

pub fn format_size(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    match bytes {
        0..=1023 => format!("{bytes} B"),
        1024..=1_048_575 => format!("{:.1} KB", b / KB),
        _ => format!("{:.1} MB", b / KB / KB),
    }
}

pub fn crc_status(valid: bool) -> String {
    if valid {
        style().paint(Tone::Good, "ok")
    } else {
        style().paint(Tone::Bad, "MISMATCH")
    }
}

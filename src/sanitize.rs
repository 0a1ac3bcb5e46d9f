//! Display sanitization for assistant replies.
//!
//! Assistant text arrives as loosely formatted prose: headings, emphasis,
//! link brackets and separator lines leak through from the model. The
//! sanitizer strips those symbols, turns dash lists into bullet lines and
//! produces markup whose only structural element is the line break.

use regex::Regex;

/// Characters removed from assistant text before display.
const STRIPPED_CHARS: [char; 9] = ['#', '*', '_', '{', '}', '[', ']', '(', ')'];

/// Glyph that replaces a leading `- ` on a line.
pub const BULLET: char = '\u{2022}';

/// Markup emitted for each line break.
pub const LINE_BREAK: &str = "<br>";

/// Sanitizer for assistant text.
///
/// Holds the compiled patterns; construction is the only fallible step.
#[derive(Clone, Debug)]
pub struct Sanitizer {
    separator_rule: Regex,
    bullet_rule: Regex,
}

impl Sanitizer {
    /// Compile the sanitizer patterns.
    ///
    /// # Errors
    /// Returns an error if a pattern fails to compile.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            separator_rule: Regex::new(r"-{3,}")?,
            bullet_rule: Regex::new(r"(?m)^[ \t]*- ")?,
        })
    }

    /// Strip markup symbols, separator runs and dash bullets.
    ///
    /// This is the idempotent core of [`Self::sanitize`]: applying it twice
    /// yields the same text as applying it once.
    #[must_use]
    pub fn clean(&self, raw: &str) -> String {
        let normalized = raw.replace("\r\n", "\n");
        let stripped: String = normalized
            .chars()
            .filter(|c| !STRIPPED_CHARS.contains(c))
            .collect();
        let without_separators = self.separator_rule.replace_all(&stripped, "");
        let bullet = format!("{BULLET} ");
        self.bullet_rule
            .replace_all(&without_separators, bullet.as_str())
            .into_owned()
    }

    /// Turn raw assistant text into display-ready markup.
    ///
    /// Runs [`Self::clean`], escapes HTML-significant characters and
    /// converts every `\n` into [`LINE_BREAK`].
    #[must_use]
    pub fn sanitize(&self, raw: &str) -> String {
        let cleaned = self.clean(raw);
        to_markup(&cleaned)
    }
}

/// Render literal text as markup without stripping any symbol.
///
/// Used for client-authored notices that embed user input.
#[must_use]
pub fn to_markup(text: &str) -> String {
    escape_html(&text.replace("\r\n", "\n")).replace('\n', LINE_BREAK)
}

/// Escape the characters that would otherwise be interpreted as markup.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

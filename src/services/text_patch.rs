//! Text substitution primitives used to patch generated project files.
//!
//! Generated IDE files are treated as text with known anchor strings. The
//! `assert_*` variants fail with [`ComposerError::Assertion`] when the anchor is
//! missing, which signals that the template is not in the expected state.

use crate::error::{ComposerError, Result};
use regex::{NoExpand, Regex};

/// Replace the first occurrence of `from`.
///
/// # Returns
/// Whether the content changed, and the new content
pub fn replace(content: &str, from: &str, to: &str) -> (bool, String) {
    let replaced = content.replacen(from, to, 1);
    let success = !replaced.is_empty() && replaced != content;
    (success, replaced)
}

pub fn assert_replace(content: &str, from: &str, to: &str) -> Result<String> {
    let (success, replaced) = replace(content, from, to);
    if !success {
        return Err(replace_failed(from, to));
    }
    Ok(replaced)
}

pub fn replace_all(content: &str, from: &str, to: &str) -> String {
    content.replace(from, to)
}

/// Replace every occurrence; fails when non-empty content stays unchanged
pub fn assert_replace_all(content: &str, from: &str, to: &str) -> Result<String> {
    let replaced = replace_all(content, from, to);
    if !content.is_empty() && replaced == content {
        return Err(replace_failed(from, to));
    }
    Ok(replaced)
}

/// Replace every match of `pattern` with the literal `to`; fails when nothing matched
pub fn assert_replace_regex(content: &str, pattern: &Regex, to: &str) -> Result<String> {
    let replaced = pattern.replace_all(content, NoExpand(to));
    if replaced == content {
        return Err(replace_failed(pattern.as_str(), to));
    }
    Ok(replaced.into_owned())
}

/// Put `entry` on its own line directly above `marker`.
///
/// The entry takes the marker's indentation and the file's line ending. The
/// marker stays in place so later entries land after this one.
pub fn insert_before_marker(content: &str, marker: &str, entry: &str) -> Result<String> {
    let position = content
        .find(marker)
        .ok_or_else(|| ComposerError::Assertion(format!("Could not find marker '{}'.", marker)))?;

    let newline = line_ending(content);
    let line_start = content[..position].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let indent = &content[line_start..position];

    let mut patched = String::with_capacity(content.len() + entry.len() + indent.len() + 2);
    if indent.chars().all(char::is_whitespace) {
        patched.push_str(&content[..line_start]);
        patched.push_str(indent);
        patched.push_str(entry);
        patched.push_str(newline);
        patched.push_str(&content[line_start..]);
    } else {
        patched.push_str(&content[..position]);
        patched.push_str(entry);
        patched.push_str(newline);
        patched.push_str(&content[position..]);
    }
    Ok(patched)
}

/// Whether any line equals `entry` once surrounding whitespace is ignored
pub fn contains_line(content: &str, entry: &str) -> bool {
    let entry = entry.trim();
    content.lines().any(|line| line.trim() == entry)
}

/// Remove the first line equal to `entry` (ignoring surrounding whitespace)
pub fn assert_remove_line(content: &str, entry: &str) -> Result<String> {
    let wanted = entry.trim();
    let mut removed = false;
    let mut patched = String::with_capacity(content.len());

    for line in content.split_inclusive('\n') {
        if !removed && line.trim() == wanted {
            removed = true;
            continue;
        }
        patched.push_str(line);
    }

    if !removed {
        return Err(ComposerError::Assertion(format!(
            "Could not find line '{}'.",
            wanted
        )));
    }
    Ok(patched)
}

/// `\r\n` when the content already uses it, `\n` otherwise
pub fn line_ending(content: &str) -> &'static str {
    if content.contains("\r\n") { "\r\n" } else { "\n" }
}

pub fn remove_spaces(value: &str) -> String {
    value.replace(' ', "")
}

pub fn times(text: &str, count: usize) -> String {
    text.repeat(count)
}

pub fn multiline(lines: &[&str]) -> String {
    lines.join("\n")
}

/// Left-pad `value` with `fill` up to `target_length` characters
pub fn prepend_fill(value: &str, target_length: usize, fill: char) -> String {
    let length = value.chars().count();
    if length >= target_length {
        return value.to_string();
    }
    let mut padded = String::with_capacity(target_length);
    padded.extend(std::iter::repeat_n(fill, target_length - length));
    padded.push_str(value);
    padded
}

/// Semantic plugin version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    /// `PLUG_VERSION_HEX` representation, e.g. `0x00010203` for 1.2.3
    pub fn to_hex(&self) -> String {
        let value = (self.major << 16) | ((self.minor & 0xFF) << 8) | (self.patch & 0xFF);
        format!("0x{:08x}", value)
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Parse `major.minor.patch`, each part written as a canonical decimal integer
pub fn parse_version_number(value: &str) -> Result<Version> {
    let parts: Vec<&str> = value.split('.').collect();
    if parts.len() != 3 {
        return Err(ComposerError::InvalidVersion(value.to_string()));
    }

    let parse_part = |part: &str| -> Result<u32> {
        part.parse::<u32>()
            .ok()
            .filter(|number| number.to_string() == part)
            .ok_or_else(|| ComposerError::InvalidVersion(value.to_string()))
    };

    Ok(Version {
        major: parse_part(parts[0])?,
        minor: parse_part(parts[1])?,
        patch: parse_part(parts[2])?,
    })
}

fn replace_failed(from: &str, to: &str) -> ComposerError {
    ComposerError::Assertion(format!("Could not replace string '{}' to '{}'.", from, to))
}

//! Tolerant M3U/M3U8 playlist parser.
//!
//! Playlists in the wild mix three conventions, sometimes within one file:
//! EXTINF blocks, `title,url` / `title;url` pairs, and bare URL lines.
//! Each line is tried against the three formats in order of specificity.
//! Malformed entries are collected as warnings, never surfaced as errors:
//! a single bad line must not reject a whole externally-authored file.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::models::{Channel, ChannelId};
use crate::slug::slugify;

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^https?://\S+").expect("URL pattern is valid"));

/// Result of parsing one playlist file.
#[derive(Debug, Default)]
pub struct ParseOutcome {
    pub channels: Vec<Channel>,
    pub warnings: Vec<ParseWarning>,
}

/// A skipped entry, kept for observability only.
#[derive(Debug, Clone)]
pub struct ParseWarning {
    /// 1-based line number of the offending entry
    pub line: usize,
    pub message: String,
}

/// Extract the hostname of a URL, without a leading `www.`.
fn hostname(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_string())
}

/// Match a line against the URL pattern, returning the URL portion.
///
/// Anchored at the start: the URL must be the first thing on the line
/// (or in the field), and runs until the first whitespace.
fn match_url(line: &str) -> Option<&str> {
    URL_RE.find(line).map(|m| m.as_str())
}

/// Try the `title,url` / `title;url` convention on a non-comment line.
/// The second field (not the rest of the line) must be the URL.
fn match_delimited(line: &str) -> Option<(&str, &str)> {
    if !line.contains(',') && !line.contains(';') {
        return None;
    }
    let sep = if line.contains(',') { ',' } else { ';' };
    let mut parts = line.split(sep);
    let title = parts.next()?.trim();
    let url = match_url(parts.next()?.trim())?;
    Some((title, url))
}

/// Second-field URL of a line delimited by either separator, as accepted
/// inside an EXTINF block.
fn second_field_url(line: &str) -> Option<&str> {
    let mut parts = line.split([';', ',']);
    parts.next()?;
    match_url(parts.next()?.trim())
}

/// Channel id preference order: title slug, hostname slug, source slug.
fn derive_id(title: &str, host: Option<&str>, source_name: &str) -> ChannelId {
    let slug = {
        let s = slugify(title);
        if !s.is_empty() {
            s
        } else {
            let s = host.map(slugify).unwrap_or_default();
            if !s.is_empty() {
                s
            } else {
                slugify(source_name)
            }
        }
    };
    ChannelId::from_string(slug)
}

/// Parse raw playlist text into channel records.
///
/// `default_category` names the category every produced channel lands in
/// (falling back to `source_name` when empty). Unrecognized comment lines
/// and blank lines are ignored; EXTINF blocks with no following URL are
/// skipped with a warning.
#[must_use]
pub fn parse(raw: &str, default_category: &str, source_name: &str) -> ParseOutcome {
    let text = raw.strip_prefix('\u{feff}').unwrap_or(raw).replace("\r\n", "\n");
    let lines: Vec<&str> = text.split('\n').collect();

    let group = if default_category.is_empty() {
        source_name
    } else {
        default_category
    };
    let category = slugify(group);

    let mut out = ParseOutcome::default();
    let make = |title: String, url: &str| -> Channel {
        let host = hostname(url);
        Channel::new(
            derive_id(&title, host.as_deref(), source_name),
            title,
            url.to_string(),
            category.clone(),
            group.to_string(),
        )
    };

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i].trim();
        if line.is_empty() {
            i += 1;
            continue;
        }

        // Extended format: "#EXTINF:<duration>,<title>" followed by the
        // stream URL on a later non-blank, non-comment line.
        if line.starts_with("#EXTINF") {
            let title = line
                .split_once(',')
                .map(|(_, rest)| rest.trim())
                .filter(|t| !t.is_empty())
                .unwrap_or(source_name)
                .to_string();

            let mut j = i + 1;
            let mut url = None;
            while j < lines.len() {
                let cand = lines[j].trim();
                if cand.is_empty() || cand.starts_with('#') {
                    j += 1;
                    continue;
                }
                if let Some(u) = match_url(cand) {
                    url = Some(u);
                    break;
                }
                if let Some(u) = second_field_url(cand) {
                    url = Some(u);
                    break;
                }
                j += 1;
            }

            if let Some(u) = url {
                out.channels.push(make(title, u));
                i = j + 1;
            } else {
                out.warnings.push(ParseWarning {
                    line: i + 1,
                    message: format!("EXTINF entry \"{title}\" has no stream URL"),
                });
                i += 1;
            }
            continue;
        }

        // Remaining comment lines carry no channel data.
        if line.starts_with('#') {
            i += 1;
            continue;
        }

        // Delimited pair: "title,url" or "title;url".
        if let Some((title, url)) = match_delimited(line) {
            let title = if title.is_empty() { source_name } else { title };
            out.channels.push(make(title.to_string(), url));
            i += 1;
            continue;
        }

        // Bare URL: title falls back to the hostname, then the source name.
        if let Some(url) = match_url(line) {
            let title = hostname(url).unwrap_or_else(|| source_name.to_string());
            out.channels.push(make(title, url));
            i += 1;
            continue;
        }

        i += 1;
    }

    out
}

//! Pure transcript rendering. Takes an ordered tag list plus formatting
//! parameters and returns a single block of text; no I/O, no failure
//! paths for well-formed input.

pub mod stars;
pub mod text;
pub mod time;
pub mod tree;

pub use stars::{average_votes, star_count};
pub use time::{DurationStyle, format_duration, timestamp_link};

use taglog_types::{Style, Tag};

use crate::text::{csv_escape, strip_backticks, strip_markdown};

/// Render `tags` into one transcript. Tags must already be thresholded by
/// vote count and ordered ascending by timestamp; `offset` shifts every
/// timestamp, and relative times are measured from `window_start`.
pub fn render(
    tags: &[Tag],
    style: &Style,
    window_start: i64,
    window_end: i64,
    offset: i64,
) -> String {
    let mut lines = Vec::with_capacity(tags.len() + 1);

    if style.has_header() {
        lines.push(header(
            tags.len(),
            style.header_url(),
            window_start,
            window_end,
        ));
    }

    match style {
        Style::Classic {
            url,
            url_is_permanent,
        } => {
            for tag in tags {
                let rel = tag.timestamp + offset - window_start;
                let mut line = strip_backticks(&tag.text);
                if tag.votes != 0 {
                    line.push_str(&format!(" ({})", tag.votes));
                }
                match (url.as_deref(), *url_is_permanent) {
                    (Some(u), true) => line.push_str(&format!(
                        " [{}]({})",
                        format_duration(rel, DurationStyle::Classic),
                        timestamp_link(u, rel)
                    )),
                    _ => line.push_str(&format!(
                        " {}",
                        format_duration(rel, DurationStyle::Classic)
                    )),
                }
                lines.push(line);
            }
        }
        Style::Csv => {
            for tag in tags {
                let rel = tag.timestamp + offset - window_start;
                lines.push(format!(
                    "{},{},{},{}",
                    rel,
                    csv_escape(&tag.text),
                    tag.votes,
                    tag.hierarchy
                ));
            }
        }
        Style::Info { .. } => {}
        Style::Alternative { .. } | Style::Yt | Style::YtText => {
            render_tree(&mut lines, tags, style, window_start, offset);
        }
    }

    lines.join("\n")
}

/// `<url-or-empty> <absolute-start-time> <count> tags (<rate>/min)`.
fn header(count: usize, url: Option<&str>, window_start: i64, window_end: i64) -> String {
    let minutes = (window_end - window_start) as f64 / 60.0;
    let rate = if minutes > 0.0 {
        count as f64 / minutes
    } else {
        0.0
    };
    format!(
        "{} <t:{}:f> {} tags ({:.1}/min)",
        url.unwrap_or(""),
        window_start,
        count,
        rate
    )
}

fn render_tree(
    lines: &mut Vec<String>,
    tags: &[Tag],
    style: &Style,
    window_start: i64,
    offset: i64,
) {
    if tags.is_empty() {
        return;
    }
    let avg = average_votes(tags.iter().map(|t| t.votes));

    for (i, tag) in tags.iter().enumerate() {
        // virtual predecessor takes the first tag's own level; virtual
        // successor after the last tag takes -1
        let prev = if i == 0 {
            tag.hierarchy
        } else {
            tags[i - 1].hierarchy
        };
        let next = tags.get(i + 1).map_or(-1, |t| t.hierarchy);
        let rel = tag.timestamp + offset - window_start;

        let body = match style {
            Style::Alternative {
                url,
                url_is_permanent,
            } => {
                let time_part = match (url.as_deref(), *url_is_permanent) {
                    (Some(u), true) => format!(
                        "[{}]({}) | ",
                        format_duration(rel, DurationStyle::Classic),
                        timestamp_link(u, rel)
                    ),
                    _ => format!(" `{}` | ", format_duration(rel, DurationStyle::Classic)),
                };
                let stars = star_count(tag.votes, avg);
                let mut body = time_part + &strip_backticks(&tag.text);
                if stars > 0 {
                    body.push_str(&format!(" ({})", "⭐".repeat(stars)));
                }
                body
            }
            _ => format!(
                "{} {}",
                format_duration(rel, DurationStyle::Yt),
                strip_markdown(&tag.text)
            ),
        };

        let full = format!("{}{}", tree::prefix(prev, tag.hierarchy, next), body);
        // the first glyph is always dropped, and a leading join dash
        // becomes a closing mark
        let mut chars = full.chars();
        chars.next();
        let rest = chars.as_str();
        let line = match rest.strip_prefix('─') {
            Some(stripped) => format!("└{stripped}"),
            None => rest.to_string(),
        };
        lines.push(line);
    }
}

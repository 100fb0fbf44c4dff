/// How a relative timestamp is spelled out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationStyle {
    /// `XmYs`, with an `Xh` prefix when nonzero.
    Classic,
    /// `M:SS`, or `H:MM:SS` when hours are nonzero.
    Yt,
}

pub fn format_duration(t: i64, style: DurationStyle) -> String {
    let hours = t / 3600;
    let minutes = (t / 60) % 60;
    let seconds = t % 60;

    match style {
        DurationStyle::Classic => {
            if hours != 0 {
                format!("{hours}h{minutes}m{seconds}s")
            } else {
                format!("{minutes}m{seconds}s")
            }
        }
        DurationStyle::Yt => {
            if hours != 0 {
                format!("{hours}:{minutes:02}:{seconds:02}")
            } else {
                format!("{minutes}:{seconds:02}")
            }
        }
    }
}

/// Append a `t=<seconds>` parameter to a stream URL. Basic, not a full
/// URL rewrite, but enough for the major video platforms.
pub fn timestamp_link(url: &str, t: i64) -> String {
    let base = url.split('#').next().unwrap_or(url);
    if base.contains('?') {
        format!("{base}&t={t}s")
    } else {
        format!("{base}?t={t}s")
    }
}

use serde::{Deserialize, Serialize};

/// Transcript output style. Each variant carries only the parameters its
/// formatter uses, so an unknown style is unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Style {
    /// One line per tag: text, vote count, relative timestamp (linked when
    /// the stream URL is permanent).
    Classic {
        url: Option<String>,
        url_is_permanent: bool,
    },
    /// `relative_ts,"escaped text",votes,hierarchy` per line.
    Csv,
    /// `H:MM:SS text`, for pasting into a video description box.
    Yt,
    /// Same as `Yt` but intended to be sent as a plain text file.
    YtText,
    /// The hierarchy-aware tree view.
    Alternative {
        url: Option<String>,
        url_is_permanent: bool,
    },
    /// Header only, reserved.
    Info { url: Option<String> },
}

impl Style {
    /// Styles meant for raw export carry no header line.
    pub fn has_header(&self) -> bool {
        !matches!(self, Style::Csv | Style::Yt | Style::YtText)
    }

    /// The stream URL shown in the header, if the style carries one.
    pub fn header_url(&self) -> Option<&str> {
        match self {
            Style::Classic {
                url,
                url_is_permanent: true,
            }
            | Style::Alternative {
                url,
                url_is_permanent: true,
            } => url.as_deref(),
            Style::Info { url } => url.as_deref(),
            _ => None,
        }
    }
}

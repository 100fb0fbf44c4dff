//! Reconstructs visual nesting from a flat integer hierarchy level.
//!
//! Each tag's prefix is chosen from the hierarchy levels of its immediate
//! predecessor, itself, and immediate successor in timestamp order. This
//! is a best-effort visualization: the hierarchy field is not guaranteed
//! to form a well-formed tree, so unmatched level triples log an error
//! instead of failing the render.

use tracing::error;

/// U+2800 braille blank; keeps its width in chat clients that collapse
/// ordinary spaces.
const INDENT_GLYPH: &str = "\u{2800}";

/// Full prefix for one tag: indentation, branch marks, and a trailing
/// space after multi-glyph marks. The virtual predecessor of the first
/// tag takes the tag's own level; the virtual successor of the last tag
/// takes level -1.
pub fn prefix(prev: i64, curr: i64, next: i64) -> String {
    let indent = (curr - (curr - prev).max(0)).max(0) as usize;
    let mut pre = INDENT_GLYPH.repeat(indent);
    pre.push_str(&marks(prev, curr, next));
    if pre.chars().count() > 1 {
        pre.push(' ');
    }
    pre
}

fn marks(prev: i64, curr: i64, next: i64) -> String {
    if curr == prev && prev <= next {
        // sibling with more to come
        "├".into()
    } else if prev == curr {
        // last sibling at this level
        "└".into()
    } else if prev > curr && curr == next {
        "├".into()
    } else if prev > curr {
        "└".into()
    } else if curr == 1 && curr - prev == 1 && curr == next {
        "└├".into()
    } else if prev < curr && curr == next {
        // opening a deeper run: join dashes sized to the level jump
        format!("└{}┬", "─".repeat((curr - prev - 1) as usize))
    } else if curr == 1 && prev == 0 && next != 1 {
        "└└".into()
    } else if prev < curr {
        format!("{}─", "─".repeat((curr - prev) as usize))
    } else {
        // every ordering of prev/curr/next is matched above; log rather
        // than panic if a triple ever slips through
        error!("unhandled hierarchy case: ({prev}, {curr}, {next})");
        String::new()
    }
}

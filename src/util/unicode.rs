use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Display width in terminal cells. Tabs count as 4 cells.
pub fn display_width(s: &str) -> usize {
    s.graphemes(true).map(grapheme_display_width).sum()
}

/// The longest prefix of `s` that fits in `max_cells`, cut on a grapheme boundary.
pub fn take_width(s: &str, max_cells: usize) -> &str {
    let mut width = 0;
    let mut end = 0;
    for (i, grapheme) in s.grapheme_indices(true) {
        let gw = grapheme_display_width(grapheme);
        if width + gw > max_cells {
            break;
        }
        width += gw;
        end = i + grapheme.len();
    }
    &s[..end]
}

/// Right-pad with spaces to `cells` display width. Longer strings are returned as-is.
pub fn pad_to_width(s: &str, cells: usize) -> String {
    let w = display_width(s);
    if w >= cells {
        return s.to_string();
    }
    format!("{}{}", s, " ".repeat(cells - w))
}

fn grapheme_display_width(g: &str) -> usize {
    if g == "\t" {
        return 4;
    }
    UnicodeWidthStr::width(g)
}

pub mod annotation;

pub use annotation::{
    Segment, SegmentKind, extract_mentions, extract_tags, render_highlighted_text,
};

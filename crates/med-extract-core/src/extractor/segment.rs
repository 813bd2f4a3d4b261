//! Plan item segmentation.
//!
//! Clinical notes often enumerate prescriptions ("1. risperidona ... 2. ...").
//! Each marker is `digits "." whitespace` at the start of text or after
//! whitespace; a body runs until the next marker or the end of text.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use crate::models::PlanItem;

static ITEM_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|\s)(\d+)\.\s").unwrap());

/// Split normalized text into plan items.
///
/// Markers are scanned sequentially, each search resuming at the previous
/// body's start, so a marker immediately following another marker is swallowed
/// into that body rather than opening an empty item. Without any marker the
/// whole text is one unnumbered item at offset 0.
pub fn segment(text: &str) -> Vec<PlanItem> {
    let mut items: Vec<PlanItem> = Vec::new();
    let mut pos = 0;

    while let Some(caps) = ITEM_MARKER.captures_at(text, pos) {
        let whole = caps.get(0).expect("match always has group 0");
        let number = caps[1].parse::<u32>().ok();

        // The previous body ends at the whitespace opening this marker.
        if let Some(prev) = items.last_mut() {
            prev.end = whole.start();
            prev.text = text[prev.start..prev.end].to_string();
        }

        let start = whole.end();
        items.push(PlanItem {
            number,
            text: text[start..].to_string(),
            start,
            end: text.len(),
        });
        pos = start;
    }

    if items.is_empty() {
        return vec![PlanItem {
            number: None,
            text: text.to_string(),
            start: 0,
            end: text.len(),
        }];
    }

    trace!(items = items.len(), "segmented numbered plan items");
    items
}

//! Selection to annotation geometry
//!
//! Converts the screen-space rectangles of a text selection into
//! page-relative annotation rects. The browser state is captured in a
//! [`SelectionSnapshot`] by the caller so the mapping stays pure.

use std::collections::HashMap;

use super::types::{Annotation, AnnotationType, Rect};

/// A rectangle in screen coordinates (CSS pixels)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ScreenRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn center(&self) -> (f64, f64) {
        (self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    /// Zero-area or garbage fragments produced by the browser
    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }

    /// Edge-inclusive point containment
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x <= self.right() && y >= self.top && y <= self.bottom()
    }
}

/// Rendered bounding box of one page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    pub page_index: u32,
    pub bounds: ScreenRect,
}

impl PageLayout {
    pub fn new(page_index: u32, bounds: ScreenRect) -> Self {
        Self { page_index, bounds }
    }
}

/// The live selection captured at pointer release
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionSnapshot {
    /// Client rects of the selected range, in enumeration order
    pub rects: Vec<ScreenRect>,
    /// True when the selection has zero length
    pub collapsed: bool,
}

impl SelectionSnapshot {
    pub fn new(rects: Vec<ScreenRect>) -> Self {
        Self {
            rects,
            collapsed: false,
        }
    }

    pub fn collapsed() -> Self {
        Self {
            rects: Vec::new(),
            collapsed: true,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed || self.rects.is_empty()
    }
}

/// Map a selection onto the pages it covers.
///
/// Produces one annotation per page that claims at least one rect, in the
/// order the pages first appear in the selection. Returns an empty list when
/// nothing survives filtering.
pub fn map_selection(
    selection: &SelectionSnapshot,
    pages: &[PageLayout],
    annotation_type: AnnotationType,
) -> Vec<Annotation> {
    if selection.is_collapsed() {
        return Vec::new();
    }

    let mut order: Vec<u32> = Vec::new();
    let mut groups: HashMap<u32, Vec<Rect>> = HashMap::new();

    for rect in selection.rects.iter().filter(|r| !r.is_degenerate()) {
        let Some(page) = page_for(rect, pages) else {
            tracing::trace!("Dropping selection rect outside any page: {:?}", rect);
            continue;
        };

        let Some(relative) = to_page_percent(rect, &page.bounds) else {
            continue;
        };

        groups
            .entry(page.page_index)
            .or_insert_with(|| {
                order.push(page.page_index);
                Vec::new()
            })
            .push(relative);
    }

    order
        .into_iter()
        .filter_map(|page_index| {
            let rects = groups.remove(&page_index)?;
            Some(Annotation::new(annotation_type, page_index, rects))
        })
        .collect()
}

/// First page (in layout order) whose box contains the rect's center
fn page_for<'a>(rect: &ScreenRect, pages: &'a [PageLayout]) -> Option<&'a PageLayout> {
    let (cx, cy) = rect.center();
    pages
        .iter()
        .filter(|p| !p.bounds.is_degenerate())
        .find(|p| p.bounds.contains(cx, cy))
}

/// Convert to percentages of the page box, clipped to the page
fn to_page_percent(rect: &ScreenRect, page: &ScreenRect) -> Option<Rect> {
    let left = rect.left.max(page.left);
    let top = rect.top.max(page.top);
    let right = rect.right().min(page.right());
    let bottom = rect.bottom().min(page.bottom());

    if right <= left || bottom <= top {
        return None;
    }

    let x = (left - page.left) / page.width * 100.0;
    let y = (top - page.top) / page.height * 100.0;
    let width = (right - left) / page.width * 100.0;
    let height = (bottom - top) / page.height * 100.0;

    Some(Rect::new(x, y, width, height))
}

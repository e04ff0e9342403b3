//! Greedy row packing for tiled members.

use crate::geometry::Point;
use crate::graph::NodeId;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackedItem {
    pub node: NodeId,
    pub width: f64,
    pub height: f64,
}

impl PackedItem {
    fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// Rows of packed members and the running extent of the block.
#[derive(Debug, Clone, PartialEq)]
pub struct Organization {
    pub rows: Vec<Vec<PackedItem>>,
    pub row_width: Vec<f64>,
    pub row_height: Vec<f64>,
    pub width: f64,
    pub height: f64,
    pub vertical_padding: f64,
    pub horizontal_padding: f64,
}

impl Organization {
    fn new(min_width: f64, vertical_padding: f64, horizontal_padding: f64) -> Self {
        Self {
            rows: Vec::new(),
            row_width: Vec::new(),
            row_height: Vec::new(),
            width: 0.0,
            // The minimum height is taken to equal the minimum width.
            height: min_width,
            vertical_padding,
            horizontal_padding,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(Vec::is_empty)
    }

    /// Index of the narrowest row, the first one on ties.
    pub fn shortest_row_index(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, w) in self.row_width.iter().enumerate() {
            if best.is_none_or(|b| *w < self.row_width[b]) {
                best = Some(i);
            }
        }
        best
    }

    /// Index of the widest row, the first one on ties.
    pub fn longest_row_index(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, w) in self.row_width.iter().enumerate() {
            if best.is_none_or(|b| *w > self.row_width[b]) {
                best = Some(i);
            }
        }
        best
    }

    /// Appends `item` to row `row`, opening a new row when `row == rows.len()`.
    pub fn insert_node_to_row(&mut self, item: PackedItem, row: usize, min_width: f64) {
        if row == self.rows.len() {
            self.rows.push(Vec::new());
            self.row_width.push(min_width);
            self.row_height.push(0.0);
        }

        let mut w = self.row_width[row] + item.width;
        if !self.rows[row].is_empty() {
            w += self.horizontal_padding;
        }
        self.row_width[row] = w;
        if self.width < w {
            self.width = w;
        }

        let mut h = item.height;
        if row > 0 {
            h += self.vertical_padding;
        }
        if h > self.row_height[row] {
            self.height += h - self.row_height[row];
            self.row_height[row] = h;
        }
        self.rows[row].push(item);
    }

    /// Whether extending the shortest row keeps the block closer to square than opening a
    /// new row would. Ratios are compared as `max/min`, so both sides are at least 1.
    pub fn can_add_horizontal(&self, extra_width: f64, extra_height: f64) -> bool {
        let Some(sri) = self.shortest_row_index() else {
            return true;
        };
        let min = self.row_width[sri];
        if min + self.horizontal_padding + extra_width <= self.width {
            return true;
        }

        let mut h_diff = 0.0;
        if self.row_height[sri] < extra_height && sri > 0 {
            h_diff = extra_height + self.vertical_padding - self.row_height[sri];
        }
        let add_to_row_ratio = if self.width - min >= extra_width + self.horizontal_padding {
            (self.height + h_diff) / (min + extra_width + self.horizontal_padding)
        } else {
            (self.height + h_diff) / self.width
        };

        let h_diff = extra_height + self.vertical_padding;
        let add_new_row_ratio = if self.width < extra_width {
            (self.height + h_diff) / extra_width
        } else {
            (self.height + h_diff) / self.width
        };

        squareness(add_to_row_ratio) < squareness(add_new_row_ratio)
    }

    /// Moves the last member of the widest row to the last row while that still fits inside
    /// the current width, shrinking the block.
    pub fn shift_to_last_row(&mut self) {
        loop {
            let (Some(longest), Some(last)) = (self.longest_row_index(), self.rows.len().checked_sub(1))
            else {
                return;
            };
            if longest == last {
                return;
            }
            let Some(&item) = self.rows[longest].last() else {
                return;
            };
            let diff = item.width + self.horizontal_padding;
            if self.width - self.row_width[last] <= diff {
                return;
            }

            self.rows[longest].pop();
            self.rows[last].push(item);
            self.row_width[longest] -= diff;
            self.row_width[last] += diff;
            if let Some(widest) = self.longest_row_index() {
                self.width = self.row_width[widest];
            }

            let mut max_height = self.rows[longest]
                .iter()
                .map(|n| n.height)
                .fold(0.0, f64::max);
            if longest > 0 {
                max_height += self.vertical_padding;
            }
            let prev_total = self.row_height[longest] + self.row_height[last];
            self.row_height[longest] = max_height;
            if self.row_height[last] < item.height + self.vertical_padding {
                self.row_height[last] = item.height + self.vertical_padding;
            }
            let final_total = self.row_height[longest] + self.row_height[last];
            self.height += final_total - prev_total;
        }
    }

    /// Top-left corner of every member when the block's top-left sits at `(x, y)` inside the
    /// given margins, row by row.
    pub fn adjust_locations(&self, x: f64, y: f64, h_margin: f64, v_margin: f64) -> Vec<(NodeId, Point)> {
        let left = x + h_margin;
        let mut y = y + v_margin;
        let mut out = Vec::with_capacity(self.len());
        for row in &self.rows {
            let mut x = left;
            let mut max_height: f64 = 0.0;
            for item in row {
                out.push((item.node, Point::new(x, y)));
                x += item.width + self.horizontal_padding;
                max_height = max_height.max(item.height);
            }
            y += max_height + self.vertical_padding;
        }
        out
    }
}

fn squareness(ratio: f64) -> f64 {
    if ratio < 1.0 { 1.0 / ratio } else { ratio }
}

/// Packs `items` into rows, largest area first, keeping the block near square.
pub fn tile_nodes(
    mut items: Vec<PackedItem>,
    min_width: f64,
    vertical_padding: f64,
    horizontal_padding: f64,
) -> Organization {
    let mut org = Organization::new(min_width, vertical_padding, horizontal_padding);
    items.sort_by(|a, b| b.area().total_cmp(&a.area()));

    for item in items {
        let row = if org.rows.is_empty() {
            0
        } else if org.can_add_horizontal(item.width, item.height) {
            org.shortest_row_index().unwrap_or(0)
        } else {
            org.rows.len()
        };
        org.insert_node_to_row(item, row, min_width);
        org.shift_to_last_row();
    }
    org
}

//! Partitioning of a calendar grid image into cell rectangles.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Pixel rectangle of one grid cell, `right` and `bottom` exclusive.
pub struct CellBox {
    /// Column index.
    pub col: u32,
    /// Row index.
    pub row: u32,
    /// Left edge.
    pub left: u32,
    /// Top edge.
    pub top: u32,
    /// Right edge.
    pub right: u32,
    /// Bottom edge.
    pub bottom: u32,
}

impl CellBox {
    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }
}

/// Split `total_pixels` into `parts` segments and return the `parts + 1` boundaries.
///
/// Each boundary is rounded on its own from the fractional segment size, so
/// rounding errors do not accumulate across many rows. The last boundary is
/// always `total_pixels`.
#[must_use]
pub fn compute_bounds(total_pixels: u32, parts: u32) -> Vec<u32> {
    let part = f64::from(total_pixels) / f64::from(parts.max(1));
    let mut bounds = Vec::with_capacity(parts as usize + 1);
    bounds.push(0);
    for index in 1..=parts {
        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "boundary lies within [0, total_pixels]"
        )]
        bounds.push((f64::from(index) * part).round_ties_even() as u32);
    }
    if let Some(last) = bounds.last_mut() {
        *last = total_pixels;
    }
    bounds
}

/// Rectangle of cell `(col, row)` grown by `overlap` on every side and clamped
/// to the `width × height` image.
///
/// Returns `None` if the indices are outside the bounds or the clamped
/// rectangle is empty.
#[must_use]
pub fn cell_box(
    col: u32,
    row: u32,
    col_bounds: &[u32],
    row_bounds: &[u32],
    overlap: u32,
    width: u32,
    height: u32,
) -> Option<CellBox> {
    let (col_start, col_end) = segment(col_bounds, col)?;
    let (row_start, row_end) = segment(row_bounds, row)?;

    let left = col_start.saturating_sub(overlap);
    let right = col_end.saturating_add(overlap).min(width);
    let top = row_start.saturating_sub(overlap);
    let bottom = row_end.saturating_add(overlap).min(height);

    (right > left && bottom > top).then_some(CellBox {
        col,
        row,
        left,
        top,
        right,
        bottom,
    })
}

fn segment(bounds: &[u32], index: u32) -> Option<(u32, u32)> {
    let start = usize::try_from(index).ok()?;
    Some((*bounds.get(start)?, *bounds.get(start.checked_add(1)?)?))
}

/// All valid cell boxes of a `cols × rows` grid, columns first.
#[must_use]
pub fn grid_cells(width: u32, height: u32, cols: u32, rows: u32, overlap: u32) -> Vec<CellBox> {
    let col_bounds = compute_bounds(width, cols);
    let row_bounds = compute_bounds(height, rows);
    (0..cols)
        .flat_map(|col| (0..rows).map(move |row| (col, row)))
        .filter_map(|(col, row)| {
            cell_box(col, row, &col_bounds, &row_bounds, overlap, width, height)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_each_boundary_independently() {
        assert_eq!(compute_bounds(10, 3), vec![0, 3, 7, 10]);
        assert_eq!(compute_bounds(100, 4), vec![0, 25, 50, 75, 100]);
    }

    #[test]
    fn zero_parts_yield_only_the_end() {
        assert_eq!(compute_bounds(10, 0), vec![10]);
    }

    #[test]
    fn out_of_range_cell_is_invalid() {
        let bounds = compute_bounds(10, 2);
        assert_eq!(cell_box(2, 0, &bounds, &bounds, 0, 10, 10), None);
    }
}

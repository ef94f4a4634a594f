use muellplan_ocr::grid::grid_cells;
use muellplan_ocr::{cell_box, compute_bounds};

#[test]
fn test_bounds_cover_the_whole_extent() {
    for total in 1..=400 {
        for parts in 1..=total.min(40) {
            let bounds = compute_bounds(total, parts);
            assert_eq!(bounds.len(), parts as usize + 1);
            assert_eq!(bounds.first(), Some(&0));
            assert_eq!(bounds.last(), Some(&total));
            assert!(
                bounds.windows(2).all(|pair| pair[0] < pair[1]),
                "{total}/{parts}: {bounds:?}"
            );
        }
    }
}

#[test]
fn test_calendar_rows_stay_even() {
    let bounds = compute_bounds(1000, 31);
    let heights: Vec<u32> = bounds.windows(2).map(|pair| pair[1] - pair[0]).collect();
    assert!(heights.iter().all(|height| (32..=33).contains(height)), "{heights:?}");
}

#[test]
fn test_cell_boxes_stay_inside_the_image() {
    for (width, height, overlap) in [(60, 124, 0), (60, 124, 4), (7, 31, 9), (600, 31, 100)] {
        let cols = compute_bounds(width, 6);
        let rows = compute_bounds(height, 31);
        for col in 0..6 {
            for row in 0..31 {
                if let Some(cell) = cell_box(col, row, &cols, &rows, overlap, width, height) {
                    assert!(cell.left < cell.right && cell.right <= width);
                    assert!(cell.top < cell.bottom && cell.bottom <= height);
                }
            }
        }
    }
}

#[test]
fn test_overlap_grows_inner_cells() {
    let cols = compute_bounds(60, 6);
    let rows = compute_bounds(124, 31);

    let inner = cell_box(2, 10, &cols, &rows, 4, 60, 124).unwrap();
    assert_eq!((inner.left, inner.right), (16, 34));
    assert_eq!((inner.top, inner.bottom), (36, 48));

    let corner = cell_box(0, 0, &cols, &rows, 4, 60, 124).unwrap();
    assert_eq!((corner.left, corner.top), (0, 0));
    assert_eq!((corner.width(), corner.height()), (14, 8));
}

#[test]
fn test_indices_beyond_the_bounds_are_invalid() {
    let cols = compute_bounds(60, 6);
    let rows = compute_bounds(124, 31);

    assert!(cell_box(6, 0, &cols, &rows, 0, 60, 124).is_none());
    assert!(cell_box(0, 31, &cols, &rows, 0, 60, 124).is_none());
}

#[test]
fn test_grid_cells_are_columns_first() {
    let cells = grid_cells(60, 124, 6, 31, 0);

    assert_eq!(cells.len(), 186);
    assert_eq!((cells[0].col, cells[0].row), (0, 0));
    assert_eq!((cells[1].col, cells[1].row), (0, 1));
    assert_eq!((cells[31].col, cells[31].row), (1, 0));
}

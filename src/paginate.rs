//! Grid Paginator
//!
//! Splits an ordered item list into sheets of `rows * cols` cells, filled
//! row-major from the top-left cell. Items are consumed strictly in order.

/// One occupied cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot<'a, T> {
    /// Position of the item in the input sequence.
    pub index: usize,
    pub row: usize,
    pub col: usize,
    pub item: &'a T,
}

/// One sheet. Only occupied cells are present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet<'a, T> {
    pub number: usize,
    pub slots: Vec<Slot<'a, T>>,
}

pub struct Paginator<'a, T> {
    items: &'a [T],
    rows: usize,
    cols: usize,
    next: usize,
    page: usize,
}

/// Walk `items` sheet by sheet. `rows` and `cols` must be at least 1.
pub fn paginate<T>(items: &[T], rows: usize, cols: usize) -> Paginator<'_, T> {
    Paginator {
        items,
        rows: rows.max(1),
        cols: cols.max(1),
        next: 0,
        page: 0,
    }
}

impl<'a, T> Iterator for Paginator<'a, T> {
    type Item = Sheet<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.items.len() {
            return None;
        }
        let per_page = self.rows * self.cols;
        let end = (self.next + per_page).min(self.items.len());
        let slots = (self.next..end)
            .map(|index| {
                let cell = index - self.next;
                Slot {
                    index,
                    row: cell / self.cols,
                    col: cell % self.cols,
                    item: &self.items[index],
                }
            })
            .collect();
        let sheet = Sheet {
            number: self.page,
            slots,
        };
        self.next = end;
        self.page += 1;
        Some(sheet)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = page_count(self.items.len() - self.next, self.rows * self.cols);
        (remaining, Some(remaining))
    }
}

impl<T> ExactSizeIterator for Paginator<'_, T> {}

/// Sheets needed for `n` items.
pub fn page_count(n: usize, per_page: usize) -> usize {
    n.div_ceil(per_page.max(1))
}

/// (page, row, col) of item `index`.
pub fn placement(index: usize, rows: usize, cols: usize) -> (usize, usize, usize) {
    let cols = cols.max(1);
    let per_page = rows.max(1) * cols;
    let cell = index % per_page;
    (index / per_page, cell / cols, cell % cols)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_items_zero_pages() {
        let items: Vec<u32> = vec![];
        assert_eq!(paginate(&items, 3, 2).count(), 0);
        assert_eq!(page_count(0, 6), 0);
    }

    #[test]
    fn test_page_counts() {
        for n in 0..40usize {
            let items: Vec<usize> = (0..n).collect();
            let sheets: Vec<_> = paginate(&items, 3, 2).collect();
            assert_eq!(sheets.len(), n.div_ceil(6));
            if let Some(last) = sheets.last() {
                let expected = if n % 6 == 0 { 6 } else { n % 6 };
                assert_eq!(last.slots.len(), expected);
            }
        }
    }

    #[test]
    fn test_every_item_lands_where_placement_says() {
        let items: Vec<usize> = (0..17).collect();
        for sheet in paginate(&items, 3, 2) {
            for slot in &sheet.slots {
                assert_eq!(*slot.item, slot.index);
                assert_eq!(placement(slot.index, 3, 2), (sheet.number, slot.row, slot.col));
                assert_eq!(slot.row, (slot.index % 6) / 2);
                assert_eq!(slot.col, (slot.index % 6) % 2);
            }
        }
    }

    #[test]
    fn test_size_hint_tracks_remaining() {
        let items = [1, 2, 3, 4, 5, 6, 7];
        let mut pages = paginate(&items, 3, 2);
        assert_eq!(pages.len(), 2);
        pages.next();
        assert_eq!(pages.len(), 1);
    }
}

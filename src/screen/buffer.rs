use crate::geometry::{Rect, Size};
use crate::width::char_width;

/// A single terminal cell. The trailing half of a wide character is stored
/// as a continuation cell with `width == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub width: u8,
}

impl Cell {
    pub const BLANK: Cell = Cell { ch: ' ', width: 1 };
    const CONTINUATION: Cell = Cell { ch: ' ', width: 0 };

    pub fn is_continuation(&self) -> bool {
        self.width == 0
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::BLANK
    }
}

/// Cell that changed since the previous flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellChange {
    pub x: u16,
    pub y: u16,
    pub cell: Cell,
}

/// Double-buffered cell grid. Writes land in the back buffer; `flush`
/// reports what differs from the last flushed frame.
#[derive(Debug, Clone)]
pub struct CellBuffer {
    size: Size,
    back: Vec<Cell>,
    front: Vec<Cell>,
    force_full: bool,
}

impl CellBuffer {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            back: vec![Cell::BLANK; size.area()],
            front: vec![Cell::BLANK; size.area()],
            force_full: true,
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn resize(&mut self, size: Size) {
        if size == self.size {
            return;
        }
        *self = Self::new(size);
    }

    pub fn clear(&mut self) {
        self.back.fill(Cell::BLANK);
        self.force_full = true;
    }

    /// Place `ch` at `(x, y)`. Returns the cells consumed, zero when the
    /// position is off-grid or the character has no width.
    pub fn set(&mut self, x: u16, y: u16, ch: char) -> u16 {
        let Some(idx) = self.index(x, y) else {
            return 0;
        };
        let width = char_width(ch);
        match width {
            0 => 0,
            1 => {
                self.detach(idx);
                self.back[idx] = Cell { ch, width: 1 };
                1
            }
            _ => {
                self.detach(idx);
                if x.saturating_add(1) >= self.size.width {
                    self.back[idx] = Cell::BLANK;
                    return 1;
                }
                self.detach(idx + 1);
                self.back[idx] = Cell { ch, width: 2 };
                self.back[idx + 1] = Cell::CONTINUATION;
                2
            }
        }
    }

    pub fn cell(&self, x: u16, y: u16) -> Option<Cell> {
        self.index(x, y).map(|idx| self.back[idx])
    }

    pub fn flush(&mut self) -> Vec<CellChange> {
        let width = self.size.width.max(1) as usize;
        let mut changes = Vec::new();
        for (idx, (back, front)) in self.back.iter().zip(self.front.iter_mut()).enumerate() {
            if !self.force_full && back == front {
                continue;
            }
            *front = *back;
            if back.is_continuation() {
                continue;
            }
            changes.push(CellChange {
                x: (idx % width) as u16,
                y: (idx / width) as u16,
                cell: *back,
            });
        }
        self.force_full = false;
        changes
    }

    /// Back buffer rendered as one string per row.
    pub fn contents(&self) -> Vec<String> {
        if self.size.width == 0 {
            return vec![String::new(); self.size.height as usize];
        }
        self.back
            .chunks(self.size.width as usize)
            .map(|row| {
                row.iter()
                    .filter(|cell| !cell.is_continuation())
                    .map(|cell| cell.ch)
                    .collect()
            })
            .collect()
    }

    /// Blank the other half of a wide character occupying `idx`, so an
    /// overwrite never leaves a lead or continuation cell without its partner.
    fn detach(&mut self, idx: usize) {
        let cell = self.back[idx];
        if cell.is_continuation() {
            // A continuation cell is never in column zero.
            self.back[idx - 1] = Cell::BLANK;
        } else if cell.width == 2 {
            self.back[idx + 1] = Cell::BLANK;
        }
    }

    fn index(&self, x: u16, y: u16) -> Option<usize> {
        if !Rect::from_size(self.size).contains(x, y) {
            return None;
        }
        Some(y as usize * self.size.width as usize + x as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_flush_is_full_then_incremental() {
        let mut buffer = CellBuffer::new(Size::new(3, 2));
        assert_eq!(buffer.flush().len(), 6);
        assert!(buffer.flush().is_empty());

        buffer.set(1, 1, 'x');
        let changes = buffer.flush();
        assert_eq!(
            changes,
            vec![CellChange {
                x: 1,
                y: 1,
                cell: Cell { ch: 'x', width: 1 }
            }]
        );
    }

    #[test]
    fn writes_outside_the_buffer_are_ignored() {
        let mut buffer = CellBuffer::new(Size::new(3, 2));
        buffer.flush();
        assert_eq!(buffer.set(3, 0, 'x'), 0);
        assert_eq!(buffer.set(0, 2, 'x'), 0);
        assert_eq!(buffer.cell(3, 0), None);
        assert!(buffer.flush().is_empty());
    }

    #[test]
    fn clear_forces_full_repaint() {
        let mut buffer = CellBuffer::new(Size::new(2, 2));
        buffer.flush();
        buffer.clear();
        assert_eq!(buffer.flush().len(), 4);
    }

    #[test]
    fn wide_char_occupies_continuation() {
        let mut buffer = CellBuffer::new(Size::new(4, 1));
        assert_eq!(buffer.set(0, 0, '界'), 2);
        assert!(buffer.cell(1, 0).unwrap().is_continuation());
        assert_eq!(buffer.contents(), vec!["界  ".to_string()]);
        let changes = buffer.flush();
        assert_eq!(changes.len(), 3);
    }

    #[test]
    fn wide_char_in_last_column_is_blanked() {
        let mut buffer = CellBuffer::new(Size::new(2, 1));
        assert_eq!(buffer.set(1, 0, '界'), 1);
        assert_eq!(buffer.cell(1, 0), Some(Cell::BLANK));
    }

    #[test]
    fn narrow_over_trailing_half_blanks_lead() {
        let mut buffer = CellBuffer::new(Size::new(4, 1));
        buffer.set(0, 0, '界');
        buffer.set(1, 0, 'x');
        assert_eq!(buffer.contents(), vec![" x  ".to_string()]);
        assert_eq!(buffer.cell(0, 0), Some(Cell::BLANK));
    }

    #[test]
    fn narrow_over_lead_blanks_continuation() {
        let mut buffer = CellBuffer::new(Size::new(4, 1));
        buffer.set(0, 0, '界');
        buffer.flush();
        buffer.set(0, 0, 'a');
        assert_eq!(buffer.contents(), vec!["a   ".to_string()]);
        assert_eq!(buffer.cell(1, 0), Some(Cell::BLANK));

        let changes = buffer.flush();
        assert_eq!(
            changes,
            vec![
                CellChange {
                    x: 0,
                    y: 0,
                    cell: Cell { ch: 'a', width: 1 }
                },
                CellChange {
                    x: 1,
                    y: 0,
                    cell: Cell::BLANK
                },
            ]
        );
    }

    #[test]
    fn wide_over_neighbouring_wide_blanks_its_tail() {
        let mut buffer = CellBuffer::new(Size::new(5, 1));
        buffer.set(1, 0, '界');
        buffer.set(0, 0, '世');
        assert_eq!(buffer.contents(), vec!["世   ".to_string()]);
        assert_eq!(buffer.cell(2, 0), Some(Cell::BLANK));
        assert!(buffer.cell(1, 0).unwrap().is_continuation());
    }

    #[test]
    fn wide_in_last_column_blanks_overwritten_continuation() {
        let mut buffer = CellBuffer::new(Size::new(3, 1));
        buffer.set(1, 0, '界');
        buffer.set(2, 0, '世');
        assert_eq!(buffer.cell(1, 0), Some(Cell::BLANK));
        assert_eq!(buffer.cell(2, 0), Some(Cell::BLANK));
        assert_eq!(buffer.contents(), vec!["   ".to_string()]);
    }

    #[test]
    fn off_grid_writes_are_ignored() {
        let mut buffer = CellBuffer::new(Size::new(2, 2));
        assert_eq!(buffer.set(2, 0, 'x'), 0);
        assert_eq!(buffer.set(0, 2, 'x'), 0);
        assert!(buffer.cell(2, 0).is_none());
    }

    #[test]
    fn resize_resets_contents() {
        let mut buffer = CellBuffer::new(Size::new(2, 1));
        buffer.set(0, 0, 'x');
        buffer.resize(Size::new(3, 2));
        assert_eq!(buffer.size(), Size::new(3, 2));
        assert_eq!(buffer.contents(), vec!["   ".to_string(), "   ".to_string()]);
    }
}

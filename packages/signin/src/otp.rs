//! Six-cell OTP input buffer.

pub const OTP_LEN: usize = 6;

/// Fixed-length buffer of single-digit cells backing the OTP inputs.
///
/// Each cell holds one decimal digit or is empty. The candidate code
/// exists only once all six cells are populated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OtpBuffer {
    cells: [Option<char>; OTP_LEN],
}

impl OtpBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one cell from raw input. Accepts a single digit or an empty
    /// string (clears the cell); anything else is ignored.
    pub fn set_digit(&mut self, index: usize, value: &str) {
        if index >= OTP_LEN {
            return;
        }
        if value.is_empty() {
            self.cells[index] = None;
            return;
        }
        let mut chars = value.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c.is_ascii_digit() {
                self.cells[index] = Some(c);
            }
        }
    }

    /// Replace the whole buffer from pasted text. Only text that trims to
    /// exactly six digits is accepted; anything else leaves the buffer
    /// unchanged. Returns whether the paste was applied.
    pub fn paste(&mut self, text: &str) -> bool {
        let trimmed = text.trim();
        if trimmed.len() != OTP_LEN || !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
        for (cell, c) in self.cells.iter_mut().zip(trimmed.chars()) {
            *cell = Some(c);
        }
        true
    }

    pub fn is_complete(&self) -> bool {
        self.cells.iter().all(|c| c.is_some())
    }

    /// The candidate code, present only when all six cells are populated.
    pub fn code(&self) -> Option<String> {
        if !self.is_complete() {
            return None;
        }
        Some(self.cells.iter().flatten().collect())
    }

    pub fn clear(&mut self) {
        self.cells = [None; OTP_LEN];
    }

    /// Current cell contents, for rendering.
    pub fn cells(&self) -> &[Option<char>; OTP_LEN] {
        &self.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_digit_accepts_single_digits() {
        let mut buf = OtpBuffer::new();
        buf.set_digit(0, "1");
        buf.set_digit(5, "9");
        assert_eq!(buf.cells()[0], Some('1'));
        assert_eq!(buf.cells()[5], Some('9'));
        assert!(!buf.is_complete());
    }

    #[test]
    fn test_set_digit_ignores_non_digit_input() {
        let mut buf = OtpBuffer::new();
        buf.set_digit(0, "a");
        buf.set_digit(1, "12");
        buf.set_digit(2, " ");
        assert_eq!(*buf.cells(), [None; OTP_LEN]);
    }

    #[test]
    fn test_set_digit_empty_clears_cell() {
        let mut buf = OtpBuffer::new();
        buf.set_digit(3, "7");
        buf.set_digit(3, "");
        assert_eq!(buf.cells()[3], None);
    }

    #[test]
    fn test_set_digit_out_of_range_is_ignored() {
        let mut buf = OtpBuffer::new();
        buf.set_digit(6, "1");
        assert_eq!(*buf.cells(), [None; OTP_LEN]);
    }

    #[test]
    fn test_paste_requires_exactly_six_digits() {
        let mut buf = OtpBuffer::new();
        buf.set_digit(0, "5");

        assert!(!buf.paste("12345"));
        assert!(!buf.paste("1234567"));
        assert!(!buf.paste("12a456"));
        assert_eq!(buf.cells()[0], Some('5'), "failed paste must not touch the buffer");

        assert!(buf.paste("123456"));
        assert_eq!(buf.code().as_deref(), Some("123456"));
    }

    #[test]
    fn test_paste_trims_surrounding_whitespace() {
        let mut buf = OtpBuffer::new();
        assert!(buf.paste("  654321\n"));
        assert_eq!(buf.code().as_deref(), Some("654321"));
    }

    #[test]
    fn test_code_requires_complete_buffer() {
        let mut buf = OtpBuffer::new();
        for i in 0..5 {
            buf.set_digit(i, "1");
        }
        assert_eq!(buf.code(), None);
        buf.set_digit(5, "1");
        assert_eq!(buf.code().as_deref(), Some("111111"));
    }

    #[test]
    fn test_clear_empties_all_cells() {
        let mut buf = OtpBuffer::new();
        assert!(buf.paste("123456"));
        buf.clear();
        assert_eq!(*buf.cells(), [None; OTP_LEN]);
        assert!(!buf.is_complete());
    }
}

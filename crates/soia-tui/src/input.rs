//! Multi-line message editor
//!
//! The cursor is a char index into `text`. Layout is a hard wrap at the box
//! width so the cursor position can be computed without asking ratatui.

/// Most rows the input box grows to before it starts scrolling.
pub const MAX_INPUT_ROWS: u16 = 6;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

#[derive(Debug, Default, Clone)]
pub struct ChatInput {
    text: String,
    cursor: usize,
}

impl ChatInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.text, self.cursor);
        self.text.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn insert_newline(&mut self) {
        self.insert_char('\n');
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.char_count() {
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.char_count());
    }

    /// Move to the start of the current line.
    pub fn move_home(&mut self) {
        let (line_start, _) = self.current_line_bounds();
        self.cursor = line_start;
    }

    /// Move to the end of the current line.
    pub fn move_end(&mut self) {
        let (_, line_end) = self.current_line_bounds();
        self.cursor = line_end;
    }

    fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    fn current_line_bounds(&self) -> (usize, usize) {
        let chars: Vec<char> = self.text.chars().collect();
        let start = chars[..self.cursor]
            .iter()
            .rposition(|&c| c == '\n')
            .map(|i| i + 1)
            .unwrap_or(0);
        let end = chars[self.cursor..]
            .iter()
            .position(|&c| c == '\n')
            .map(|i| self.cursor + i)
            .unwrap_or(chars.len());
        (start, end)
    }

    /// The text broken into display rows for a box `width` columns wide.
    ///
    /// A logical line of `n` chars takes `n / width + 1` rows, so a line that
    /// exactly fills its rows still has room for the cursor after it.
    pub fn visual_lines(&self, width: u16) -> Vec<String> {
        let width = width.max(1) as usize;
        let mut rows = Vec::new();

        for line in self.text.split('\n') {
            let chars: Vec<char> = line.chars().collect();
            let row_count = chars.len() / width + 1;
            for row in 0..row_count {
                let start = row * width;
                let end = (start + width).min(chars.len());
                rows.push(chars[start..end].iter().collect());
            }
        }

        rows
    }

    /// Cursor position as (row, column) within [`Self::visual_lines`].
    pub fn cursor_visual(&self, width: u16) -> (u16, u16) {
        let width = width.max(1) as usize;
        let mut row = 0;

        let before: String = self.text.chars().take(self.cursor).collect();
        let mut lines = before.split('\n').peekable();
        while let Some(line) = lines.next() {
            let len = line.chars().count();
            if lines.peek().is_some() {
                row += len / width + 1;
            } else {
                row += len / width;
                return (row as u16, (len % width) as u16);
            }
        }

        (row as u16, 0)
    }

    /// Rows the input box needs, between 1 and [`MAX_INPUT_ROWS`].
    pub fn height(&self, width: u16) -> u16 {
        (self.visual_lines(width).len() as u16).clamp(1, MAX_INPUT_ROWS)
    }
}

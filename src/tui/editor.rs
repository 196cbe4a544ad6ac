//! Multi-line text buffer behind the entry editor.
//!
//! The cursor is kept as (row, column) with the column counted in chars, so multi-byte text such
//! as `Mochilão` moves one glyph per key press.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TextBuffer {
    lines: Vec<String>,
    row: usize,
    col: usize,
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self {
            lines: vec![String::new()],
            row: 0,
            col: 0,
        }
    }
}

fn char_len(line: &str) -> usize {
    line.chars().count()
}

fn byte_index(line: &str, col: usize) -> usize {
    line.char_indices()
        .nth(col)
        .map_or(line.len(), |(idx, _)| idx)
}

impl TextBuffer {
    /// Loads `text` with the cursor at the very end.
    pub(crate) fn from_text(text: &str) -> Self {
        let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();
        if lines.is_empty() {
            lines.push(String::new());
        }
        let row = lines.len() - 1;
        let col = char_len(&lines[row]);
        Self { lines, row, col }
    }

    pub(crate) fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub(crate) fn lines(&self) -> &[String] {
        &self.lines
    }

    pub(crate) fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    pub(crate) fn insert_char(&mut self, ch: char) {
        if ch == '\n' {
            self.newline();
            return;
        }
        let line = &mut self.lines[self.row];
        let at = byte_index(line, self.col);
        line.insert(at, ch);
        self.col += 1;
    }

    pub(crate) fn insert_str(&mut self, text: &str) {
        for ch in text.chars() {
            self.insert_char(ch);
        }
    }

    fn newline(&mut self) {
        let line = &mut self.lines[self.row];
        let at = byte_index(line, self.col);
        let rest = line.split_off(at);
        self.row += 1;
        self.col = 0;
        self.lines.insert(self.row, rest);
    }

    fn backspace(&mut self) -> bool {
        if self.col > 0 {
            let line = &mut self.lines[self.row];
            let start = byte_index(line, self.col - 1);
            let end = byte_index(line, self.col);
            line.replace_range(start..end, "");
            self.col -= 1;
            return true;
        }
        if self.row == 0 {
            return false;
        }
        let current = self.lines.remove(self.row);
        self.row -= 1;
        self.col = char_len(&self.lines[self.row]);
        self.lines[self.row].push_str(&current);
        true
    }

    fn delete(&mut self) -> bool {
        let len = char_len(&self.lines[self.row]);
        if self.col < len {
            let line = &mut self.lines[self.row];
            let start = byte_index(line, self.col);
            let end = byte_index(line, self.col + 1);
            line.replace_range(start..end, "");
            return true;
        }
        if self.row + 1 >= self.lines.len() {
            return false;
        }
        let next = self.lines.remove(self.row + 1);
        self.lines[self.row].push_str(&next);
        true
    }

    fn move_left(&mut self) {
        if self.col > 0 {
            self.col -= 1;
        } else if self.row > 0 {
            self.row -= 1;
            self.col = char_len(&self.lines[self.row]);
        }
    }

    fn move_right(&mut self) {
        if self.col < char_len(&self.lines[self.row]) {
            self.col += 1;
        } else if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = 0;
        }
    }

    fn move_vertical(&mut self, down: bool) {
        let target = if down {
            (self.row + 1).min(self.lines.len() - 1)
        } else {
            self.row.saturating_sub(1)
        };
        self.row = target;
        self.col = self.col.min(char_len(&self.lines[self.row]));
    }

    /// Applies an editing key. Returns true when the text changed.
    pub(crate) fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
        {
            return false;
        }
        match key.code {
            KeyCode::Char(ch) => {
                self.insert_char(ch);
                true
            }
            KeyCode::Enter => {
                self.newline();
                true
            }
            KeyCode::Tab => {
                self.insert_str("    ");
                true
            }
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => {
                self.move_left();
                false
            }
            KeyCode::Right => {
                self.move_right();
                false
            }
            KeyCode::Up => {
                self.move_vertical(false);
                false
            }
            KeyCode::Down => {
                self.move_vertical(true);
                false
            }
            KeyCode::Home => {
                self.col = 0;
                false
            }
            KeyCode::End => {
                self.col = char_len(&self.lines[self.row]);
                false
            }
            _ => false,
        }
    }
}

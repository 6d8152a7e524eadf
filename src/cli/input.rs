use crossterm::event::{KeyCode, KeyEvent};

/// Single-line editor. `cursor` counts chars, not bytes.
#[derive(Debug, Default, Clone)]
pub struct LineEdit {
    pub value: String,
    pub cursor: usize,
    pub password: bool,
}

impl LineEdit {
    pub fn masked() -> Self {
        Self {
            password: true,
            ..Self::default()
        }
    }

    pub fn set(&mut self, s: impl Into<String>) {
        self.value = s.into();
        self.cursor = self.value.chars().count();
    }

    fn byte_at(&self, char_idx: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    pub fn push(&mut self, ch: char) {
        let at = self.byte_at(self.cursor);
        self.value.insert(at, ch);
        self.cursor += 1;
    }
    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_at(self.cursor);
            self.value.remove(at);
        }
    }
    pub fn delete(&mut self) {
        if self.cursor < self.value.chars().count() {
            let at = self.byte_at(self.cursor);
            self.value.remove(at);
        }
    }
    pub fn left(&mut self) {
        if self.cursor > 0 { self.cursor -= 1; }
    }
    pub fn right(&mut self) {
        if self.cursor < self.value.chars().count() { self.cursor += 1; }
    }
    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }
    pub fn rendered(&self) -> String {
        if self.password { "*".repeat(self.value.chars().count()) } else { self.value.clone() }
    }
}

#[derive(Debug, Clone)]
pub struct Field {
    pub label: &'static str,
    pub edit: LineEdit,
    /// Picked with Left/Right instead of typed.
    pub choice: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    None,
    Submit,
    Cancel,
    /// Left/Right on a choice field.
    Cycle(i32),
}

/// A stack of labelled fields with one focused at a time.
#[derive(Debug, Clone)]
pub struct Form {
    pub title: &'static str,
    pub fields: Vec<Field>,
    pub focus: usize,
    pub error: Option<String>,
    /// Record being edited; `None` when creating.
    pub editing: Option<i64>,
}

impl Form {
    pub fn new(title: &'static str, labels: &[&'static str]) -> Self {
        Self {
            title,
            fields: labels
                .iter()
                .map(|&label| Field {
                    label,
                    edit: LineEdit::default(),
                    choice: false,
                })
                .collect(),
            focus: 0,
            error: None,
            editing: None,
        }
    }

    pub fn masked(mut self, idx: usize) -> Self {
        if let Some(f) = self.fields.get_mut(idx) {
            f.edit.password = true;
        }
        self
    }

    pub fn choice(mut self, idx: usize) -> Self {
        if let Some(f) = self.fields.get_mut(idx) {
            f.choice = true;
        }
        self
    }

    pub fn editing(mut self, id: i64) -> Self {
        self.editing = Some(id);
        self
    }

    pub fn with_value(mut self, idx: usize, value: impl Into<String>) -> Self {
        self.set(idx, value);
        self
    }

    pub fn set(&mut self, idx: usize, value: impl Into<String>) {
        if let Some(f) = self.fields.get_mut(idx) {
            f.edit.set(value);
        }
    }

    pub fn value(&self, idx: usize) -> &str {
        self.fields.get(idx).map(|f| f.edit.value.as_str()).unwrap_or("")
    }

    /// Focus the field whose label matches a field name such as `due_date`.
    pub fn focus_field(&mut self, name: &str) {
        let name = name.replace('_', " ");
        if let Some(i) = self.fields.iter().position(|f| f.label.eq_ignore_ascii_case(&name)) {
            self.focus = i;
        }
    }

    pub fn handle_key(&mut self, k: KeyEvent) -> FormAction {
        let n = self.fields.len();
        if n == 0 {
            return FormAction::None;
        }
        let choice = self.fields[self.focus].choice;
        match k.code {
            KeyCode::Enter => return FormAction::Submit,
            KeyCode::Esc => return FormAction::Cancel,
            KeyCode::Tab | KeyCode::Down => self.focus = (self.focus + 1) % n,
            KeyCode::BackTab | KeyCode::Up => self.focus = (self.focus + n - 1) % n,
            KeyCode::Left if choice => return FormAction::Cycle(-1),
            KeyCode::Right if choice => return FormAction::Cycle(1),
            _ if choice => {}
            KeyCode::Left => self.fields[self.focus].edit.left(),
            KeyCode::Right => self.fields[self.focus].edit.right(),
            KeyCode::Backspace => self.fields[self.focus].edit.backspace(),
            KeyCode::Delete => self.fields[self.focus].edit.delete(),
            KeyCode::Char(c) => self.fields[self.focus].edit.push(c),
            _ => {}
        }
        FormAction::None
    }
}

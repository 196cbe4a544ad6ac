//! Overlays that take the keyboard until they are submitted or cancelled.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::file_picker::{FilePicker, PickerOutcome};

/// Single-line input with a char-indexed cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct LineInput {
    value: String,
    cursor: usize,
}

impl LineInput {
    pub(crate) fn with_value(value: &str) -> Self {
        Self {
            value: value.to_string(),
            cursor: value.chars().count(),
        }
    }

    pub(crate) fn value(&self) -> &str {
        &self.value
    }

    pub(crate) fn cursor(&self) -> usize {
        self.cursor
    }

    fn byte_at(&self, col: usize) -> usize {
        self.value
            .char_indices()
            .nth(col)
            .map_or(self.value.len(), |(idx, _)| idx)
    }

    fn handle(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return;
        }
        match key.code {
            KeyCode::Char(ch) => {
                let at = self.byte_at(self.cursor);
                self.value.insert(at, ch);
                self.cursor += 1;
            }
            KeyCode::Backspace if self.cursor > 0 => {
                let start = self.byte_at(self.cursor - 1);
                let end = self.byte_at(self.cursor);
                self.value.replace_range(start..end, "");
                self.cursor -= 1;
            }
            KeyCode::Delete if self.cursor < self.value.chars().count() => {
                let start = self.byte_at(self.cursor);
                let end = self.byte_at(self.cursor + 1);
                self.value.replace_range(start..end, "");
            }
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.value.chars().count()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.value.chars().count(),
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PromptAction {
    NewDiary,
    RenameDiary(i64),
    RenameEntry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConfirmAction {
    DeletePhoto(i64),
    DeleteAllEntries(i64),
    DeleteAllPhotos(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PhotoFormMode {
    Add { diary_id: i64 },
    Edit { photo_id: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FormField {
    pub(crate) label: &'static str,
    pub(crate) input: LineInput,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Modal {
    Prompt {
        title: String,
        input: LineInput,
        action: PromptAction,
    },
    PhotoForm {
        mode: PhotoFormMode,
        fields: Vec<FormField>,
        focused: usize,
        /// Open while browsing for the file to import; keys go to it first.
        picker: Option<FilePicker>,
    },
    Confirm {
        message: String,
        action: ConfirmAction,
    },
    /// Deleting a diary needs its name typed back.
    TypeToConfirm {
        diary_id: i64,
        expected: String,
        input: LineInput,
    },
    About,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Submission {
    Prompt {
        action: PromptAction,
        value: String,
    },
    AddPhoto {
        diary_id: i64,
        path: String,
        name: String,
        caption: String,
    },
    EditPhoto {
        photo_id: i64,
        name: String,
        caption: String,
    },
    Confirmed(ConfirmAction),
    DeleteDiary(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ModalOutcome {
    Pending,
    Cancelled,
    Submitted(Submission),
    Closed,
}

impl Modal {
    pub(crate) fn prompt(title: impl Into<String>, initial: &str, action: PromptAction) -> Self {
        Modal::Prompt {
            title: title.into(),
            input: LineInput::with_value(initial),
            action,
        }
    }

    pub(crate) fn add_photo(diary_id: i64) -> Self {
        Modal::PhotoForm {
            mode: PhotoFormMode::Add { diary_id },
            fields: vec![
                FormField {
                    label: "Path",
                    input: LineInput::default(),
                },
                FormField {
                    label: "Name",
                    input: LineInput::default(),
                },
                FormField {
                    label: "Caption",
                    input: LineInput::default(),
                },
            ],
            focused: 0,
            picker: None,
        }
    }

    pub(crate) fn edit_photo(photo_id: i64, name: &str, caption: Option<&str>) -> Self {
        Modal::PhotoForm {
            mode: PhotoFormMode::Edit { photo_id },
            fields: vec![
                FormField {
                    label: "Name",
                    input: LineInput::with_value(name),
                },
                FormField {
                    label: "Caption",
                    input: LineInput::with_value(caption.unwrap_or_default()),
                },
            ],
            focused: 0,
            picker: None,
        }
    }

    pub(crate) fn delete_diary(diary_id: i64, expected: &str) -> Self {
        Modal::TypeToConfirm {
            diary_id,
            expected: expected.to_string(),
            input: LineInput::default(),
        }
    }

    pub(crate) fn handle_key(&mut self, key: KeyEvent) -> ModalOutcome {
        if let Modal::PhotoForm { fields, picker, .. } = self {
            if let Some(browser) = picker {
                match browser.handle_key(key) {
                    PickerOutcome::Browsing => {}
                    PickerOutcome::Closed => *picker = None,
                    PickerOutcome::Picked(path) => {
                        fill_picked_path(fields, &path);
                        *picker = None;
                    }
                }
                return ModalOutcome::Pending;
            }
        }

        if key.code == KeyCode::Esc {
            return match self {
                Modal::About => ModalOutcome::Closed,
                _ => ModalOutcome::Cancelled,
            };
        }

        match self {
            Modal::About => match key.code {
                KeyCode::Enter | KeyCode::Char('q') | KeyCode::Char('?') => ModalOutcome::Closed,
                _ => ModalOutcome::Pending,
            },
            Modal::Prompt { input, action, .. } => {
                if key.code == KeyCode::Enter {
                    return ModalOutcome::Submitted(Submission::Prompt {
                        action: *action,
                        value: input.value().to_string(),
                    });
                }
                input.handle(key);
                ModalOutcome::Pending
            }
            Modal::PhotoForm {
                mode,
                fields,
                focused,
                picker,
            } => match key.code {
                KeyCode::Char('o')
                    if key.modifiers.contains(KeyModifiers::CONTROL)
                        && matches!(mode, PhotoFormMode::Add { .. }) =>
                {
                    let typed = fields.first().map(|f| f.input.value()).unwrap_or_default();
                    *picker = Some(FilePicker::open(typed));
                    ModalOutcome::Pending
                }
                KeyCode::Tab | KeyCode::Down => {
                    *focused = (*focused + 1) % fields.len();
                    ModalOutcome::Pending
                }
                KeyCode::BackTab | KeyCode::Up => {
                    *focused = (*focused + fields.len() - 1) % fields.len();
                    ModalOutcome::Pending
                }
                KeyCode::Enter => ModalOutcome::Submitted(photo_submission(*mode, fields)),
                _ => {
                    fields[*focused].input.handle(key);
                    ModalOutcome::Pending
                }
            },
            Modal::Confirm { action, .. } => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    ModalOutcome::Submitted(Submission::Confirmed(*action))
                }
                KeyCode::Char('n') | KeyCode::Char('N') => ModalOutcome::Cancelled,
                _ => ModalOutcome::Pending,
            },
            Modal::TypeToConfirm {
                diary_id,
                expected,
                input,
            } => {
                if key.code == KeyCode::Enter {
                    if input.value().trim() == expected.as_str() {
                        return ModalOutcome::Submitted(Submission::DeleteDiary(*diary_id));
                    }
                    return ModalOutcome::Pending;
                }
                input.handle(key);
                ModalOutcome::Pending
            }
        }
    }
}

/// Puts the chosen file in the path field and, when the name is still blank, its stem in the
/// name field.
fn fill_picked_path(fields: &mut [FormField], path: &std::path::Path) {
    if let Some(field) = fields.get_mut(0) {
        field.input = LineInput::with_value(&path.to_string_lossy());
    }
    if let Some(field) = fields.get_mut(1) {
        if field.input.value().trim().is_empty() {
            let stem = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            field.input = LineInput::with_value(&stem);
        }
    }
}

fn photo_submission(mode: PhotoFormMode, fields: &[FormField]) -> Submission {
    let value = |idx: usize| {
        fields
            .get(idx)
            .map(|field| field.input.value().to_string())
            .unwrap_or_default()
    };
    match mode {
        PhotoFormMode::Add { diary_id } => Submission::AddPhoto {
            diary_id,
            path: value(0),
            name: value(1),
            caption: value(2),
        },
        PhotoFormMode::Edit { photo_id } => Submission::EditPhoto {
            photo_id,
            name: value(0),
            caption: value(1),
        },
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use uuid::Uuid;

    use super::{LineInput, Modal, ModalOutcome, PromptAction, Submission};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(modal: &mut Modal, text: &str) {
        for ch in text.chars() {
            assert_eq!(modal.handle_key(key(KeyCode::Char(ch))), ModalOutcome::Pending);
        }
    }

    #[test]
    fn prompt_submits_typed_value() {
        let mut modal = Modal::prompt("New diary", "", PromptAction::NewDiary);
        type_text(&mut modal, "Porto");
        modal.handle_key(key(KeyCode::Backspace));
        assert_eq!(
            modal.handle_key(key(KeyCode::Enter)),
            ModalOutcome::Submitted(Submission::Prompt {
                action: PromptAction::NewDiary,
                value: "Port".to_string(),
            })
        );
    }

    #[test]
    fn escape_cancels_and_about_closes() {
        let mut prompt = Modal::prompt("Rename", "x", PromptAction::RenameEntry);
        assert_eq!(prompt.handle_key(key(KeyCode::Esc)), ModalOutcome::Cancelled);
        let mut about = Modal::About;
        assert_eq!(about.handle_key(key(KeyCode::Esc)), ModalOutcome::Closed);
    }

    #[test]
    fn photo_form_cycles_fields() {
        let mut modal = Modal::add_photo(3);
        type_text(&mut modal, "/tmp/a.jpg");
        modal.handle_key(key(KeyCode::Tab));
        modal.handle_key(key(KeyCode::Tab));
        type_text(&mut modal, "sunset");
        assert_eq!(
            modal.handle_key(key(KeyCode::Enter)),
            ModalOutcome::Submitted(Submission::AddPhoto {
                diary_id: 3,
                path: "/tmp/a.jpg".to_string(),
                name: String::new(),
                caption: "sunset".to_string(),
            })
        );
    }

    #[test]
    fn browsing_fills_path_and_blank_name() {
        let dir = std::env::temp_dir().join(format!("pilgrim-form-test-{}", Uuid::now_v7()));
        std::fs::create_dir_all(&dir).expect("dir");
        std::fs::write(dir.join("sunset.jpg"), b"sunset").expect("image");

        let mut modal = Modal::add_photo(4);
        type_text(&mut modal, dir.to_str().expect("utf8"));
        modal.handle_key(KeyEvent::new(KeyCode::Char('o'), KeyModifiers::CONTROL));
        assert!(matches!(&modal, Modal::PhotoForm { picker: Some(_), .. }));

        // Enter picks the image instead of submitting the form.
        assert_eq!(modal.handle_key(key(KeyCode::Enter)), ModalOutcome::Pending);
        assert!(matches!(&modal, Modal::PhotoForm { picker: None, .. }));
        assert_eq!(
            modal.handle_key(key(KeyCode::Enter)),
            ModalOutcome::Submitted(Submission::AddPhoto {
                diary_id: 4,
                path: dir.join("sunset.jpg").to_string_lossy().into_owned(),
                name: "sunset".to_string(),
                caption: String::new(),
            })
        );

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn escape_leaves_the_browser_but_keeps_the_form() {
        let mut modal = Modal::add_photo(4);
        modal.handle_key(KeyEvent::new(KeyCode::Char('o'), KeyModifiers::CONTROL));
        assert_eq!(modal.handle_key(key(KeyCode::Esc)), ModalOutcome::Pending);
        assert!(matches!(&modal, Modal::PhotoForm { picker: None, .. }));
        assert_eq!(modal.handle_key(key(KeyCode::Esc)), ModalOutcome::Cancelled);
    }

    #[test]
    fn edit_form_has_no_browser() {
        let mut modal = Modal::edit_photo(9, "tram", None);
        modal.handle_key(KeyEvent::new(KeyCode::Char('o'), KeyModifiers::CONTROL));
        assert!(matches!(&modal, Modal::PhotoForm { picker: None, .. }));
    }

    #[test]
    fn diary_deletion_needs_exact_name() {
        let mut modal = Modal::delete_diary(7, "Porto");
        type_text(&mut modal, "Port");
        assert_eq!(modal.handle_key(key(KeyCode::Enter)), ModalOutcome::Pending);
        type_text(&mut modal, "o");
        assert_eq!(
            modal.handle_key(key(KeyCode::Enter)),
            ModalOutcome::Submitted(Submission::DeleteDiary(7))
        );
    }

    #[test]
    fn line_input_edits_in_the_middle() {
        let mut input = LineInput::with_value("Evra");
        input.handle(key(KeyCode::Left));
        input.handle(key(KeyCode::Left));
        input.handle(key(KeyCode::Char('o')));
        assert_eq!(input.value(), "Evora");
        assert_eq!(input.cursor(), 3);
    }
}

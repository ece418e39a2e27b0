//! Modal dialogs for bulk filter and export.

use std::collections::BTreeSet;

use crossterm::event::KeyCode;

use crate::catalog::FilterRequest;
use crate::mark::Mark;

/// Result of feeding a key to a dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogOutcome<T> {
    /// Still editing.
    Open,
    Cancel,
    Submit(T),
}

/// Editable fields of the filter dialog, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Name,
    Content,
    MinLength,
    MaxLength,
    Mark,
}

impl FilterField {
    pub const ORDER: [FilterField; 5] = [
        FilterField::Name,
        FilterField::Content,
        FilterField::MinLength,
        FilterField::MaxLength,
        FilterField::Mark,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FilterField::Name => "Filename regex",
            FilterField::Content => "Content pattern",
            FilterField::MinLength => "Min length",
            FilterField::MaxLength => "Max length",
            FilterField::Mark => "Mark",
        }
    }

    fn next(self) -> Self {
        let i = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(i + 1) % Self::ORDER.len()]
    }

    fn prev(self) -> Self {
        let i = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(i + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

/// Filter criteria being edited. Lengths stay text until submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterDialog {
    pub name: String,
    pub content: String,
    pub min_length: String,
    pub max_length: String,
    pub mark: Mark,
    pub focus: FilterField,
    /// Validation message shown under the fields.
    pub error: Option<String>,
}

impl Default for FilterDialog {
    fn default() -> Self {
        Self {
            name: String::new(),
            content: String::new(),
            min_length: String::new(),
            max_length: String::new(),
            mark: Mark::A,
            focus: FilterField::Name,
            error: None,
        }
    }
}

impl FilterDialog {
    /// Start from the last submitted criteria, so a corrected retry keeps them.
    pub fn from_request(request: &FilterRequest) -> Self {
        Self {
            name: request.file_name_regex.clone(),
            content: request.content_pattern.clone(),
            min_length: request.min_length.map(|n| n.to_string()).unwrap_or_default(),
            max_length: request.max_length.map(|n| n.to_string()).unwrap_or_default(),
            mark: request.mark_color,
            ..Self::default()
        }
    }

    pub fn value(&self, field: FilterField) -> String {
        match field {
            FilterField::Name => self.name.clone(),
            FilterField::Content => self.content.clone(),
            FilterField::MinLength => self.min_length.clone(),
            FilterField::MaxLength => self.max_length.clone(),
            FilterField::Mark => self.mark.to_string(),
        }
    }

    fn text_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            FilterField::Name => Some(&mut self.name),
            FilterField::Content => Some(&mut self.content),
            FilterField::MinLength => Some(&mut self.min_length),
            FilterField::MaxLength => Some(&mut self.max_length),
            FilterField::Mark => None,
        }
    }

    fn toggle_mark(&mut self) {
        self.mark = match self.mark {
            Mark::A => Mark::B,
            Mark::B => Mark::A,
        };
    }

    pub fn handle_key(&mut self, code: KeyCode) -> DialogOutcome<FilterRequest> {
        match code {
            KeyCode::Esc => return DialogOutcome::Cancel,
            KeyCode::Tab | KeyCode::Down => self.focus = self.focus.next(),
            KeyCode::BackTab | KeyCode::Up => self.focus = self.focus.prev(),
            KeyCode::Enter => match self.build() {
                Ok(request) => return DialogOutcome::Submit(request),
                Err(message) => self.error = Some(message),
            },
            KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')
                if self.focus == FilterField::Mark =>
            {
                self.toggle_mark();
            }
            KeyCode::Char(c) if self.focus == FilterField::Mark => {
                if let Ok(mark) = c.to_string().parse::<Mark>() {
                    self.mark = mark;
                }
            }
            KeyCode::Char(c) => {
                let numeric = matches!(self.focus, FilterField::MinLength | FilterField::MaxLength);
                if !numeric || c.is_ascii_digit() {
                    if let Some(text) = self.text_mut() {
                        text.push(c);
                    }
                    self.error = None;
                }
            }
            KeyCode::Backspace => {
                if let Some(text) = self.text_mut() {
                    text.pop();
                }
                self.error = None;
            }
            _ => {}
        }
        DialogOutcome::Open
    }

    /// Assemble and validate the request.
    pub fn build(&self) -> Result<FilterRequest, String> {
        let request = FilterRequest {
            file_name_regex: self.name.clone(),
            content_pattern: self.content.clone(),
            min_length: parse_length("min length", &self.min_length)?,
            max_length: parse_length("max length", &self.max_length)?,
            mark_color: self.mark,
        };
        request.compile().map_err(|e| e.to_string())?;
        Ok(request)
    }
}

fn parse_length(label: &str, value: &str) -> Result<Option<usize>, String> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<usize>()
        .map(Some)
        .map_err(|e| format!("{label}: {e}"))
}

/// Mark checkboxes for export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDialog {
    pub selected: BTreeSet<Mark>,
    pub focus: usize,
    pub error: Option<String>,
}

impl Default for ExportDialog {
    fn default() -> Self {
        Self {
            selected: Mark::ALL.into_iter().collect(),
            focus: 0,
            error: None,
        }
    }
}

impl ExportDialog {
    pub fn is_selected(&self, mark: Mark) -> bool {
        self.selected.contains(&mark)
    }

    fn toggle(&mut self, mark: Mark) {
        if !self.selected.remove(&mark) {
            self.selected.insert(mark);
        }
        self.error = None;
    }

    pub fn handle_key(&mut self, code: KeyCode) -> DialogOutcome<BTreeSet<Mark>> {
        let count = Mark::ALL.len();
        match code {
            KeyCode::Esc => return DialogOutcome::Cancel,
            KeyCode::Tab | KeyCode::Down => self.focus = (self.focus + 1) % count,
            KeyCode::BackTab | KeyCode::Up => self.focus = (self.focus + count - 1) % count,
            KeyCode::Char(' ') => self.toggle(Mark::ALL[self.focus]),
            KeyCode::Char(c) => {
                if let Ok(mark) = c.to_string().parse::<Mark>() {
                    self.toggle(mark);
                }
            }
            KeyCode::Enter => {
                if self.selected.is_empty() {
                    self.error = Some("Select at least one mark.".into());
                } else {
                    return DialogOutcome::Submit(self.selected.clone());
                }
            }
            _ => {}
        }
        DialogOutcome::Open
    }
}

/// The open modal, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialog {
    Filter(FilterDialog),
    Export(ExportDialog),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_text(dialog: &mut FilterDialog, text: &str) {
        for c in text.chars() {
            dialog.handle_key(KeyCode::Char(c));
        }
    }

    #[test]
    fn tab_cycles_fields() {
        let mut d = FilterDialog::default();
        for expected in [
            FilterField::Content,
            FilterField::MinLength,
            FilterField::MaxLength,
            FilterField::Mark,
            FilterField::Name,
        ] {
            d.handle_key(KeyCode::Tab);
            assert_eq!(d.focus, expected);
        }
        d.handle_key(KeyCode::BackTab);
        assert_eq!(d.focus, FilterField::Mark);
    }

    #[test]
    fn builds_request_from_fields() {
        let mut d = FilterDialog::default();
        type_text(&mut d, "^inv");
        d.handle_key(KeyCode::Tab);
        type_text(&mut d, "total");
        d.handle_key(KeyCode::Tab);
        type_text(&mut d, "1x0");
        d.handle_key(KeyCode::Tab);
        d.handle_key(KeyCode::Tab);
        d.handle_key(KeyCode::Right);

        let DialogOutcome::Submit(request) = d.handle_key(KeyCode::Enter) else {
            panic!("expected submit");
        };
        assert_eq!(request.file_name_regex, "^inv");
        assert_eq!(request.content_pattern, "total");
        assert_eq!(request.min_length, Some(10));
        assert_eq!(request.max_length, None);
        assert_eq!(request.mark_color, Mark::B);
    }

    #[test]
    fn invalid_pattern_stays_open_with_error() {
        let mut d = FilterDialog::default();
        type_text(&mut d, "(oops");
        assert_eq!(d.handle_key(KeyCode::Enter), DialogOutcome::Open);
        assert!(d.error.as_deref().unwrap().contains("invalid filename pattern"));

        d.handle_key(KeyCode::Backspace);
        assert!(d.error.is_none());
    }

    #[test]
    fn inverted_range_is_reported() {
        let mut d = FilterDialog {
            min_length: "9".into(),
            max_length: "3".into(),
            ..Default::default()
        };
        assert_eq!(d.handle_key(KeyCode::Enter), DialogOutcome::Open);
        assert!(d.error.is_some());
    }

    #[test]
    fn escape_cancels() {
        let mut d = FilterDialog::default();
        assert_eq!(d.handle_key(KeyCode::Esc), DialogOutcome::Cancel);
        let mut e = ExportDialog::default();
        assert_eq!(e.handle_key(KeyCode::Esc), DialogOutcome::Cancel);
    }

    #[test]
    fn export_checkboxes_toggle() {
        let mut e = ExportDialog::default();
        assert!(e.is_selected(Mark::A) && e.is_selected(Mark::B));

        e.handle_key(KeyCode::Char(' '));
        assert!(!e.is_selected(Mark::A));
        e.handle_key(KeyCode::Down);
        e.handle_key(KeyCode::Char(' '));
        assert_eq!(e.handle_key(KeyCode::Enter), DialogOutcome::Open);
        assert!(e.error.is_some());

        e.handle_key(KeyCode::Char('a'));
        assert_eq!(
            e.handle_key(KeyCode::Enter),
            DialogOutcome::Submit(BTreeSet::from([Mark::A]))
        );
    }
}

use super::{App, AppMode, Navigable, TextInput};
use crate::store::{ChatSettings, SettingsPatch};

/// Editable fields of a window's settings, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    Model,
    Temperature,
    TopP,
    TopK,
    MaxLength,
    SystemPrompt,
}

pub const SETTINGS_FIELDS: [SettingsField; 6] = [
    SettingsField::Model,
    SettingsField::Temperature,
    SettingsField::TopP,
    SettingsField::TopK,
    SettingsField::MaxLength,
    SettingsField::SystemPrompt,
];

impl SettingsField {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Model => "Model",
            Self::Temperature => "Temperature",
            Self::TopP => "Top P",
            Self::TopK => "Top K",
            Self::MaxLength => "Max length",
            Self::SystemPrompt => "System prompt",
        }
    }

    #[must_use]
    pub fn current_value(&self, settings: &ChatSettings) -> String {
        match self {
            Self::Model => settings.model.clone(),
            Self::Temperature => format!("{}", settings.temperature),
            Self::TopP => format!("{}", settings.top_p),
            Self::TopK => format!("{}", settings.top_k),
            Self::MaxLength => format!("{}", settings.max_length),
            Self::SystemPrompt => settings.system_prompt.clone(),
        }
    }

    /// Parses the edited text into a patch for this field alone
    fn patch_from(&self, text: &str) -> Result<SettingsPatch, String> {
        let text = text.trim();
        let mut patch = SettingsPatch::default();
        match self {
            Self::Model => patch.model = Some(text.to_string()),
            Self::Temperature => {
                let value: f32 = text.parse().map_err(|_| "not a number".to_string())?;
                if !(0.0..=2.0).contains(&value) {
                    return Err("temperature must be within 0..2".to_string());
                }
                patch.temperature = Some(value);
            }
            Self::TopP => {
                patch.top_p = Some(text.parse().map_err(|_| "not a number".to_string())?);
            }
            Self::TopK => {
                patch.top_k = Some(text.parse().map_err(|_| "not a whole number".to_string())?);
            }
            Self::MaxLength => {
                patch.max_length =
                    Some(text.parse().map_err(|_| "not a whole number".to_string())?);
            }
            Self::SystemPrompt => patch.system_prompt = Some(text.to_string()),
        }
        Ok(patch)
    }
}

impl App {
    pub fn open_settings(&mut self) {
        self.mode = AppMode::Settings;
        self.settings_selected_index = 0;
        self.settings_edit_input = None;
    }

    pub fn close_settings(&mut self) {
        self.mode = AppMode::Chat;
        self.settings_edit_input = None;
    }

    pub fn start_settings_edit(&mut self) {
        let Some(field) = SETTINGS_FIELDS.get(self.settings_selected_index) else {
            return;
        };
        let Some(window) = self.store.current_window() else {
            return;
        };
        self.settings_edit_input = Some(TextInput::with_content(
            field.current_value(&window.settings),
        ));
    }

    /// Applies the edit to the current window only; other windows keep
    /// their own settings
    pub fn commit_settings_edit(&mut self) {
        let Some(input) = self.settings_edit_input.take() else {
            return;
        };
        let Some(field) = SETTINGS_FIELDS.get(self.settings_selected_index) else {
            return;
        };
        match field.patch_from(input.content()) {
            Ok(patch) => {
                if let Err(error) = self.store.update_settings(patch) {
                    self.show_status_toast(format!("{error}"));
                } else {
                    self.save_store();
                }
            }
            Err(reason) => self.show_status_toast(format!("INVALID VALUE: {reason}")),
        }
    }

    pub fn cancel_settings_edit(&mut self) {
        self.settings_edit_input = None;
    }
}

struct SettingsNavigable<'a> {
    app: &'a mut App,
}

impl Navigable for SettingsNavigable<'_> {
    fn get_item_count(&self) -> usize {
        SETTINGS_FIELDS.len()
    }

    fn get_selected_index(&self) -> usize {
        self.app.settings_selected_index
    }

    fn set_selected_index(&mut self, index: usize) {
        self.app.settings_selected_index = index;
    }
}

impl App {
    pub fn next_settings_item(&mut self) {
        SettingsNavigable { app: self }.next_item();
    }

    pub fn previous_settings_item(&mut self) {
        SettingsNavigable { app: self }.previous_item();
    }
}

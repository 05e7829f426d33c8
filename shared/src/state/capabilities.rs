//! Field-level capabilities composed over a flat [`SharedState`].
//!
//! A component opts into a capability by implementing the marker trait;
//! every accessor is provided on top of [`HasState`].

use super::shared_state::SharedState;

/// Well-known State field names understood by the client runtime
pub mod field {
    pub const CAPTION: &str = "caption";
    pub const DESCRIPTION: &str = "description";
    pub const ENABLED: &str = "enabled";
    pub const READ_ONLY: &str = "readOnly";
    pub const PROPERTY_READ_ONLY: &str = "propertyReadOnly";
    pub const REQUIRED: &str = "required";
    pub const MODIFIED: &str = "modified";
    pub const ERROR_MESSAGE: &str = "errorMessage";
    pub const SHOW_ERROR_FOR_DISABLED: &str = "showErrorForDisabledState";
}

pub trait HasState {
    fn state(&self) -> &SharedState;
    fn state_mut(&mut self) -> &mut SharedState;
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

pub trait HasCaption: HasState {
    fn caption(&self) -> Option<&str> {
        self.state().get_str(field::CAPTION)
    }

    fn set_caption(&mut self, caption: Option<&str>) {
        match caption {
            Some(caption) => self.state_mut().set(field::CAPTION, caption),
            None => {
                self.state_mut().remove(field::CAPTION);
            }
        }
    }
}

pub trait HasDescription: HasState {
    fn description(&self) -> Option<&str> {
        non_empty(self.state().get_str(field::DESCRIPTION))
    }

    fn set_description(&mut self, description: &str) {
        self.state_mut().set(field::DESCRIPTION, description);
    }
}

/// Components are enabled unless the field says otherwise
pub trait HasEnabled: HasState {
    fn is_enabled(&self) -> bool {
        self.state()
            .get(field::ENABLED)
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(true)
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.state_mut().set(field::ENABLED, enabled);
    }
}

pub trait HasReadOnly: HasState {
    /// Read-only either through the component itself or through the bound
    /// data property
    fn is_read_only(&self) -> bool {
        self.state().get_bool(field::READ_ONLY) || self.state().get_bool(field::PROPERTY_READ_ONLY)
    }

    fn set_read_only(&mut self, read_only: bool) {
        self.state_mut().set(field::READ_ONLY, read_only);
    }

    fn set_property_read_only(&mut self, read_only: bool) {
        self.state_mut().set(field::PROPERTY_READ_ONLY, read_only);
    }
}

pub trait HasRequired: HasState {
    fn is_required(&self) -> bool {
        self.state().get_bool(field::REQUIRED)
    }

    fn set_required(&mut self, required: bool) {
        self.state_mut().set(field::REQUIRED, required);
    }
}

pub trait HasModified: HasState {
    fn is_modified(&self) -> bool {
        self.state().get_bool(field::MODIFIED)
    }

    fn set_modified(&mut self, modified: bool) {
        self.state_mut().set(field::MODIFIED, modified);
    }
}

pub trait HasErrorMessage: HasState {
    fn error_message(&self) -> Option<&str> {
        non_empty(self.state().get_str(field::ERROR_MESSAGE))
    }

    fn set_error_message(&mut self, message: Option<&str>) {
        match message {
            Some(message) => self.state_mut().set(field::ERROR_MESSAGE, message),
            None => {
                self.state_mut().remove(field::ERROR_MESSAGE);
            }
        }
    }

    fn shows_error_when_disabled(&self) -> bool {
        self.state().get_bool(field::SHOW_ERROR_FOR_DISABLED)
    }

    fn set_show_error_when_disabled(&mut self, show: bool) {
        self.state_mut().set(field::SHOW_ERROR_FOR_DISABLED, show);
    }
}

/// Presentation rules of an input field, derived from its capabilities
pub trait FieldRules:
    HasEnabled + HasReadOnly + HasRequired + HasDescription + HasErrorMessage
{
    /// Required indicators are hidden while the field is read-only
    fn shows_required_indicator(&self) -> bool {
        self.is_required() && !self.is_read_only()
    }

    /// The error message that may appear in a tooltip. Disabled fields keep
    /// their error hidden unless explicitly configured otherwise.
    fn visible_error_message(&self) -> Option<&str> {
        if self.is_enabled() || self.shows_error_when_disabled() {
            self.error_message()
        } else {
            None
        }
    }

    fn has_tooltip(&self) -> bool {
        self.description().is_some() || self.visible_error_message().is_some()
    }
}

impl<T> FieldRules for T where
    T: HasEnabled + HasReadOnly + HasRequired + HasDescription + HasErrorMessage
{
}

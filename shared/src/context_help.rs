use serde::{Deserialize, Serialize};

/// Server RPC interface through which a component's context help icon
/// reports clicks
pub const CONTEXT_HELP_RPC: &str = "HasContextHelpServerRpc";

/// Method of [`CONTEXT_HELP_RPC`], takes one [`MouseEventDetails`] argument
pub const ICON_CLICK: &str = "iconClick";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MouseButton {
    #[default]
    Left,
    Middle,
    Right,
}

/// Serialized details of a browser mouse event
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MouseEventDetails {
    pub button: MouseButton,
    pub client_x: i32,
    pub client_y: i32,
    pub relative_x: i32,
    pub relative_y: i32,
    pub alt_key: bool,
    pub ctrl_key: bool,
    pub meta_key: bool,
    pub shift_key: bool,
    pub double_click: bool,
}

//! Boundary between the control channel and the host client.
//!
//! Every method runs on the thread that owns the client's state; the command
//! handlers reach it only through [`crate::Bridge`].

/// Name and version of one loaded extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModInfo {
    /// Display name, also used to open its settings screen.
    pub name: String,
    /// Version string as the extension reports it.
    pub version: String,
}

impl ModInfo {
    /// Describes an extension.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// State and actions the host client exposes to remote commands.
///
/// Setters return the value actually in effect afterwards, which may differ
/// from the request when the client clamps or rejects it. Methods returning
/// `bool` report whether the action could be carried out at all; a `false`
/// result must leave the state untouched.
pub trait ClientApplication {
    /// Display name of the signed-in user.
    fn username(&self) -> String;

    /// Address of the server the client is connected to, if any.
    fn server_address(&self) -> Option<String>;

    /// Names of the extensions that provide a settings screen.
    fn config_screen_names(&self) -> Vec<String>;

    /// Every loaded extension.
    fn mods(&self) -> Vec<ModInfo>;

    /// Applies a field-of-view setting in degrees.
    fn set_fov(&mut self, fov: i32) -> i32;

    /// Applies a brightness (gamma) setting.
    fn set_brightness(&mut self, brightness: f64) -> f64;

    /// Applies the master volume setting.
    fn set_master_volume(&mut self, volume: f64) -> f64;

    /// Opens the settings screen of the extension named `mod_name`.
    fn open_config_screen(&mut self, mod_name: &str) -> bool;

    /// Sends a chat line to the connected server.
    fn send_chat_message(&mut self, text: &str) -> bool;

    /// Sends a command (without the leading slash) to the connected server.
    fn send_chat_command(&mut self, command: &str) -> bool;

    /// Shows a message to the local player only.
    fn show_local_message(&mut self, text: &str) -> bool;
}

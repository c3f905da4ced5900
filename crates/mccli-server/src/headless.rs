//! In-memory client used by the headless host binary and the tests.

use std::ops::RangeInclusive;

use tracing::debug;

use crate::application::{ClientApplication, ModInfo};

const HEADLESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::headless");

const FOV_RANGE: RangeInclusive<i32> = 30..=110;
const UNIT_RANGE: RangeInclusive<f64> = 0.0..=1.0;

/// Where the client currently is.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Session {
    /// Title screen; nothing to talk to.
    #[default]
    Menu,
    /// Local world with an integrated server.
    Singleplayer,
    /// Connected to a remote server.
    Multiplayer {
        /// Server address as typed by the player.
        address: String,
    },
}

/// Line handed to the network or the local chat overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    /// Chat line sent to the server.
    Chat(String),
    /// Command sent to the server, without the leading slash.
    Command(String),
    /// Message shown only to the local player.
    Local(String),
}

#[derive(Debug, Clone)]
struct LoadedMod {
    info: ModInfo,
    has_config_screen: bool,
}

/// Client state kept entirely in memory.
///
/// Settings follow the usual option ranges: values outside them are ignored
/// and the previous value stays in effect.
#[derive(Debug, Clone)]
pub struct HeadlessClient {
    username: String,
    session: Session,
    fov: i32,
    brightness: f64,
    volume: f64,
    mods: Vec<LoadedMod>,
    open_screen: Option<String>,
    outbox: Vec<Outgoing>,
}

impl Default for HeadlessClient {
    fn default() -> Self {
        Self::new("Player")
    }
}

impl HeadlessClient {
    /// Client in the title menu with default settings and no extensions.
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            session: Session::Menu,
            fov: 70,
            brightness: 0.5,
            volume: 1.0,
            mods: Vec::new(),
            open_screen: None,
            outbox: Vec::new(),
        }
    }

    /// Registers a loaded extension.
    #[must_use]
    pub fn with_mod(mut self, info: ModInfo, has_config_screen: bool) -> Self {
        self.mods.push(LoadedMod {
            info,
            has_config_screen,
        });
        self
    }

    /// Moves the client into `session`.
    pub fn set_session(&mut self, session: Session) {
        self.session = session;
    }

    /// Current session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Field of view in degrees.
    #[must_use]
    pub const fn fov(&self) -> i32 {
        self.fov
    }

    /// Gamma setting between 0 and 1.
    #[must_use]
    pub const fn brightness(&self) -> f64 {
        self.brightness
    }

    /// Master volume between 0 and 1.
    #[must_use]
    pub const fn volume(&self) -> f64 {
        self.volume
    }

    /// Extension whose settings screen is showing, if any.
    #[must_use]
    pub fn open_screen(&self) -> Option<&str> {
        self.open_screen.as_deref()
    }

    /// Everything sent so far, oldest first.
    #[must_use]
    pub const fn outbox(&self) -> &[Outgoing] {
        self.outbox.as_slice()
    }

    const fn has_network(&self) -> bool {
        !matches!(self.session, Session::Menu)
    }
}

impl ClientApplication for HeadlessClient {
    fn username(&self) -> String {
        self.username.clone()
    }

    fn server_address(&self) -> Option<String> {
        match &self.session {
            Session::Multiplayer { address } => Some(address.clone()),
            Session::Menu | Session::Singleplayer => None,
        }
    }

    fn config_screen_names(&self) -> Vec<String> {
        self.mods
            .iter()
            .filter(|loaded| loaded.has_config_screen)
            .map(|loaded| loaded.info.name.clone())
            .collect()
    }

    fn mods(&self) -> Vec<ModInfo> {
        self.mods.iter().map(|loaded| loaded.info.clone()).collect()
    }

    fn set_fov(&mut self, fov: i32) -> i32 {
        if FOV_RANGE.contains(&fov) {
            self.fov = fov;
        } else {
            debug!(target: HEADLESS_TARGET, fov, "ignoring out-of-range fov");
        }
        self.fov
    }

    fn set_brightness(&mut self, brightness: f64) -> f64 {
        if UNIT_RANGE.contains(&brightness) {
            self.brightness = brightness;
        } else {
            debug!(target: HEADLESS_TARGET, brightness, "ignoring out-of-range brightness");
        }
        self.brightness
    }

    fn set_master_volume(&mut self, volume: f64) -> f64 {
        if UNIT_RANGE.contains(&volume) {
            self.volume = volume;
        } else {
            debug!(target: HEADLESS_TARGET, volume, "ignoring out-of-range volume");
        }
        self.volume
    }

    fn open_config_screen(&mut self, mod_name: &str) -> bool {
        let opens = self
            .mods
            .iter()
            .any(|loaded| loaded.info.name == mod_name && loaded.has_config_screen);
        if opens {
            self.open_screen = Some(mod_name.to_owned());
        }
        opens
    }

    fn send_chat_message(&mut self, text: &str) -> bool {
        if !self.has_network() {
            return false;
        }
        self.outbox.push(Outgoing::Chat(text.to_owned()));
        true
    }

    fn send_chat_command(&mut self, command: &str) -> bool {
        if !self.has_network() {
            return false;
        }
        self.outbox.push(Outgoing::Command(command.to_owned()));
        true
    }

    fn show_local_message(&mut self, text: &str) -> bool {
        if !self.has_network() {
            return false;
        }
        self.outbox.push(Outgoing::Local(text.to_owned()));
        true
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(90, 90)]
    #[case(200, 70)]
    #[case(29, 70)]
    fn fov_respects_option_range(#[case] requested: i32, #[case] applied: i32) {
        let mut client = HeadlessClient::default();
        assert_eq!(client.set_fov(requested), applied);
        assert_eq!(client.fov(), applied);
    }

    #[test]
    fn nan_brightness_is_ignored() {
        let mut client = HeadlessClient::default();
        assert_eq!(client.set_brightness(f64::NAN), 0.5);
    }

    #[test]
    fn only_mods_with_screens_are_listed_and_opened() {
        let mut client = HeadlessClient::default()
            .with_mod(ModInfo::new("Sodium", "0.5.3"), true)
            .with_mod(ModInfo::new("Fabric API", "0.91.0"), false);

        assert_eq!(client.config_screen_names(), vec!["Sodium".to_owned()]);
        assert!(!client.open_config_screen("Fabric API"));
        assert_eq!(client.open_screen(), None);
        assert!(client.open_config_screen("Sodium"));
        assert_eq!(client.open_screen(), Some("Sodium"));
    }

    #[test]
    fn menu_cannot_send_anything() {
        let mut client = HeadlessClient::default();
        assert!(!client.send_chat_message("hi"));
        assert!(!client.send_chat_command("help"));
        assert!(!client.show_local_message("hi"));
        assert!(client.outbox().is_empty());
    }

    #[test]
    fn multiplayer_exposes_address_and_sends() {
        let mut client = HeadlessClient::default();
        client.set_session(Session::Multiplayer {
            address: "mc.example.net".to_owned(),
        });
        assert_eq!(client.server_address().as_deref(), Some("mc.example.net"));
        assert!(client.send_chat_command("help"));
        assert_eq!(client.outbox(), [Outgoing::Command("help".to_owned())]);
    }
}

//! Dispatch tests for the standard command table.

use std::sync::{Arc, atomic::AtomicBool};
use std::thread;
use std::time::Duration;

use mockall::mock;
use rstest::rstest;

use super::*;
use crate::application::ModInfo;
use crate::bridge::task_queue;
use crate::headless::{HeadlessClient, Outgoing, Session};

mock! {
    Client {}
    impl ClientApplication for Client {
        fn username(&self) -> String;
        fn server_address(&self) -> Option<String>;
        fn config_screen_names(&self) -> Vec<String>;
        fn mods(&self) -> Vec<ModInfo>;
        fn set_fov(&mut self, fov: i32) -> i32;
        fn set_brightness(&mut self, brightness: f64) -> f64;
        fn set_master_volume(&mut self, volume: f64) -> f64;
        fn open_config_screen(&mut self, mod_name: &str) -> bool;
        fn send_chat_message(&mut self, text: &str) -> bool;
        fn send_chat_command(&mut self, command: &str) -> bool;
        fn show_local_message(&mut self, text: &str) -> bool;
    }
}

/// Dispatches `parts` from a worker thread while this thread owns `state`.
fn dispatch<A: ClientApplication + 'static>(state: &mut A, parts: &[&str]) -> Response {
    let (sender, queue) = task_queue::<A>();
    let bridge = Bridge::new(sender, Arc::new(AtomicBool::new(false)));
    let message = Message::new(parts.iter().copied());
    let worker =
        thread::spawn(move || CommandTable::<A>::standard().dispatch(&message, &bridge));
    while !worker.is_finished() {
        queue.run_for(state, Duration::from_millis(5));
    }
    worker.join().expect("join dispatcher")
}

fn multiplayer_client() -> HeadlessClient {
    let mut client = HeadlessClient::new("Steve")
        .with_mod(ModInfo::new("Sodium", "0.5.3"), true)
        .with_mod(ModInfo::new("Fabric API", "0.91.0"), false);
    client.set_session(Session::Multiplayer {
        address: "mc.example.net:25565".to_owned(),
    });
    client
}

#[test]
fn standard_table_registers_full_surface() {
    let table = CommandTable::<HeadlessClient>::standard();
    let names: Vec<_> = table.names().collect();
    assert_eq!(
        names,
        [
            "ping",
            "get-username",
            "get-server-ip",
            "get-config-names",
            "get-mods",
            "set-fov",
            "set-brightness",
            "set-volume",
            "open-config",
            "send",
        ]
    );
    assert_eq!(
        table.get("send").map(CommandDescriptor::arity),
        Some(Arity::exactly(2))
    );
}

#[test]
fn ping_replies_pong_without_touching_client() {
    let mut client = MockClient::new();
    assert_eq!(dispatch(&mut client, &["ping"]), Response::success("pong"));
}

#[rstest]
#[case(&["ping", "extra"], "ping takes 0 arguments")]
#[case(&["set-fov"], "set-fov takes 1 arguments")]
#[case(&["send", "chat"], "send takes 2 arguments")]
#[case(&["get-mods", "a", "b"], "get-mods takes 0 arguments")]
fn arity_mismatch_is_reported(#[case] parts: &[&str], #[case] expected: &str) {
    let mut client = MockClient::new();
    assert_eq!(dispatch(&mut client, parts), Response::failure(expected));
}

#[test]
fn range_arity_uses_between_wording() {
    let error = CommandError::arity("teleport", Arity::between(1, 3));
    assert_eq!(error.to_string(), "teleport takes between 1 and 3 arguments");
}

#[test]
fn empty_message_is_rejected() {
    let mut client = MockClient::new();
    assert_eq!(dispatch(&mut client, &[]), Response::failure("empty message"));
}

#[rstest]
#[case("PING")]
#[case("unknown")]
#[case("")]
fn unknown_names_are_rejected(#[case] name: &str) {
    let mut client = MockClient::new();
    assert_eq!(
        dispatch(&mut client, &[name]),
        Response::failure(format!("invalid message type: {name}"))
    );
}

#[test]
fn invalid_fov_does_not_mutate() {
    let mut client = MockClient::new();
    client.expect_set_fov().never();
    assert_eq!(
        dispatch(&mut client, &["set-fov", "abc"]),
        Response::failure("invalid fov: abc")
    );
}

#[test]
fn set_fov_reports_applied_value() {
    let mut client = MockClient::new();
    client
        .expect_set_fov()
        .withf(|fov| *fov == 95)
        .times(1)
        .returning(|fov| fov);
    assert_eq!(
        dispatch(&mut client, &["set-fov", "95"]),
        Response::success("set fov: 95")
    );
}

#[rstest]
#[case(&["set-brightness", "bright"], "invalid brightness: bright")]
#[case(&["set-volume", "1,5"], "invalid volume: 1,5")]
fn invalid_floats_are_echoed(#[case] parts: &[&str], #[case] expected: &str) {
    let mut client = MockClient::new();
    client.expect_set_brightness().never();
    client.expect_set_master_volume().never();
    assert_eq!(dispatch(&mut client, parts), Response::failure(expected));
}

#[test]
fn float_settings_print_with_decimal_point() {
    let mut client = multiplayer_client();
    assert_eq!(
        dispatch(&mut client, &["set-volume", "1"]),
        Response::success("set volume: 1.0")
    );
    assert_eq!(
        dispatch(&mut client, &["set-brightness", "0.25"]),
        Response::success("set brightness: 0.25")
    );
    assert_eq!(client.brightness(), 0.25);
}

#[test]
fn padded_decimal_is_accepted_and_tiny_values_use_exponent() {
    let mut client = MockClient::new();
    client
        .expect_set_master_volume()
        .withf(|volume| volume.to_bits() == 0.5_f64.to_bits())
        .times(1)
        .returning(|volume| volume);
    client
        .expect_set_brightness()
        .times(1)
        .returning(|brightness| brightness);
    assert_eq!(
        dispatch(&mut client, &["set-volume", " 0.5"]),
        Response::success("set volume: 0.5")
    );
    assert_eq!(
        dispatch(&mut client, &["set-brightness", "0.0001"]),
        Response::success("set brightness: 1.0E-4")
    );
}

#[test]
fn clamped_setting_reports_value_in_effect() {
    let mut client = multiplayer_client();
    assert_eq!(
        dispatch(&mut client, &["set-fov", "500"]),
        Response::success("set fov: 70")
    );
}

#[test]
fn username_and_server_ip_come_from_client() {
    let mut client = multiplayer_client();
    assert_eq!(
        dispatch(&mut client, &["get-username"]),
        Response::success("Steve")
    );
    assert_eq!(
        dispatch(&mut client, &["get-server-ip"]),
        Response::success("mc.example.net:25565")
    );
}

#[test]
fn server_ip_fails_when_disconnected() {
    let mut client = HeadlessClient::default();
    assert_eq!(
        dispatch(&mut client, &["get-server-ip"]),
        Response::failure("not connected to server")
    );
}

#[test]
fn lists_mods_and_config_names() {
    let mut client = multiplayer_client();
    assert_eq!(
        dispatch(&mut client, &["get-mods"]),
        Response::success("Sodium\t0.5.3\nFabric API\t0.91.0")
    );
    assert_eq!(
        dispatch(&mut client, &["get-config-names"]),
        Response::success("Sodium")
    );
}

#[test]
fn open_config_reports_missing_screen() {
    let mut client = multiplayer_client();
    assert_eq!(
        dispatch(&mut client, &["open-config", "Fabric API"]),
        Response::failure("Fabric API has no config screen")
    );
    assert_eq!(
        dispatch(&mut client, &["open-config", "Sodium"]),
        Response::success("opened Sodium config")
    );
    assert_eq!(client.open_screen(), Some("Sodium"));
}

#[test]
fn send_command_requires_network() {
    let mut client = HeadlessClient::default();
    assert_eq!(
        dispatch(&mut client, &["send", "command", "help"]),
        Response::failure("failed to send")
    );

    client.set_session(Session::Singleplayer);
    assert_eq!(
        dispatch(&mut client, &["send", "command", "help"]),
        Response::success("sent")
    );
    assert_eq!(client.outbox(), [Outgoing::Command("help".to_owned())]);
}

#[rstest]
#[case("chat")]
#[case("chat-local")]
fn send_routes_by_kind(#[case] kind: &str) {
    let mut client = MockClient::new();
    let is_local = kind == "chat-local";
    client
        .expect_send_chat_message()
        .withf(|text| text == "hello")
        .times(usize::from(!is_local))
        .returning(|_| true);
    client
        .expect_show_local_message()
        .withf(|text| text == "hello")
        .times(usize::from(is_local))
        .returning(|_| true);
    client.expect_send_chat_command().never();
    assert_eq!(
        dispatch(&mut client, &["send", kind, "hello"]),
        Response::success("sent")
    );
}

#[rstest]
#[case("Chat")]
#[case("whisper")]
fn send_rejects_unknown_kind(#[case] kind: &str) {
    let mut client = MockClient::new();
    client.expect_send_chat_message().never();
    assert_eq!(
        dispatch(&mut client, &["send", kind, "hello"]),
        Response::failure("invalid send type")
    );
}

#[test]
fn custom_descriptors_extend_the_table() {
    fn echo(_bridge: &Bridge<HeadlessClient>, arguments: &[String]) -> CommandResult {
        Ok(arguments.join(" "))
    }

    let table = CommandTable::<HeadlessClient>::standard().with(CommandDescriptor::new(
        "echo",
        Arity::between(1, 3),
        echo,
    ));
    let (sender, _queue) = task_queue::<HeadlessClient>();
    let bridge = Bridge::new(sender, Arc::new(AtomicBool::new(false)));

    assert_eq!(
        table.dispatch(&Message::new(["echo", "a", "b"]), &bridge),
        Response::success("a b")
    );
    assert_eq!(
        table.dispatch(&Message::new(["echo"]), &bridge),
        Response::failure("echo takes between 1 and 3 arguments")
    );
}

#[test]
fn shutdown_turns_pending_call_into_failure() {
    let (sender, _queue) = task_queue::<HeadlessClient>();
    let bridge = Bridge::new(sender, Arc::new(AtomicBool::new(true)));
    let table = CommandTable::<HeadlessClient>::standard();
    assert_eq!(
        table.dispatch(&Message::new(["get-username"]), &bridge),
        Response::failure("server is shutting down")
    );
}

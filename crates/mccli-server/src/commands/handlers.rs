//! Handlers for the standard command surface.

use std::str::FromStr;

use strum::EnumString;

use super::{Arity, CommandDescriptor, CommandError, CommandResult};
use crate::application::ClientApplication;
use crate::bridge::Bridge;

/// Destination of a `send` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum SendKind {
    /// Chat line sent to the server.
    Chat,
    /// Message shown to the local player only.
    ChatLocal,
    /// Command sent to the server.
    Command,
}

pub(super) fn standard_commands<A: ClientApplication + 'static>() -> [CommandDescriptor<A>; 10] {
    [
        CommandDescriptor::new("ping", Arity::exactly(0), ping::<A>),
        CommandDescriptor::new("get-username", Arity::exactly(0), get_username::<A>),
        CommandDescriptor::new("get-server-ip", Arity::exactly(0), get_server_ip::<A>),
        CommandDescriptor::new("get-config-names", Arity::exactly(0), get_config_names::<A>),
        CommandDescriptor::new("get-mods", Arity::exactly(0), get_mods::<A>),
        CommandDescriptor::new("set-fov", Arity::exactly(1), set_fov::<A>),
        CommandDescriptor::new("set-brightness", Arity::exactly(1), set_brightness::<A>),
        CommandDescriptor::new("set-volume", Arity::exactly(1), set_volume::<A>),
        CommandDescriptor::new("open-config", Arity::exactly(1), open_config::<A>),
        CommandDescriptor::new("send", Arity::exactly(2), send::<A>),
    ]
}

fn ping<A>(_bridge: &Bridge<A>, _arguments: &[String]) -> CommandResult {
    Ok("pong".to_owned())
}

fn get_username<A: ClientApplication + 'static>(
    bridge: &Bridge<A>,
    _arguments: &[String],
) -> CommandResult {
    Ok(bridge.call(|client: &mut A| client.username())?)
}

fn get_server_ip<A: ClientApplication + 'static>(
    bridge: &Bridge<A>,
    _arguments: &[String],
) -> CommandResult {
    bridge
        .call(|client: &mut A| client.server_address())?
        .ok_or(CommandError::NotConnected)
}

fn get_config_names<A: ClientApplication + 'static>(
    bridge: &Bridge<A>,
    _arguments: &[String],
) -> CommandResult {
    let names = bridge.call(|client: &mut A| client.config_screen_names())?;
    Ok(names.join("\n"))
}

fn get_mods<A: ClientApplication + 'static>(
    bridge: &Bridge<A>,
    _arguments: &[String],
) -> CommandResult {
    let mods = bridge.call(|client: &mut A| client.mods())?;
    let lines: Vec<String> = mods
        .iter()
        .map(|info| format!("{}\t{}", info.name, info.version))
        .collect();
    Ok(lines.join("\n"))
}

fn set_fov<A: ClientApplication + 'static>(
    bridge: &Bridge<A>,
    arguments: &[String],
) -> CommandResult {
    let fov: i32 = parse_argument("fov", arguments)?;
    let applied = bridge.call(move |client: &mut A| client.set_fov(fov))?;
    Ok(format!("set fov: {applied}"))
}

fn set_brightness<A: ClientApplication + 'static>(
    bridge: &Bridge<A>,
    arguments: &[String],
) -> CommandResult {
    let brightness = parse_decimal("brightness", arguments)?;
    let applied = bridge.call(move |client: &mut A| client.set_brightness(brightness))?;
    Ok(format!("set brightness: {}", format_decimal(applied)))
}

fn set_volume<A: ClientApplication + 'static>(
    bridge: &Bridge<A>,
    arguments: &[String],
) -> CommandResult {
    let volume = parse_decimal("volume", arguments)?;
    let applied = bridge.call(move |client: &mut A| client.set_master_volume(volume))?;
    Ok(format!("set volume: {}", format_decimal(applied)))
}

fn open_config<A: ClientApplication + 'static>(
    bridge: &Bridge<A>,
    arguments: &[String],
) -> CommandResult {
    let name = first_argument(arguments).to_owned();
    let target = name.clone();
    if bridge.call(move |client: &mut A| client.open_config_screen(&target))? {
        Ok(format!("opened {name} config"))
    } else {
        Err(CommandError::no_config_screen(name))
    }
}

fn send<A: ClientApplication + 'static>(bridge: &Bridge<A>, arguments: &[String]) -> CommandResult {
    let [kind_name, text] = arguments else {
        return Err(CommandError::InvalidSendType);
    };
    let kind = SendKind::from_str(kind_name).map_err(|_| CommandError::InvalidSendType)?;
    let line = text.clone();
    let sent = bridge.call(move |client: &mut A| match kind {
        SendKind::Chat => client.send_chat_message(&line),
        SendKind::ChatLocal => client.show_local_message(&line),
        SendKind::Command => client.send_chat_command(&line),
    })?;
    if sent {
        Ok("sent".to_owned())
    } else {
        Err(CommandError::SendFailed)
    }
}

fn first_argument(arguments: &[String]) -> &str {
    arguments.first().map(String::as_str).unwrap_or_default()
}

fn parse_argument<T: FromStr>(what: &'static str, arguments: &[String]) -> Result<T, CommandError> {
    let input = first_argument(arguments);
    input
        .parse()
        .map_err(|_| CommandError::invalid_argument(what, input))
}

/// Parses a decimal setting, ignoring leading and trailing whitespace and
/// control characters. Failures echo the untrimmed input.
fn parse_decimal(what: &'static str, arguments: &[String]) -> Result<f64, CommandError> {
    let input = first_argument(arguments);
    input
        .trim_matches(|character: char| character <= ' ')
        .parse()
        .map_err(|_| CommandError::invalid_argument(what, input))
}

/// Renders a decimal setting the way tooling expects to read it back.
///
/// Magnitudes in `[1e-3, 1e7)` print as plain decimals with at least one
/// fractional digit (`0.5`, `1.0`). Everything else uses the shortest
/// mantissa with an upper-case exponent (`1.0E-4`, `1.5E7`).
fn format_decimal(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_owned();
    }
    if value.is_infinite() {
        let sign = if value.is_sign_negative() { "-" } else { "" };
        return format!("{sign}Infinity");
    }
    let magnitude = value.abs();
    if magnitude.to_bits() == 0 || (1e-3..1e7).contains(&magnitude) {
        return format!("{value:?}");
    }
    let scientific = format!("{value:e}");
    match scientific.split_once('e') {
        Some((mantissa, exponent)) if mantissa.contains('.') => format!("{mantissa}E{exponent}"),
        Some((mantissa, exponent)) => format!("{mantissa}.0E{exponent}"),
        None => scientific,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0.5, "0.5")]
    #[case(1.0, "1.0")]
    #[case(0.0, "0.0")]
    #[case(-0.0, "-0.0")]
    #[case(0.001, "0.001")]
    #[case(0.0001, "1.0E-4")]
    #[case(0.000_125, "1.25E-4")]
    #[case(1e7, "1.0E7")]
    #[case(-12_345_678.5, "-1.23456785E7")]
    #[case(9_999_999.0, "9999999.0")]
    #[case(f64::INFINITY, "Infinity")]
    #[case(f64::NEG_INFINITY, "-Infinity")]
    #[case(f64::NAN, "NaN")]
    fn decimals_render_with_exponent_outside_plain_range(
        #[case] value: f64,
        #[case] expected: &str,
    ) {
        assert_eq!(format_decimal(value), expected);
    }

    #[rstest]
    #[case(" 0.5", 0.5)]
    #[case("0.25\n", 0.25)]
    #[case("\t1", 1.0)]
    fn decimal_arguments_ignore_surrounding_whitespace(#[case] input: &str, #[case] expected: f64) {
        let arguments = [input.to_owned()];
        let parsed = parse_decimal("volume", &arguments).expect("decimal");
        assert_eq!(parsed.to_bits(), expected.to_bits());
    }

    #[test]
    fn decimal_failure_echoes_untrimmed_input() {
        let arguments = [" loud ".to_owned()];
        assert_eq!(
            parse_decimal("volume", &arguments),
            Err(CommandError::invalid_argument("volume", " loud "))
        );
    }

    #[test]
    fn integer_arguments_are_not_trimmed() {
        let arguments = [" 90".to_owned()];
        assert_eq!(
            parse_argument::<i32>("fov", &arguments),
            Err(CommandError::invalid_argument("fov", " 90"))
        );
    }
}

//! Minimal TOML reader for `device.toml`
//!
//! Handles only the subset the device configuration uses:
//!
//! - `[section]` headers (`wifi`, `http`, `serial`, `modes`, `fetch`)
//! - `key = value` pairs with string or integer values
//! - `#` comments, including trailing ones outside strings
//!
//! Multi-line strings, arrays, inline tables and dotted keys are not
//! supported. Keys this firmware does not know are skipped.

use heapless::String;

use super::types::DeviceConfig;

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Value has the wrong type or is out of range
    InvalidValue,
    /// String longer than its field allows
    TooLong,
    /// `key = value` line outside any section
    KeyOutsideSection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Wifi,
    Http,
    Serial,
    Modes,
    Fetch,
}

/// Parse `device.toml` text, starting from the defaults
pub fn parse_config(input: &str) -> Result<DeviceConfig, ParseError> {
    let mut config = DeviceConfig::default();
    let mut section = Section::Root;

    for line in input.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') {
            let header = strip_comment(line);
            if !header.ends_with(']') {
                return Err(ParseError::InvalidSection);
            }
            section = parse_section_header(&header[1..header.len() - 1])?;
            continue;
        }

        if let Some((key, value)) = parse_key_value(line) {
            apply_value(section, key, value, &mut config)?;
        }
    }

    Ok(config)
}

fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    match header.trim() {
        "wifi" => Ok(Section::Wifi),
        "http" => Ok(Section::Http),
        "serial" => Ok(Section::Serial),
        "modes" => Ok(Section::Modes),
        "fetch" => Ok(Section::Fetch),
        _ => Err(ParseError::InvalidSection),
    }
}

/// Drop a trailing `# comment` that is not inside a string
fn strip_comment(value: &str) -> &str {
    let mut in_string = false;
    for (i, c) in value.char_indices() {
        match c {
            '"' => in_string = !in_string,
            '#' if !in_string => return value[..i].trim_end(),
            _ => {}
        }
    }
    value
}

/// Split `key = value`, removing any trailing comment
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = strip_comment(line[eq_pos + 1..].trim());

    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key, value))
}

/// Remove surrounding quotes; bare words are accepted too
fn parse_string(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ParseError> {
    // TOML allows `_` between digits, e.g. `60_000`
    let mut digits: String<24> = String::new();
    for c in value.chars().filter(|&c| c != '_') {
        digits.push(c).map_err(|_| ParseError::InvalidValue)?;
    }
    digits.parse().map_err(|_| ParseError::InvalidValue)
}

fn parse_bounded<const N: usize>(value: &str) -> Result<String<N>, ParseError> {
    String::try_from(parse_string(value)).map_err(|_| ParseError::TooLong)
}

fn apply_value(
    section: Section,
    key: &str,
    value: &str,
    config: &mut DeviceConfig,
) -> Result<(), ParseError> {
    match section {
        Section::Root => return Err(ParseError::KeyOutsideSection),
        Section::Wifi => match key {
            "ssid" => config.wifi.ssid = parse_bounded(value)?,
            "password" => config.wifi.password = parse_bounded(value)?,
            "reconnect_interval_s" => config.wifi.reconnect_interval_s = parse_int(value)?,
            "join_timeout_s" => config.wifi.join_timeout_s = parse_int(value)?,
            _ => {}
        },
        Section::Http => {
            if key == "port" {
                config.http.port = parse_int(value)?;
            }
        }
        Section::Serial => {
            if key == "poll_interval_ms" {
                config.serial.poll_interval_ms = parse_int(value)?;
            }
        }
        Section::Modes => {
            if key == "boot" {
                config.modes.boot = parse_bounded(value)?;
            }
        }
        Section::Fetch => match key {
            "timeout_s" => config.fetch.timeout_s = parse_int(value)?,
            "jokes_host" => config.fetch.jokes_host = parse_bounded(value)?,
            "jokes_path" => config.fetch.jokes_path = parse_bounded(value)?,
            "rates_host" => config.fetch.rates_host = parse_bounded(value)?,
            "rates_path" => config.fetch.rates_path = parse_bounded(value)?,
            _ => {}
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
# lcdbox device configuration

[wifi]
ssid = "home-network"
password = "hunter2 # not a comment"
reconnect_interval_s = 10   # seconds

[http]
port = 8080

[serial]
poll_interval_ms = 250

[modes]
boot = "status"

[fetch]
timeout_s = 15
rates_path = "/v3/rates/"
"#;

    #[test]
    fn test_parse_sample() {
        let config = parse_config(SAMPLE).unwrap();
        assert_eq!(config.wifi.ssid.as_str(), "home-network");
        assert_eq!(config.wifi.password.as_str(), "hunter2 # not a comment");
        assert_eq!(config.wifi.reconnect_interval_s, 10);
        assert_eq!(config.wifi.join_timeout_s, 30);
        assert_eq!(config.http.port, 8080);
        assert_eq!(config.serial.poll_interval_ms, 250);
        assert_eq!(config.modes.boot.as_str(), "status");
        assert_eq!(config.fetch.timeout_s, 15);
        assert_eq!(config.fetch.rates_path.as_str(), "/v3/rates/");
        assert_eq!(config.fetch.jokes_host.as_str(), "v2.jokeapi.dev");
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_empty_input_gives_defaults() {
        assert_eq!(parse_config("").unwrap(), DeviceConfig::default());
    }

    #[test]
    fn test_underscored_integers() {
        let config = parse_config("[serial]\npoll_interval_ms = 1_000\n").unwrap();
        assert_eq!(config.serial.poll_interval_ms, 1000);
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            parse_config("[display]\n"),
            Err(ParseError::InvalidSection)
        );
        assert_eq!(
            parse_config("[wifi\nssid = \"x\"\n"),
            Err(ParseError::InvalidSection)
        );
        assert_eq!(
            parse_config("ssid = \"x\"\n"),
            Err(ParseError::KeyOutsideSection)
        );
        assert_eq!(
            parse_config("[http]\nport = 70000\n"),
            Err(ParseError::InvalidValue)
        );
        assert_eq!(
            parse_config("[http]\nport = \"eighty\"\n"),
            Err(ParseError::InvalidValue)
        );
        assert_eq!(
            parse_config("[modes]\nboot = \"a_mode_id_that_is_far_too_long_to_fit\"\n"),
            Err(ParseError::TooLong)
        );
    }

    #[test]
    fn test_unknown_keys_skipped() {
        let config = parse_config("[wifi]\ncountry = \"NZ\"\nssid = \"x\"\n").unwrap();
        assert_eq!(config.wifi.ssid.as_str(), "x");
    }
}

//! Build script for lcdbox-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates device.toml at compile time
//! - Checks that the CYW43 firmware blobs are present

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Blobs `main.rs` embeds with `include_bytes!`
const CYW43_BLOBS: [&str; 3] = ["43439A0.bin", "43439A0_clm.bin", "nvram_rp2040.bin"];

/// Longest mode id the firmware accepts
const MAX_MODE_ID_LEN: usize = 32;

fn main() {
    setup_linker();
    validate_config();
    check_radio_firmware();

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate device.toml at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=device.toml");

    let config_path = Path::new("device.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: device.toml not found!                                   ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds a device.toml configuration file.           ║\n\
            ║  Please create one in the lcdbox-firmware directory.             ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read device.toml                               ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in device.toml                       ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();
    validate_sections(&config, &mut errors);
    validate_wifi(&config, &mut errors);
    validate_numbers(&config, &mut errors);
    validate_modes(&config, &mut errors);
    validate_fetch(&config, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid configuration in device.toml                     ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=device.toml validated successfully");
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Only the sections the on-device parser understands are allowed
fn validate_sections(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(table) = config.as_table() else {
        return;
    };
    for (name, value) in table {
        if !["wifi", "http", "serial", "modes", "fetch"].contains(&name.as_str()) {
            errors.push(format!("Unknown section [{}]", name));
        } else if !value.is_table() {
            errors.push(format!("'{}' must be a [section]", name));
        }
    }
    if table.get("wifi").is_none() {
        errors.push("Missing [wifi] section".to_string());
    }
}

fn validate_wifi(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(wifi) = config.get("wifi") else {
        return;
    };
    match wifi.get("ssid") {
        Some(toml::Value::String(ssid)) if ssid.is_empty() => {
            errors.push("[wifi] ssid cannot be empty".to_string())
        }
        Some(toml::Value::String(ssid)) if ssid.len() > 32 => {
            errors.push("[wifi] ssid must be at most 32 bytes".to_string())
        }
        Some(toml::Value::String(_)) => {}
        Some(_) => errors.push("[wifi] ssid must be a string".to_string()),
        None => errors.push("[wifi] missing 'ssid'".to_string()),
    }
    match wifi.get("password") {
        Some(toml::Value::String(password)) if password.len() > 64 => {
            errors.push("[wifi] password must be at most 64 bytes".to_string())
        }
        Some(toml::Value::String(_)) | None => {}
        Some(_) => errors.push("[wifi] password must be a string".to_string()),
    }
}

/// Integers must be positive and fit their field
fn validate_numbers(config: &toml::Value, errors: &mut Vec<String>) {
    let fields: [(&str, &str, i64); 5] = [
        ("wifi", "reconnect_interval_s", u32::MAX as i64),
        ("wifi", "join_timeout_s", u32::MAX as i64),
        ("http", "port", u16::MAX as i64),
        ("serial", "poll_interval_ms", u32::MAX as i64),
        ("fetch", "timeout_s", u32::MAX as i64),
    ];
    for (section, key, max) in fields {
        match config.get(section).and_then(|s| s.get(key)) {
            Some(toml::Value::Integer(n)) if *n < 1 || *n > max => {
                errors.push(format!("[{}] {} must be 1-{}", section, key, max))
            }
            Some(toml::Value::Integer(_)) | None => {}
            Some(_) => errors.push(format!("[{}] {} must be an integer", section, key)),
        }
    }
}

fn validate_modes(config: &toml::Value, errors: &mut Vec<String>) {
    match config.get("modes").and_then(|m| m.get("boot")) {
        Some(toml::Value::String(boot)) if boot.is_empty() || boot.len() > MAX_MODE_ID_LEN => {
            errors.push(format!("[modes] boot must be 1-{} bytes", MAX_MODE_ID_LEN))
        }
        Some(toml::Value::String(boot)) if boot.chars().any(char::is_whitespace) => {
            errors.push("[modes] boot cannot contain whitespace".to_string())
        }
        Some(toml::Value::String(_)) | None => {}
        Some(_) => errors.push("[modes] boot must be a string".to_string()),
    }
}

fn validate_fetch(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(fetch) = config.get("fetch") else {
        return;
    };
    for (key, max) in [
        ("jokes_host", 64),
        ("jokes_path", 96),
        ("rates_host", 64),
        ("rates_path", 96),
    ] {
        match fetch.get(key) {
            Some(toml::Value::String(value)) if value.is_empty() || value.len() > max => {
                errors.push(format!("[fetch] {} must be 1-{} bytes", key, max))
            }
            Some(toml::Value::String(value)) if key.ends_with("_path") && !value.starts_with('/') => {
                errors.push(format!("[fetch] {} must start with '/'", key))
            }
            Some(toml::Value::String(_)) | None => {}
            Some(_) => errors.push(format!("[fetch] {} must be a string", key)),
        }
    }
}

/// The radio blobs are not redistributed with the source
fn check_radio_firmware() {
    let missing: Vec<&str> = CYW43_BLOBS
        .iter()
        .copied()
        .filter(|blob| !Path::new("cyw43-firmware").join(blob).exists())
        .collect();

    for blob in CYW43_BLOBS {
        println!("cargo:rerun-if-changed=cyw43-firmware/{}", blob);
    }

    if !missing.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: CYW43 firmware blobs missing                             ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ║                                                                  ║\n\
            ║  See cyw43-firmware/README.md                                    ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            missing
                .iter()
                .map(|b| format!("║  • cyw43-firmware/{:<47} ║", b))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }
}

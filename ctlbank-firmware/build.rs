//! Build script for ctlbank-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates controller.toml at compile time
//! - Generates the embedded panel configuration and pin map

use std::collections::BTreeSet;
use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// GPIO pins on RP2040
const GPIO_COUNT: u8 = 30;

/// I2C0 SDA and SCL, wired to the host bus
const BUS_PINS: [u8; 2] = [4, 5];

/// Pins with an ADC input
const ADC_PINS: [u8; 4] = [26, 27, 28, 29];

/// Native RP2040 converter resolution
const ADC_FULL_BITS: i64 = 12;

// Mirrors of the ctlbank-core limits
const MAX_POTS: i64 = 64;
const MAX_SWITCHES: i64 = 64;
const MAX_ENCODERS: i64 = 32;
const MAX_MATRIX_ROWS: usize = 8;
const MAX_MATRIX_COLUMNS: usize = 16;
const MAX_SELECT_LINES: usize = 3;

fn main() {
    setup_linker();
    let board = validate_config();
    generate_config(&board);
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validated controller.toml contents
struct Board {
    bus_address: i64,
    pots: i64,
    switches: i64,
    encoders: i64,
    adc_bits: i64,
    adc_sample_threshold: i64,
    debounce_ms: i64,
    speed_threshold_ms: i64,
    fast_multiplier: i64,
    irq: u8,
    adc: Vec<u8>,
    mux_select: Vec<u8>,
    switch_rows: Vec<u8>,
    switch_columns: Vec<u8>,
    encoder_rows: Vec<u8>,
    encoder_columns: Vec<u8>,
}

/// Validate controller.toml configuration at compile time
fn validate_config() -> Board {
    // Re-run if controller.toml changes
    println!("cargo:rerun-if-changed=controller.toml");

    let config_path = Path::new("controller.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: controller.toml not found!                               ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a controller.toml configuration file.     ║\n\
            ║  Please create one in the ctlbank-firmware directory.            ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read controller.toml                           ║\n\
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
                ║  ERROR: Invalid TOML syntax in controller.toml                   ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    validate_required_sections(&config);

    let mut errors = Vec::new();
    let board = Board {
        bus_address: integer(&config, "bus", "address", 0x08..=0x77, &mut errors),
        pots: integer(&config, "inputs", "pots", 0..=MAX_POTS, &mut errors),
        switches: integer(&config, "inputs", "switches", 0..=MAX_SWITCHES, &mut errors),
        encoders: integer(&config, "inputs", "encoders", 0..=MAX_ENCODERS, &mut errors),
        adc_bits: integer(&config, "filter", "adc_bits", 1..=ADC_FULL_BITS, &mut errors),
        adc_sample_threshold: integer(&config, "filter", "adc_sample_threshold", 1..=255, &mut errors),
        debounce_ms: integer(&config, "filter", "debounce_ms", 0..=60_000, &mut errors),
        speed_threshold_ms: integer(&config, "filter", "speed_threshold_ms", 0..=60_000, &mut errors),
        fast_multiplier: integer(&config, "filter", "fast_multiplier", 1..=i64::from(i16::MAX), &mut errors),
        irq: pin(&config, "irq", &mut errors),
        adc: pin_list(&config, "adc", ADC_PINS.len(), &mut errors),
        mux_select: pin_list(&config, "mux_select", MAX_SELECT_LINES, &mut errors),
        switch_rows: pin_list(&config, "switch_rows", MAX_MATRIX_ROWS, &mut errors),
        switch_columns: pin_list(&config, "switch_columns", MAX_MATRIX_COLUMNS, &mut errors),
        encoder_rows: pin_list(&config, "encoder_rows", MAX_MATRIX_ROWS, &mut errors),
        encoder_columns: pin_list(&config, "encoder_columns", MAX_MATRIX_COLUMNS, &mut errors),
    };
    fail_on_errors("Invalid controller configuration", &errors);

    validate_pin_roles(&board);
    validate_capacity(&board);

    println!("cargo:warning=controller.toml validated successfully");
    board
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

/// Panic with a boxed list of errors, if there are any
fn fail_on_errors(title: &str, errors: &[String]) {
    if errors.is_empty() {
        return;
    }
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        errors
            .iter()
            .map(|e| format!("║  • {:<62} ║", e))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

/// Validate that required sections exist
fn validate_required_sections(config: &toml::Value) {
    let errors: Vec<String> = ["bus", "inputs", "filter", "pins"]
        .iter()
        .filter(|section| !matches!(config.get(section), Some(toml::Value::Table(_))))
        .map(|section| format!("Missing [{}] section", section))
        .collect();

    fail_on_errors("Missing required sections in controller.toml", &errors);
}

/// Read an integer field and check its range
fn integer(
    config: &toml::Value,
    section: &str,
    key: &str,
    range: std::ops::RangeInclusive<i64>,
    errors: &mut Vec<String>,
) -> i64 {
    match config.get(section).and_then(|s| s.get(key)) {
        Some(toml::Value::Integer(value)) if range.contains(value) => *value,
        Some(toml::Value::Integer(_)) => {
            errors.push(format!(
                "[{}] {} must be {}-{}",
                section,
                key,
                range.start(),
                range.end()
            ));
            0
        }
        Some(_) => {
            errors.push(format!("[{}] {} must be an integer", section, key));
            0
        }
        None => {
            errors.push(format!("[{}] missing '{}'", section, key));
            0
        }
    }
}

/// Parse a pin string from config
///
/// Accepts "gpio11" style names only.
fn parse_pin_string(s: &str) -> Option<u8> {
    let pin: u8 = s.trim().strip_prefix("gpio")?.parse().ok()?;
    (pin < GPIO_COUNT).then_some(pin)
}

fn pin(config: &toml::Value, key: &str, errors: &mut Vec<String>) -> u8 {
    match config.get("pins").and_then(|p| p.get(key)) {
        Some(toml::Value::String(name)) => parse_pin_string(name).unwrap_or_else(|| {
            errors.push(format!("[pins] {} '{}' is not a valid pin", key, name));
            0
        }),
        Some(_) => {
            errors.push(format!("[pins] {} must be a pin name", key));
            0
        }
        None => {
            errors.push(format!("[pins] missing '{}'", key));
            0
        }
    }
}

/// Read a pin list; a missing key is an empty list
fn pin_list(config: &toml::Value, key: &str, max: usize, errors: &mut Vec<String>) -> Vec<u8> {
    let names = match config.get("pins").and_then(|p| p.get(key)) {
        Some(toml::Value::Array(names)) => names,
        Some(_) => {
            errors.push(format!("[pins] {} must be an array", key));
            return Vec::new();
        }
        None => return Vec::new(),
    };

    if names.len() > max {
        errors.push(format!("[pins] {} has more than {} pins", key, max));
    }

    names
        .iter()
        .filter_map(|name| match name.as_str().and_then(parse_pin_string) {
            Some(pin) => Some(pin),
            None => {
                errors.push(format!("[pins] {} entry {} is not a valid pin", key, name));
                None
            }
        })
        .collect()
}

/// Every pin used once, in a role it can serve
fn validate_pin_roles(board: &Board) {
    let mut errors = Vec::new();

    for &pin in &board.adc {
        if !ADC_PINS.contains(&pin) {
            errors.push(format!("[pins] adc gpio{} has no ADC input", pin));
        }
    }

    let digital = std::iter::once(("irq", &board.irq))
        .chain(board.mux_select.iter().map(|p| ("mux_select", p)))
        .chain(board.switch_rows.iter().map(|p| ("switch_rows", p)))
        .chain(board.switch_columns.iter().map(|p| ("switch_columns", p)))
        .chain(board.encoder_rows.iter().map(|p| ("encoder_rows", p)))
        .chain(board.encoder_columns.iter().map(|p| ("encoder_columns", p)));

    let mut used: BTreeSet<u8> = board.adc.iter().copied().collect();
    if used.len() != board.adc.len() {
        errors.push("[pins] adc lists a pin twice".to_string());
    }
    for (role, &pin) in digital {
        if BUS_PINS.contains(&pin) {
            errors.push(format!("[pins] {} gpio{} is reserved for the I2C bus", role, pin));
        } else if ADC_PINS.contains(&pin) {
            errors.push(format!("[pins] {} gpio{} is reserved for the ADC", role, pin));
        } else if !used.insert(pin) {
            errors.push(format!("[pins] {} gpio{} is already in use", role, pin));
        }
    }

    fail_on_errors("Invalid pin assignment", &errors);
}

/// Configured input counts fit the wired hardware
fn validate_capacity(board: &Board) {
    let mut errors = Vec::new();

    let positions = 1i64 << board.mux_select.len();
    let pot_capacity = board.adc.len() as i64 * positions;
    if board.pots > pot_capacity {
        errors.push(format!(
            "{} pots but only {} analog positions wired",
            board.pots, pot_capacity
        ));
    }

    let switch_capacity = (board.switch_rows.len() * board.switch_columns.len()) as i64;
    if board.switches > switch_capacity {
        errors.push(format!(
            "{} switches but the matrix has {} cells",
            board.switches, switch_capacity
        ));
    }

    if board.encoder_columns.len() % 2 != 0 {
        errors.push("encoder_columns must be (clock, data) pairs".to_string());
    }
    let encoder_capacity = (board.encoder_rows.len() * (board.encoder_columns.len() / 2)) as i64;
    if board.encoders > encoder_capacity {
        errors.push(format!(
            "{} encoders but the matrix has {} pairs",
            board.encoders, encoder_capacity
        ));
    }

    if board.pots + board.switches + board.encoders > 128 {
        errors.push("more than 128 controllers in total".to_string());
    }

    fail_on_errors("Inputs do not fit the pin map", &errors);
}

fn pin_array(pins: &[u8]) -> String {
    let list = pins
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!("&[{}]", list)
}

/// Write `$OUT_DIR/config.rs`
fn generate_config(board: &Board) {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let source = format!(
        "// Generated by build.rs from controller.toml. Do not edit.\n\
        \n\
        /// Panel configuration embedded at build time\n\
        pub const PANEL: ctlbank_core::PanelConfig = ctlbank_core::PanelConfig {{\n\
        \x20   bus_address: {bus_address:#04x},\n\
        \x20   pots: {pots},\n\
        \x20   switches: {switches},\n\
        \x20   encoders: {encoders},\n\
        \x20   adc_full_bits: {adc_full_bits},\n\
        \x20   adc_bits: {adc_bits},\n\
        \x20   adc_sample_threshold: {adc_sample_threshold},\n\
        \x20   debounce_ms: {debounce_ms},\n\
        \x20   speed_threshold_ms: {speed_threshold_ms},\n\
        \x20   fast_multiplier: {fast_multiplier},\n\
        \x20   use_multiplexer: {use_multiplexer},\n\
        }};\n\
        \n\
        pub const IRQ_PIN: u8 = {irq};\n\
        pub const ADC_PINS: &[u8] = {adc};\n\
        pub const MUX_SELECT_PINS: &[u8] = {mux_select};\n\
        pub const SWITCH_ROW_PINS: &[u8] = {switch_rows};\n\
        pub const SWITCH_COLUMN_PINS: &[u8] = {switch_columns};\n\
        pub const ENCODER_ROW_PINS: &[u8] = {encoder_rows};\n\
        pub const ENCODER_COLUMN_PINS: &[u8] = {encoder_columns};\n",
        bus_address = board.bus_address,
        pots = board.pots,
        switches = board.switches,
        encoders = board.encoders,
        adc_full_bits = ADC_FULL_BITS,
        adc_bits = board.adc_bits,
        adc_sample_threshold = board.adc_sample_threshold,
        debounce_ms = board.debounce_ms,
        speed_threshold_ms = board.speed_threshold_ms,
        fast_multiplier = board.fast_multiplier,
        use_multiplexer = !board.mux_select.is_empty(),
        irq = board.irq,
        adc = pin_array(&board.adc),
        mux_select = pin_array(&board.mux_select),
        switch_rows = pin_array(&board.switch_rows),
        switch_columns = pin_array(&board.switch_columns),
        encoder_rows = pin_array(&board.encoder_rows),
        encoder_columns = pin_array(&board.encoder_columns),
    );

    fs::write(out_dir.join("config.rs"), source).unwrap();
}

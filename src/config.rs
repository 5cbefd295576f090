/*
 *  config.rs
 *
 *  chbio - pin control for the Chumby Hacker Board
 *  (c) 2020-26 Stuart Hunter
 *
 *  Layered configuration: defaults, YAML file, command line
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use clap::{ArgAction, Parser, Subcommand, ValueHint};
use dirs_next::home_dir;
use std::{fs, path::{Path, PathBuf}};
use thiserror::Error;

use crate::display::{DisplayPins, DisplaySettings};
use crate::pinctrl::{Pin, Reclaim, Register, PINCTRL_BASE, PINCTRL_WINDOW_LEN};

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, Default)]
pub struct Config {
    pub log_level: Option<String>,     // e.g., "info" | "debug"
    /// register window
    pub device: Option<DeviceConfig>,
    /// Nokia 5110 wiring and tuning
    pub lcd: Option<LcdConfig>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, Default)]
pub struct DeviceConfig {
    pub path: Option<PathBuf>,         // physical memory device
    pub base_address: Option<u64>,     // physical address mapped at offset 0
    pub length: Option<usize>,         // bytes mapped
}

impl DeviceConfig {
    pub fn path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| PathBuf::from("/dev/mem"))
    }

    pub fn base_address(&self) -> u64 {
        self.base_address.unwrap_or(PINCTRL_BASE)
    }

    pub fn length(&self) -> usize {
        self.length.unwrap_or(PINCTRL_WINDOW_LEN)
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, Default)]
pub struct LcdConfig {
    pub sclk: Option<String>,
    pub dn: Option<String>,
    pub dc: Option<String>,
    pub rst: Option<String>,
    pub sce: Option<String>,
    pub contrast: Option<u8>,                // Vop 0..=0x7f
    pub bias: Option<u8>,                    // 0..=7
    pub temperature_coefficient: Option<u8>, // 0..=3
    pub allow_reclaim: Option<bool>,
}

impl LcdConfig {
    /// Resolve pin names, falling back to D0..D4.
    pub fn pins(&self) -> Result<DisplayPins, ConfigError> {
        let defaults = DisplayPins::default();
        let pick = |name: &Option<String>, fallback: Pin| -> Result<Pin, ConfigError> {
            match name {
                Some(n) => n.parse().map_err(|e| ConfigError::Validation(format!("lcd: {e}"))),
                None => Ok(fallback),
            }
        };
        Ok(DisplayPins {
            clock: pick(&self.sclk, defaults.clock)?,
            data: pick(&self.dn, defaults.data)?,
            mode_select: pick(&self.dc, defaults.mode_select)?,
            reset: pick(&self.rst, defaults.reset)?,
            enable: pick(&self.sce, defaults.enable)?,
        })
    }

    pub fn settings(&self) -> DisplaySettings {
        let defaults = DisplaySettings::default();
        DisplaySettings {
            contrast: self.contrast.unwrap_or(defaults.contrast),
            bias: self.bias.unwrap_or(defaults.bias),
            temperature_coefficient: self
                .temperature_coefficient
                .unwrap_or(defaults.temperature_coefficient),
            reclaim: match self.allow_reclaim {
                Some(true) => Reclaim::Allow,
                _ => defaults.reclaim,
            },
        }
    }
}

impl Config {
    pub fn device(&self) -> DeviceConfig {
        self.device.clone().unwrap_or_default()
    }

    pub fn lcd(&self) -> LcdConfig {
        self.lcd.clone().unwrap_or_default()
    }
}

/// Command line. Global options are all Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone)]
#[command(name = "chbio", version, about = "Chumby Hacker Board GPIO and Nokia 5110 LCD tool")]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, short = 'c', value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    /// Enable debug log level
    #[arg(long, short = 'v', alias = "verbose", action = ArgAction::SetTrue)]
    pub debug: bool,
    #[arg(long)]
    pub log_level: Option<String>,
    /// Physical memory device
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub device: Option<PathBuf>,
    #[arg(long, value_parser = parse_u64)]
    pub base_address: Option<u64>,
    #[arg(long, value_parser = parse_usize)]
    pub window_length: Option<usize>,
    /// LCD pins as sclk,dn,dc,rst,sce
    #[arg(long)]
    pub lcd_pins: Option<String>,
    #[arg(long, value_parser = parse_u8)]
    pub contrast: Option<u8>,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Show pin roles
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Configure a pin as output
    Out {
        pin: String,
        #[arg(long)]
        pull: bool,
    },
    /// Configure a pin as input
    In {
        pin: String,
        #[arg(long)]
        pull: bool,
    },
    /// Configure a pin as output and drive it
    Write {
        pin: String,
        #[arg(value_parser = parse_level, action = ArgAction::Set)]
        level: bool,
        #[arg(long)]
        pull: bool,
    },
    /// Configure a pin as input and sample it
    Read {
        pin: String,
        #[arg(long)]
        pull: bool,
    },
    /// Configure a pin as output and flip it
    Toggle { pin: String },
    /// Read a PINCTRL register by name
    RegRead { name: String },
    /// Write a PINCTRL register by name
    RegWrite {
        name: String,
        #[arg(value_parser = parse_u32)]
        value: u32,
    },
    /// Draw text on the LCD
    LcdText {
        text: String,
        #[arg(long, default_value_t = 0)]
        column: u8,
        #[arg(long, default_value_t = 0)]
        row: u8,
        /// seconds to keep the panel up before it is blanked and released
        #[arg(long, default_value_t = 10)]
        hold: u64,
    },
    /// Write raw column bytes to the LCD
    LcdBytes {
        #[arg(value_parser = parse_u8, num_args = 1..)]
        bytes: Vec<u8>,
        #[arg(long, default_value_t = 0)]
        column: u8,
        #[arg(long, default_value_t = 0)]
        row: u8,
        #[arg(long, default_value_t = 10)]
        hold: u64,
    },
    /// Initialize and blank the LCD
    LcdClear,
}

fn parse_number(s: &str) -> Result<u64, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16),
        None => s.replace('_', "").parse::<u64>(),
    };
    parsed.map_err(|e| format!("invalid number {s:?}: {e}"))
}

fn parse_u64(s: &str) -> Result<u64, String> {
    parse_number(s)
}

fn parse_usize(s: &str) -> Result<usize, String> {
    usize::try_from(parse_number(s)?).map_err(|e| e.to_string())
}

fn parse_u32(s: &str) -> Result<u32, String> {
    u32::try_from(parse_number(s)?).map_err(|e| e.to_string())
}

fn parse_u8(s: &str) -> Result<u8, String> {
    u8::try_from(parse_number(s)?).map_err(|e| e.to_string())
}

fn parse_level(s: &str) -> Result<bool, String> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "high" | "on" | "true" => Ok(true),
        "0" | "low" | "off" | "false" => Ok(false),
        _ => Err(format!("invalid level {s:?}, expected 1|0|high|low|on|off")),
    }
}

/// Public entry point: read YAML, merge CLI overrides, validate.
pub fn load(cli: &Cli) -> Result<Config, ConfigError> {
    // 1) defaults (from `Default` impl)
    let mut cfg = Config::default();

    // 2) YAML file (explicit path or search)
    if let Some(p) = cli.config.as_ref() {
        if p.exists() {
            let y = read_yaml(p)?;
            merge(&mut cfg, y);
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    } else if let Some(p) = find_config_file() {
        let y = read_yaml(&p)?;
        merge(&mut cfg, y);
    }

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli)?;

    // 4) Validate
    validate(&cfg)?;

    if cli.dump_config {
        let s = serde_yaml::to_string(&cfg)?;
        println!("{s}");
        std::process::exit(0);
    }

    Ok(cfg)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    if let Some(home) = home_dir() {
        let p = home.join(".config/chbio/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/chbio.yaml");
        if p.exists() { return Some(p) }
    }
    for candidate in &["chbio.yaml", "config.yaml", "config/chbio.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&s)?;
    Ok(cfg)
}

/// Shallow merge `src` into `dst`, Option-by-Option.
fn merge(dst: &mut Config, src: Config) {
    if src.log_level.is_some() { dst.log_level = src.log_level; }
    match (&mut dst.device, src.device) {
        (None, Some(c)) => dst.device = Some(c),
        (Some(d), Some(s)) => merge_device(d, s),
        _ => {}
    }
    match (&mut dst.lcd, src.lcd) {
        (None, Some(c)) => dst.lcd = Some(c),
        (Some(d), Some(s)) => merge_lcd(d, s),
        _ => {}
    }
}

fn merge_device(dst: &mut DeviceConfig, src: DeviceConfig) {
    if src.path.is_some()          { dst.path = src.path; }
    if src.base_address.is_some()  { dst.base_address = src.base_address; }
    if src.length.is_some()        { dst.length = src.length; }
}

fn merge_lcd(dst: &mut LcdConfig, src: LcdConfig) {
    if src.sclk.is_some()          { dst.sclk = src.sclk; }
    if src.dn.is_some()            { dst.dn = src.dn; }
    if src.dc.is_some()            { dst.dc = src.dc; }
    if src.rst.is_some()           { dst.rst = src.rst; }
    if src.sce.is_some()           { dst.sce = src.sce; }
    if src.contrast.is_some()      { dst.contrast = src.contrast; }
    if src.bias.is_some()          { dst.bias = src.bias; }
    if src.temperature_coefficient.is_some() {
        dst.temperature_coefficient = src.temperature_coefficient;
    }
    if src.allow_reclaim.is_some() { dst.allow_reclaim = src.allow_reclaim; }
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) -> Result<(), ConfigError> {
    if cli.log_level.is_some() { cfg.log_level = cli.log_level.clone(); }

    if cli.device.is_some() || cli.base_address.is_some() || cli.window_length.is_some() {
        let device = cfg.device.get_or_insert_with(DeviceConfig::default);
        if cli.device.is_some()        { device.path = cli.device.clone(); }
        if cli.base_address.is_some()  { device.base_address = cli.base_address; }
        if cli.window_length.is_some() { device.length = cli.window_length; }
    }

    if cli.lcd_pins.is_some() || cli.contrast.is_some() {
        let lcd = cfg.lcd.get_or_insert_with(LcdConfig::default);
        if let Some(list) = cli.lcd_pins.as_deref() {
            let names: Vec<String> = list.split(',').map(|s| s.trim().to_string()).collect();
            let [sclk, dn, dc, rst, sce]: [String; 5] = names.try_into().map_err(|_| {
                ConfigError::Validation("--lcd-pins expects five names: sclk,dn,dc,rst,sce".into())
            })?;
            lcd.sclk = Some(sclk);
            lcd.dn = Some(dn);
            lcd.dc = Some(dc);
            lcd.rst = Some(rst);
            lcd.sce = Some(sce);
        }
        if cli.contrast.is_some() { lcd.contrast = cli.contrast; }
    }
    Ok(())
}

/// Put any invariants here (required fields, ranges, etc.)
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    let device = cfg.device();
    if device.base_address() % 4 != 0 {
        return Err(ConfigError::Validation("device base_address must be word aligned".into()));
    }
    let span = Register::window_span();
    if device.length() < span {
        return Err(ConfigError::Validation(format!(
            "device length must be at least {span:#x} bytes"
        )));
    }

    let lcd = cfg.lcd();
    if lcd.contrast.is_some_and(|c| c > 0x7f) {
        return Err(ConfigError::Validation("lcd contrast must be 0..=127".into()));
    }
    if lcd.bias.is_some_and(|b| b > 7) {
        return Err(ConfigError::Validation("lcd bias must be 0..=7".into()));
    }
    if lcd.temperature_coefficient.is_some_and(|t| t > 3) {
        return Err(ConfigError::Validation("lcd temperature_coefficient must be 0..=3".into()));
    }
    if let Some(pin) = lcd.pins()?.duplicate() {
        return Err(ConfigError::Validation(format!("lcd pin {pin} assigned twice")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["chbio"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.device().path(), PathBuf::from("/dev/mem"));
        assert_eq!(cfg.device().base_address(), 0x8001_8000);
        assert_eq!(cfg.lcd().pins().unwrap(), DisplayPins::default());
        assert_eq!(cfg.lcd().settings(), DisplaySettings::default());
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn test_yaml_merge_then_cli_override() {
        let yaml = "log_level: debug\nlcd:\n  sclk: D5\n  contrast: 80\n  allow_reclaim: true\n";
        let file: Config = serde_yaml::from_str(yaml).unwrap();
        let mut cfg = Config::default();
        merge(&mut cfg, file);

        let args = cli(&["--contrast", "0x30", "--device", "/tmp/mem", "status"]);
        apply_cli_overrides(&mut cfg, &args).unwrap();
        validate(&cfg).unwrap();

        assert_eq!(cfg.log_level.as_deref(), Some("debug"));
        assert_eq!(cfg.device().path(), PathBuf::from("/tmp/mem"));
        let lcd = cfg.lcd();
        assert_eq!(lcd.pins().unwrap().clock, Pin::D5);
        let settings = lcd.settings();
        assert_eq!(settings.contrast, 0x30);
        assert_eq!(settings.reclaim, Reclaim::Allow);
    }

    #[test]
    fn test_lcd_pins_override() {
        let mut cfg = Config::default();
        apply_cli_overrides(&mut cfg, &cli(&["--lcd-pins", "D7,D6,D5,SCL,SDA", "lcd-clear"])).unwrap();
        let pins = cfg.lcd().pins().unwrap();
        assert_eq!(pins.as_array(), [Pin::D7, Pin::D6, Pin::D5, Pin::Scl, Pin::Sda]);

        let mut cfg = Config::default();
        assert!(apply_cli_overrides(&mut cfg, &cli(&["--lcd-pins", "D1,D2"])).is_err());
    }

    #[test]
    fn test_validation_failures() {
        let mut cfg = Config::default();
        cfg.lcd = Some(LcdConfig { bias: Some(9), ..LcdConfig::default() });
        assert!(matches!(validate(&cfg), Err(ConfigError::Validation(_))));

        cfg.lcd = Some(LcdConfig { sclk: Some("D1".into()), ..LcdConfig::default() });
        assert!(matches!(validate(&cfg), Err(ConfigError::Validation(m)) if m.contains("twice")));

        cfg.lcd = Some(LcdConfig { rst: Some("X9".into()), ..LcdConfig::default() });
        assert!(matches!(validate(&cfg), Err(ConfigError::Validation(m)) if m.contains("X9")));

        cfg.lcd = None;
        cfg.device = Some(DeviceConfig { length: Some(0x100), ..DeviceConfig::default() });
        assert!(validate(&cfg).is_err());

        cfg.device = Some(DeviceConfig { base_address: Some(0x8001_8002), ..DeviceConfig::default() });
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn test_value_parsers() {
        assert_eq!(parse_u32("0x8001_8000"), Ok(0x8001_8000));
        assert_eq!(parse_u8("255"), Ok(255));
        assert!(parse_u8("256").is_err());
        assert_eq!(parse_level("HIGH"), Ok(true));
        assert_eq!(parse_level("0"), Ok(false));
        assert!(parse_level("maybe").is_err());
    }

    #[test]
    fn test_subcommand_parsing() {
        match cli(&["write", "D5", "on", "--pull"]).command {
            Some(Command::Write { pin, level, pull }) => {
                assert_eq!(pin, "D5");
                assert!(level);
                assert!(pull);
            }
            other => panic!("unexpected {other:?}"),
        }
        match cli(&["lcd-bytes", "0xff", "0x81", "--row", "2"]).command {
            Some(Command::LcdBytes { bytes, row, column, hold }) => {
                assert_eq!(bytes, vec![0xff, 0x81]);
                assert_eq!((column, row, hold), (0, 2, 10));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}

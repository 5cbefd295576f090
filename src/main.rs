/*
 *  main.rs
 *
 *  chbio - pin control for the Chumby Hacker Board
 *  (c) 2020-26 Stuart Hunter
 *
 *  Command line front end for pin control and the LCD
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

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use embedded_hal::digital::{InputPin, OutputPin, PinState};
use env_logger::Env;
use log::{debug, info};

use chbio::config::{self, Cli, Command, Config};
use chbio::{Pin, Register, Session};

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli).context("loading configuration")?;

    // Initialize the logger with the appropriate level based on debug flag
    let level = if cli.debug {
        "debug".to_string()
    } else {
        cfg.log_level.clone().unwrap_or_else(|| "info".to_string())
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();

    info!(
        "{} v.{} built {} ({})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        BUILD_DATE,
        BUILD_PROFILE
    );

    let device = cfg.device();
    let mut session = Session::open(&device)
        .with_context(|| format!("opening register window on {}", device.path().display()))?;

    let command = cli.command.clone().unwrap_or(Command::Status { json: false });
    debug!("running {:?}", command);
    let outcome = run(&mut session, &cfg, command);
    let closed = session.shutdown().context("shutting down session");
    outcome?;
    closed
}

fn run(session: &mut Session, cfg: &Config, command: Command) -> Result<()> {
    match command {
        Command::Status { json } => print_status(session, json)?,

        Command::Out { pin, pull } => {
            let pin = parse_pin(&pin)?;
            session.controller().configure_output(pin, pull)?;
            print_status(session, false)?;
        }

        Command::In { pin, pull } => {
            let pin = parse_pin(&pin)?;
            session.controller().configure_input(pin, pull)?;
            print_status(session, false)?;
        }

        Command::Write { pin, level, pull } => {
            let pin = parse_pin(&pin)?;
            let ctl = session.controller();
            ctl.configure_output(pin, pull)?;
            ctl.output(pin)?.set_state(PinState::from(level))?;
            println!("{pin} <- {}", level as u8);
        }

        Command::Read { pin, pull } => {
            let pin = parse_pin(&pin)?;
            let ctl = session.controller();
            ctl.configure_input(pin, pull)?;
            let high = ctl.input(pin)?.is_high()?;
            println!("{pin} = {}", high as u8);
        }

        Command::Toggle { pin } => {
            let pin = parse_pin(&pin)?;
            let ctl = session.controller();
            ctl.configure_output(pin, false)?;
            ctl.output(pin)?.toggle()?;
            println!("{pin} toggled");
        }

        Command::RegRead { name } => {
            let reg: Register = name.parse()?;
            let value = session.controller().read_register(reg);
            println!("{reg} ({:#05x}) = {value:#010x}", reg.offset());
        }

        Command::RegWrite { name, value } => {
            let reg: Register = name.parse()?;
            session.controller().write_register(reg, value);
            println!("{reg} ({:#05x}) <- {value:#010x}", reg.offset());
        }

        Command::LcdText { text, column, row, hold } => {
            start_display(session, cfg)?;
            let mut lcd = session.display()?;
            lcd.set_cursor(column, row)?;
            let drawn = lcd.draw_text(&text)?;
            info!("drew {} of {} characters", drawn, text.chars().count());
            hold_display(hold);
        }

        Command::LcdBytes { bytes, column, row, hold } => {
            start_display(session, cfg)?;
            let mut lcd = session.display()?;
            lcd.set_cursor(column, row)?;
            lcd.write_data(&bytes)?;
            hold_display(hold);
        }

        Command::LcdClear => {
            start_display(session, cfg)?;
            session.display()?.clear()?;
        }
    }
    Ok(())
}

fn parse_pin(name: &str) -> Result<Pin> {
    name.parse::<Pin>().with_context(|| format!("pin {name:?}"))
}

fn start_display(session: &mut Session, cfg: &Config) -> Result<()> {
    let lcd = cfg.lcd();
    session
        .start_display(lcd.pins()?, lcd.settings())
        .context("starting LCD")
}

fn hold_display(secs: u64) {
    if secs > 0 {
        info!("holding display for {}s", secs);
        std::thread::sleep(Duration::from_secs(secs));
    }
}

fn print_status(session: &Session, json: bool) -> Result<()> {
    let status = session.status();
    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("{status}");
    }
    Ok(())
}

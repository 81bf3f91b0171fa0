use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use xbee_serial::config::{Config, ConfigLoader};
use xbee_serial::frontend::{render, Chat, Menu};
use xbee_serial::{
    AppResult, AtCommand, CommandMode, CommandModeResult, PortSession,
};

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Drive an XBee radio's AT command mode over a serial line.",
    long_about = "Opens a serial device in raw mode, performs the '+++' guard handshake and runs AT commands. One-shot subcommands exit non-zero on failure; 'menu' and 'chat' keep running."
)]
struct Args {
    /// Configuration file (overrides the standard lookup).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Serial device path or alias; empty selects /dev/ttyUSB0.
    #[arg(short, long, global = true)]
    device: Option<String>,

    /// Line speed in bits per second.
    #[arg(short, long, global = true)]
    baud: Option<u32>,

    /// Overall response deadline in milliseconds; 0 waits forever.
    #[arg(long, global = true)]
    deadline_ms: Option<u64>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send the guard sequence and expect OK.
    Enter,
    /// Send ATCN and expect OK.
    Exit,
    /// Enter command mode, run one AT command and exit again.
    Query {
        /// Command text without the trailing CR, e.g. ATID.
        command: String,
    },
    /// Query the module's network address (ATMY).
    Address,
    /// Numbered interactive menu.
    Menu,
    /// Relay lines between the keyboard and the module.
    Chat,
    /// List serial ports present on this host.
    ListPorts,
    /// Print the effective configuration as TOML.
    Config,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(2);
        }
    };
    xbee_serial::logging::init(&config.logging);

    match run(&args, &config) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            let result = CommandModeResult::failure(e.kind(), e.code(), &e);
            eprintln!("{}", render(&result, args.json));
            ExitCode::FAILURE
        }
    }
}

/// Load the configuration file and fold the command-line overrides into it.
fn load_config(args: &Args) -> AppResult<Config> {
    let loader = match &args.config {
        Some(path) => ConfigLoader::load_from(path)?,
        None => ConfigLoader::load()?,
    };
    debug!(path = ?loader.config_path, "configuration loaded");

    let mut config = loader.into_config();
    if let Some(device) = &args.device {
        config.serial.device = device.clone();
    }
    if let Some(baud) = args.baud {
        config.serial.baud = baud;
    }
    if let Some(deadline_ms) = args.deadline_ms {
        config.serial.response_deadline_ms = deadline_ms;
    }
    config.validate()?;
    Ok(config)
}

fn open_session(config: &Config, device: &str) -> AppResult<PortSession> {
    let path = config.serial.resolve_device(device);
    Ok(PortSession::open(&path, config.serial.port_config()?)?)
}

/// Run one subcommand. `Ok(false)` reports a failed one-shot operation already printed.
fn run(args: &Args, config: &Config) -> AppResult<bool> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let result = match &args.command {
        Command::ListPorts => return list_ports(&mut out, args.json).map(|()| true),
        Command::Config => {
            let text = toml::to_string_pretty(config).map_err(xbee_serial::ConfigError::from)?;
            write!(out, "{text}")?;
            return Ok(true);
        }
        Command::Menu => {
            let port_config = config.serial.port_config()?;
            let mut menu = Menu::new(
                |path: &str| PortSession::open(&config.serial.resolve_device(path), port_config.clone()),
                args.json,
            );
            menu.open_device(&config.serial.device, &mut out)?;
            let stdin = io::stdin();
            menu.run(stdin.lock(), &mut out)?;
            return Ok(true);
        }
        Command::Chat => {
            let mut session = open_session(config, &config.serial.device)?;
            let mut chat = Chat::new(&mut session, &mut out, config.chat.show_timestamps);
            chat.run()?;
            return Ok(true);
        }
        Command::Enter => {
            let mut session = open_session(config, &config.serial.device)?;
            let mut protocol = CommandMode::for_session(&session);
            CommandModeResult::from_unit("enter", &protocol.enter_command_mode(&mut session))
        }
        Command::Exit => {
            let mut session = open_session(config, &config.serial.device)?;
            let mut protocol = CommandMode::for_session(&session);
            CommandModeResult::from_unit("exit", &protocol.exit_command_mode(&mut session))
        }
        Command::Query { command } => {
            let command = AtCommand::new(command.as_str())?;
            let mut session = open_session(config, &config.serial.device)?;
            let mut protocol = CommandMode::for_session(&session);
            CommandModeResult::from_query(
                format!("query {command}"),
                &protocol.query(&mut session, &command),
            )
        }
        Command::Address => {
            let mut session = open_session(config, &config.serial.device)?;
            let mut protocol = CommandMode::for_session(&session);
            CommandModeResult::from_query("address", &protocol.network_address(&mut session))
        }
    };

    writeln!(out, "{}", render(&result, args.json))?;
    Ok(result.success)
}

fn list_ports<W: Write>(out: &mut W, json: bool) -> AppResult<()> {
    let ports = serialport::available_ports().map_err(io::Error::from)?;

    if json {
        let names: Vec<_> = ports
            .iter()
            .map(|p| serde_json::json!({ "port_name": p.port_name }))
            .collect();
        writeln!(out, "{}", serde_json::to_string(&names)?)?;
        return Ok(());
    }

    if ports.is_empty() {
        writeln!(out, "No serial ports found.")?;
    }
    for port in ports {
        writeln!(out, "{}", port.port_name)?;
    }
    Ok(())
}

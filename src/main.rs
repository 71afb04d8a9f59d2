//! Entry point for the **acmectl** command.
//!
//! ```text
//! acmectl [--win <id>] <command> [args…]
//! ```
//!
//! Without `--win` the target window is taken from `$winid`, which acme sets
//! for every command run from inside a window.

use acmectl::config::Config;
use acmectl::error::AcmeError;
use acmectl::ninep::relay::EventRelay;
use acmectl::window::{Window, WindowId};
use log::{error, info};

const USAGE: &str = "usage: acmectl [--win <id>] <command> [args...]

commands:
  read <file>           print a control file
  write <file> <text>   write text (plus a newline) to a control file
  clean | dirty         set the modified indicator
  cleartag              remove custom tags
  get | put             reload from / save to disk
  show                  scroll dot into view
  name                  print the window name
  tags                  print the name and custom tags
  body                  print the body
  events                print events until the stream ends";

/// Resolve the config directory (`$XDG_CONFIG_HOME/acmectl`).
fn config_dir() -> std::path::PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        format!("{}/.config", home)
    });
    std::path::PathBuf::from(base).join("acmectl")
}

/// Try to load the config from `$XDG_CONFIG_HOME/acmectl/config.json`,
/// falling back to compiled-in defaults.
fn load_config() -> Config {
    let path = config_dir().join("config.json");
    match Config::load(&path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            cfg
        }
        Err(e) => {
            info!("no config file ({}), using defaults", e);
            Config::default()
        }
    }
}

/// Parsed command line.
struct Invocation {
    window: Option<WindowId>,
    command: String,
    args: Vec<String>,
}

fn parse_args(mut argv: impl Iterator<Item = String>) -> Result<Invocation, String> {
    let mut window = None;
    let mut command = None;
    let mut args = Vec::new();

    while let Some(arg) = argv.next() {
        match arg.as_str() {
            "--win" | "-w" if command.is_none() => {
                let id = argv.next().ok_or("--win needs a window id")?;
                window = Some(WindowId::new(id).map_err(|e| e.to_string())?);
            }
            "-h" | "--help" if command.is_none() => return Err(USAGE.into()),
            _ if command.is_none() => command = Some(arg),
            _ => args.push(arg),
        }
    }

    Ok(Invocation {
        window,
        command: command.ok_or(USAGE)?,
        args,
    })
}

fn main() {
    env_logger::init();

    let invocation = match parse_args(std::env::args().skip(1)) {
        Ok(inv) => inv,
        Err(msg) => {
            eprintln!("{}", msg);
            std::process::exit(2);
        }
    };

    let config = load_config();
    if let Err(e) = run(invocation, &config) {
        error!("{}", e);
        eprintln!("acmectl: {}", e);
        std::process::exit(1);
    }
}

fn run(inv: Invocation, config: &Config) -> Result<(), AcmeError> {
    if inv.command == "events" {
        return print_events(inv.window, config);
    }

    let win = Window::open(inv.window, config)?;
    match (inv.command.as_str(), inv.args.as_slice()) {
        ("read", [file]) => print!("{}", win.read(file)?),
        ("write", [file, text @ ..]) if !text.is_empty() => {
            win.write(file, &format!("{}\n", text.join(" ")))?
        }
        ("clean", []) => win.mark_clean()?,
        ("dirty", []) => win.mark_dirty()?,
        ("cleartag", []) => win.clear_tags()?,
        ("get", []) => win.reload()?,
        ("put", []) => win.save()?,
        ("show", []) => win.show()?,
        ("name", []) => println!("{}", win.window_name()?),
        ("tags", []) => {
            let (name, tags) = win.name_and_tags()?;
            println!("{}", name.trim());
            for tag in tags {
                println!("{}", tag);
            }
        }
        ("body", []) => print!("{}", win.body()?),
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }
    Ok(())
}

/// Stream events to stdout, parsed when they parse.
fn print_events(window: Option<WindowId>, config: &Config) -> Result<(), AcmeError> {
    let relay = EventRelay::open(window, config)?;
    info!("listening for events on window {}", relay.window());
    for event in relay {
        let event = event?;
        match event.parse() {
            Ok(record) => println!("{:?}", record),
            Err(_) => println!("{}", event),
        }
    }
    info!("event stream closed, exiting");
    Ok(())
}

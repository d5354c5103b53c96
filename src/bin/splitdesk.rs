use std::io::Write;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use splitdesk::common::config::{Config, config_file};
use splitdesk::common::log;
use splitdesk::layout_engine::{
    CreateOutcome, Direction, Orientation, ResizeOutcome, SplitOutcome, Viewport, WindowManager,
};
use splitdesk::model::{NodeId, WindowType, WorkspaceStore};
use splitdesk::storage::{FileStorage, Persister};
use splitdesk::terminal::builtins::ThreadRngRoller;
use splitdesk::terminal::{
    Announcer, CommandContext, CommandOutput, CommandRegistry, User, execute_command, tokenize,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

#[derive(Parser)]
#[command(version, about = "Tiled virtual desktop with an embedded command terminal")]
struct Cli {
    /// Path to configuration file to use (overrides default).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory session state is stored in (overrides the config).
    #[arg(long, value_name = "PATH")]
    data_dir: Option<PathBuf>,

    /// Check the configuration file and exit.
    #[arg(long)]
    validate: bool,

    /// Viewport size used for minimum-size checks.
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_viewport)]
    viewport: Option<Viewport>,

    /// Name commands run as.
    #[arg(long, default_value = "guest")]
    user: String,

    /// Run commands with admin rights.
    #[arg(long)]
    admin: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one terminal command line against the saved session and exit.
    Exec {
        #[arg(value_name = "LINE")]
        line: String,
    },
}

fn parse_viewport(s: &str) -> Result<Viewport, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let parse = |v: &str| match v.trim().parse::<f64>() {
        Ok(n) if n > 0.0 && n.is_finite() => Ok(n),
        _ => Err(format!("invalid viewport dimension {v:?}")),
    };
    Ok(Viewport::new(parse(w)?, parse(h)?))
}

struct StdoutAnnouncer;

impl Announcer for StdoutAnnouncer {
    fn announce(&mut self, from: &User, text: &str) -> anyhow::Result<()> {
        println!("*** Announcement from {}: {text}", from.name);
        Ok(())
    }
}

struct Session {
    wm: WindowManager,
    registry: CommandRegistry,
    user: User,
    storage: Arc<FileStorage>,
    announcer: StdoutAnnouncer,
}

enum Flow {
    Continue,
    Quit,
}

fn main() {
    sigpipe::reset();
    let opt = Cli::parse();
    log::init_logging();

    let config_path = opt.config.clone().unwrap_or_else(config_file);
    let config = match Config::read_or_default(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {e:#}", config_path.display());
            process::exit(1);
        }
    };

    if opt.validate {
        let issues = config.validate();
        if issues.is_empty() {
            println!("Config validation passed");
        } else {
            for issue in issues {
                eprintln!("{}", issue);
            }
            process::exit(1);
        }
        return;
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("failed to start runtime: {e}");
            process::exit(1);
        }
    };
    if let Err(e) = runtime.block_on(run(opt, config)) {
        eprintln!("{e:#}");
        process::exit(1);
    }
}

async fn run(opt: Cli, config: Config) -> anyhow::Result<()> {
    let data_dir = opt.data_dir.clone().unwrap_or_else(|| config.settings.data_dir());
    let storage = Arc::new(FileStorage::new(&data_dir));
    info!(dir = %data_dir.display(), "loading session");

    let store = WorkspaceStore::restore(&*storage, &config.workspaces).await;
    let mut wm = WindowManager::with_store(store, config.layout.clone())
        .with_welcome(config.terminal.welcome.clone());
    if let Some(viewport) = opt.viewport {
        wm.set_viewport(viewport);
    }
    wm.set_flash_handler(|id| eprintln!("! window {id} has no room to split"));

    let user = if opt.admin { User::admin(opt.user.as_str()) } else { User::new(opt.user.as_str()) };
    let mut session = Session {
        wm,
        registry: CommandRegistry::with_builtins(&config.terminal.aliases),
        user,
        storage: Arc::clone(&storage),
        announcer: StdoutAnnouncer,
    };

    match opt.command {
        Some(Commands::Exec { line }) => {
            let output = session.execute_line(&line);
            print_output(&output);
        }
        None => {
            session.wm.attach_persister(Persister::spawn(Arc::clone(&storage), config.settings.debounce()));
            session.interactive().await?;
        }
    }

    session.wm.detach_persister().await;
    session.wm.save(&*storage).await.context("saving session")?;
    Ok(())
}

impl Session {
    async fn interactive(&mut self) -> anyhow::Result<()> {
        println!("splitdesk v{} - type 'help' for commands, ':help' for window actions", env!("CARGO_PKG_VERSION"));
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("{}> ", self.wm.workspace().name);
            std::io::stdout().flush()?;
            let Some(line) = lines.next_line().await? else { break };
            let line = line.trim();
            if let Some(action) = line.strip_prefix(':') {
                if let Flow::Quit = self.action(action).await {
                    break;
                }
                continue;
            }
            if line.is_empty() {
                continue;
            }
            let output = self.execute_line(line);
            print_output(&output);
        }
        Ok(())
    }

    fn execute_line(&mut self, line: &str) -> CommandOutput {
        let node = self.wm.active_window();
        let mut dice = ThreadRngRoller;
        let output = {
            let mut ctx = CommandContext::new()
                .with_user(self.user.clone())
                .with_windows(&mut self.wm)
                .with_announcer(&mut self.announcer)
                .with_dice(&mut dice);
            if let Some(id) = node {
                ctx = ctx.with_node(id);
            }
            execute_command(&self.registry, line, &mut ctx)
        };
        if let Some(id) = node {
            self.record_in_terminal(id, line, &output);
        }
        output
    }

    /// Appends the line and its output to the terminal the line was typed in.
    fn record_in_terminal(&mut self, id: NodeId, line: &str, output: &CommandOutput) {
        let Some(leaf) = self.wm.window(id) else { return };
        if leaf.window_type != WindowType::Terminal {
            return;
        }
        let mut state = leaf.state.clone();
        let Some(fields) = state.as_object_mut() else { return };

        let history = fields.entry("history").or_insert_with(|| json!([]));
        if let Some(history) = history.as_array_mut() {
            history.push(Value::String(line.to_string()));
        }
        let cleared = matches!(output, CommandOutput::Structured { kind, .. } if kind == "clear");
        let out = fields.entry("output").or_insert_with(|| json!([]));
        if let Some(out) = out.as_array_mut() {
            if cleared {
                out.clear();
            } else {
                out.push(Value::String(format!("> {line}")));
                out.extend(output.to_lines().into_iter().map(Value::String));
            }
        }
        self.wm.update_window_state(id, state);
    }

    async fn action(&mut self, action: &str) -> Flow {
        let tokens = tokenize(action);
        let Some((name, args)) = tokens.split_first() else {
            return Flow::Continue;
        };
        let arg = |i: usize| args.get(i).map(String::as_str);

        match name.to_lowercase().as_str() {
            "q" | "quit" | "exit" => return Flow::Quit,
            "help" => {
                for line in ACTION_HELP {
                    println!("{line}");
                }
            }
            "new" => {
                let window_type = match arg(0).map(str::parse::<WindowType>) {
                    None => WindowType::Terminal,
                    Some(Ok(window_type)) => window_type,
                    Some(Err(_)) => {
                        println!("Unknown window type. Available: {}", WindowType::names().join(", "));
                        return Flow::Continue;
                    }
                };
                match self.wm.create_new_window(window_type) {
                    CreateOutcome::Created(id) => println!("Opened {window_type} window {id}"),
                    CreateOutcome::Refused { .. } => println!("No room for another window"),
                }
            }
            "split" => {
                let Some(target) = self.wm.active_window() else {
                    println!("No active window");
                    return Flow::Continue;
                };
                let orientation = match arg(0).unwrap_or("h").parse::<Orientation>() {
                    Ok(orientation) => orientation,
                    Err(e) => {
                        println!("{e}");
                        return Flow::Continue;
                    }
                };
                match self.wm.split_window(target, orientation, None) {
                    SplitOutcome::Applied { new_leaf, .. } => println!("Split {target}, new window {new_leaf}"),
                    SplitOutcome::Refused { undersized } => {
                        println!("Refused: {} window(s) would be too small", undersized.len())
                    }
                    SplitOutcome::NotFound => println!("Window {target} not found"),
                }
            }
            "close" => {
                let target = match arg(0) {
                    Some(raw) => raw.parse::<NodeId>().ok(),
                    None => self.wm.active_window(),
                };
                match target {
                    Some(id) if self.wm.close_window(id) => {
                        let storage = Arc::clone(&self.storage);
                        self.wm.discard_window_records(&*storage, id).await;
                        println!("Closed {id}");
                    }
                    _ => println!("Nothing to close"),
                }
            }
            "focus" => {
                let Some(raw) = arg(0) else {
                    println!("Usage: :focus <left|right|up|down|id>");
                    return Flow::Continue;
                };
                if let Ok(direction) = raw.parse::<Direction>() {
                    match self.wm.navigate_to_window(direction) {
                        Some(id) => println!("Focused {id}"),
                        None => println!("No window {direction}"),
                    }
                } else if let Ok(id) = raw.parse::<NodeId>()
                    && self.wm.focus_window(id)
                {
                    println!("Focused {id}");
                } else {
                    println!("Unknown window or direction {raw:?}");
                }
            }
            "resize-mode" => {
                let enabled = self.wm.toggle_resize_mode();
                println!("Resize mode {}", if enabled { "on" } else { "off" });
            }
            "resize" => {
                let Some(Ok(direction)) = arg(0).map(str::parse::<Direction>) else {
                    println!("Usage: :resize <left|right|up|down>");
                    return Flow::Continue;
                };
                match self.wm.resize_active_window(direction) {
                    ResizeOutcome::Disabled => println!("Resize mode is off (:resize-mode)"),
                    ResizeOutcome::NoActiveWindow => println!("No active window"),
                    ResizeOutcome::Unchanged => println!("Nothing to resize {direction}"),
                    ResizeOutcome::Applied { undersized, .. } if !undersized.is_empty() => {
                        println!("Resized; {} window(s) below minimum size", undersized.len())
                    }
                    ResizeOutcome::Applied { .. } => println!("Resized"),
                }
            }
            "swap" => {
                let ids = (arg(0).map(str::parse::<NodeId>), arg(1).map(str::parse::<NodeId>));
                let (Some(Ok(a)), Some(Ok(b))) = ids else {
                    println!("Usage: :swap <id> <id>");
                    return Flow::Continue;
                };
                let storage = Arc::clone(&self.storage);
                if self.wm.swap_windows(&*storage, a, b).await {
                    println!("Swapped {a} and {b}");
                } else {
                    println!("Cannot swap {a} and {b}");
                }
            }
            "ws" => {
                let switched = match arg(0) {
                    Some("next") => self.wm.next_workspace(),
                    Some("prev") => self.wm.prev_workspace(),
                    Some(raw) => match raw.parse::<usize>() {
                        Ok(n) if n >= 1 => self.wm.switch_workspace(n - 1),
                        _ => false,
                    },
                    None => {
                        for (i, ws) in self.wm.store().workspaces().iter().enumerate() {
                            let mark = if i == self.wm.store().active_index() { "*" } else { " " };
                            println!("{mark} {} {} ({} windows)", i + 1, ws.name, ws.window_ids().len());
                        }
                        return Flow::Continue;
                    }
                };
                if switched {
                    println!("Now on {}", self.wm.workspace().name);
                }
            }
            "tree" => print!("{}", self.wm.draw_tree()),
            "bounds" => {
                for wb in self.wm.bounds() {
                    let b = wb.bounds;
                    println!(
                        "{} left={:.1} top={:.1} width={:.1} height={:.1}",
                        wb.id, b.left, b.top, b.width, b.height
                    );
                }
            }
            "save" => match self.wm.save(&*self.storage).await {
                Ok(()) => println!("Saved"),
                Err(e) => println!("Save failed: {e:#}"),
            },
            other => println!("Unknown action :{other} (try :help)"),
        }
        Flow::Continue
    }
}

const ACTION_HELP: &[&str] = &[
    ":new [type]          open a window next to the active one",
    ":split [h|v]         split the active window",
    ":close [id]          close a window",
    ":focus <dir|id>      move focus",
    ":resize-mode         toggle resize mode",
    ":resize <dir>        resize the active window",
    ":swap <id> <id>      swap two windows",
    ":ws [n|next|prev]    list or switch workspaces",
    ":tree / :bounds      show the layout",
    ":save / :quit",
];

fn print_output(output: &CommandOutput) {
    if let CommandOutput::Structured { kind, .. } = output
        && kind == "clear"
    {
        print!("\x1B[2J\x1B[H");
        return;
    }
    for line in output.to_lines() {
        println!("{line}");
    }
}

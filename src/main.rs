use std::io;
use std::time::Duration;

use clap::Parser;
use crossterm::event::{Event, MouseButton, MouseEventKind};
use ratatui::layout::Rect;

use layer_stack::config::{ConfigPatch, GlobalConfig};
use layer_stack::demo::{DemoApp, DemoOptions};
use layer_stack::drivers::InputDriver;
use layer_stack::drivers::console::{ConsoleInputDriver, ConsoleOutputDriver};
use layer_stack::event_loop::{ControlFlow, EventLoop, Tick};
use layer_stack::keybindings::KeyBindings;
use layer_stack::layout::Viewport;
use layer_stack::log_buffer::{LogHandle, set_global_log};
use layer_stack::stack::LayerInput;
use layer_stack::{tracing_sub, ui};

#[derive(Parser, Debug)]
#[command(
    name = "layer-stack",
    version = env!("CARGO_PKG_VERSION"),
    about = "Interactive demo of stacked slide-in layers"
)]
struct Cli {
    /// Number of demo triggers.
    #[arg(short = 't', long = "triggers", value_name = "N", default_value_t = 5)]
    triggers: usize,

    /// Below this many columns every layer goes full width.
    #[arg(long = "breakpoint", value_name = "COLUMNS", default_value_t = 60)]
    breakpoint: u32,

    /// Each further layer is this many columns narrower.
    #[arg(long = "distance", value_name = "COLUMNS", default_value_t = 8)]
    distance: u32,

    /// Share of the terminal width taken by the first layer.
    #[arg(long = "fraction", value_name = "FRACTION", default_value_t = 0.8)]
    fraction: f64,

    /// Slide time for a layer as wide as the terminal.
    #[arg(long = "animation-ms", value_name = "MS", default_value_t = 600)]
    animation_ms: u64,

    /// z-index of the lowest layer.
    #[arg(long = "z-start", value_name = "Z", default_value_t = 1050)]
    z_start: i32,

    /// Every K-th trigger gets a static backdrop (0 disables).
    #[arg(long = "static-every", value_name = "K", default_value_t = 3)]
    static_every: usize,

    /// Every K-th trigger gets a transparent backdrop (0 disables).
    #[arg(long = "no-backdrop-every", value_name = "K", default_value_t = 4)]
    no_backdrop_every: usize,

    /// Most verbose level shown in the log pane.
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "debug")]
    log_level: tracing::Level,
}

struct DemoConfig {
    patch: ConfigPatch,
    options: DemoOptions,
}

impl TryFrom<&Cli> for DemoConfig {
    type Error = String;

    fn try_from(cli: &Cli) -> Result<Self, Self::Error> {
        if !(1..=20).contains(&cli.triggers) {
            return Err("triggers must be between 1 and 20".to_string());
        }
        if !(cli.fraction > 0.0 && cli.fraction <= 1.0) {
            return Err("fraction must be in (0, 1]".to_string());
        }
        if cli.animation_ms > 10_000 {
            return Err("animation-ms must be at most 10000".to_string());
        }
        Ok(Self {
            patch: ConfigPatch {
                full_width_breakpoint: Some(cli.breakpoint),
                first_layer_fraction: Some(cli.fraction),
                distance_between_layers: Some(cli.distance),
                animation_duration_ms: Some(cli.animation_ms),
                z_index_start: Some(cli.z_start),
                ..ConfigPatch::default()
            },
            options: DemoOptions {
                triggers: cli.triggers,
                static_every: cli.static_every,
                no_backdrop_every: cli.no_backdrop_every,
            },
        })
    }
}

fn main() -> io::Result<()> {
    let args = Cli::parse();
    let demo = DemoConfig::try_from(&args)
        .map_err(|msg| io::Error::new(io::ErrorKind::InvalidInput, msg))?;

    let log = LogHandle::default();
    set_global_log(log.clone());
    tracing_sub::init(args.log_level);

    let mut config = GlobalConfig::default();
    config.merge(&demo.patch);

    let mut output = ConsoleOutputDriver::new()?;
    let (cols, rows) = output.size()?;
    let mut app = DemoApp::new(
        config,
        Viewport::new(u32::from(cols), u32::from(rows)),
        demo.options,
    );
    let bindings = KeyBindings::default();
    let help = bindings.help_line();

    output.enter()?;
    let mut driver = ConsoleInputDriver::new();
    driver.set_mouse_capture(true)?;
    let mut event_loop = EventLoop::new(driver, Duration::from_millis(16));

    let result = event_loop.run(|tick| {
        match tick {
            Tick::Frame(elapsed) => {
                app.stack_mut().advance(elapsed);
                let lines = log.tail(64);
                output.draw(|frame| {
                    let view = ui::View {
                        document: app.document(),
                        log: &lines,
                        help: &help,
                    };
                    ui::draw(frame, app.stack(), &view);
                })?;
            }
            Tick::Input(Event::Key(key)) => {
                if let Some(action) = bindings.action_for_key(&key)
                    && !app.apply(action)
                {
                    return Ok(ControlFlow::Quit);
                }
            }
            Tick::Input(Event::Mouse(mouse)) => {
                if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
                    let viewport = app.stack().viewport();
                    let screen = Rect::new(
                        0,
                        0,
                        u16::try_from(viewport.width).unwrap_or(u16::MAX),
                        u16::try_from(viewport.height).unwrap_or(u16::MAX),
                    );
                    let (page, _, _) = ui::split(screen);
                    let covered_by_top = app
                        .stack()
                        .top()
                        .is_some_and(|top| mouse.column >= ui::layer_rect(page, top.width(), 0).x);
                    if app.stack().backdrop().is_some() && !covered_by_top {
                        app.stack_mut().handle_input(LayerInput::BackdropClick);
                    }
                }
            }
            Tick::Input(Event::Resize(cols, rows)) => {
                app.stack_mut().handle_input(LayerInput::Resize(Viewport::new(
                    u32::from(cols),
                    u32::from(rows),
                )));
            }
            Tick::Input(_) => {}
        }
        Ok(ControlFlow::Continue)
    });

    output.exit()?;
    result
}

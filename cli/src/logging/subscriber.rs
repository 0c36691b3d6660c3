//! Tracing targets, console rendering and the run log file layer.
//!
//! Messages never carry escape codes. Each event is classified into a
//! [`Kind`] from its level, target and `status` field, then rendered plain
//! for the log file or styled for the console.
use std::fs;
use std::io::{IsTerminal as _, Write as _};
use std::sync::Mutex;

use super::types::TaskStatus;
use super::utils::{clock, log_file_path, run_stamp};

/// Target of stage headers.
pub(super) const STAGE_TARGET: &str = "automac::stage";

/// Target of subprocess audit lines; the message is the quoted command.
pub const AUDIT_TARGET: &str = "automac::exec";

/// Target of summary rows. Task rows carry a `status` field holding a
/// [`TaskStatus::label`].
pub(super) const SUMMARY_TARGET: &str = "automac::summary";

/// The `message` and `status` fields of an event.
#[derive(Default)]
struct EventFields {
    message: String,
    status: Option<String>,
}

impl EventFields {
    fn of(event: &tracing::Event<'_>) -> Self {
        let mut fields = Self::default();
        event.record(&mut fields);
        fields
    }

    fn set(&mut self, name: &str, value: String) {
        match name {
            "message" => self.message = value,
            "status" => self.status = Some(value),
            _ => {}
        }
    }
}

impl tracing::field::Visit for EventFields {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.set(field.name(), format!("{value:?}"));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.set(field.name(), value.to_string());
    }
}

/// Rendering class of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Stage,
    Audit,
    /// Task row (with status) or the totals line (without).
    Summary(Option<TaskStatus>),
    Error,
    Warn,
    Info,
    Debug,
}

impl Kind {
    fn classify(metadata: &tracing::Metadata<'_>, status: Option<&str>) -> Self {
        match (*metadata.level(), metadata.target()) {
            (tracing::Level::ERROR, _) => Self::Error,
            (tracing::Level::WARN, _) => Self::Warn,
            (_, STAGE_TARGET) => Self::Stage,
            (_, AUDIT_TARGET) => Self::Audit,
            (_, SUMMARY_TARGET) => Self::Summary(status.and_then(TaskStatus::from_label)),
            (tracing::Level::INFO, _) => Self::Info,
            _ => Self::Debug,
        }
    }

    /// Log file form.
    fn plain(self, msg: &str) -> String {
        match self {
            Self::Stage => format!("==> {msg}"),
            Self::Audit => format!("    $ {msg}"),
            Self::Error => format!("    error: {msg}"),
            Self::Warn => format!("    warn: {msg}"),
            Self::Debug => format!("    debug: {msg}"),
            Self::Summary(_) | Self::Info => format!("    {msg}"),
        }
    }

    /// Console form; without `color` only the layout remains.
    fn console(self, msg: &str, color: bool) -> String {
        let paint = |code: &str, text: &str| {
            if color {
                format!("\x1b[{code}m{text}\x1b[0m")
            } else {
                text.to_string()
            }
        };
        match self {
            Self::Stage => format!("{} {}", paint("1;34", "==>"), paint("1", msg)),
            Self::Audit => format!("  {} {}", paint("36", "$"), paint("2", msg)),
            Self::Error => format!("{} {msg}", paint("31", "ERROR")),
            Self::Warn => format!("{}  {msg}", paint("33", "WARN")),
            Self::Info => format!("  {msg}"),
            Self::Debug => format!("  {}", paint("2", msg)),
            Self::Summary(status) => {
                let code = match status {
                    Some(TaskStatus::Ok) => "32",
                    Some(TaskStatus::NotApplicable) => "2",
                    Some(TaskStatus::Skipped) => "33",
                    Some(TaskStatus::Failed) => "31",
                    None => "1",
                };
                format!("  {}", paint(code, msg))
            }
        }
    }
}

/// Appends every event, plain and timestamped, to the command's log file.
#[derive(Debug)]
pub(super) struct FileLayer {
    file: Mutex<fs::File>,
}

impl FileLayer {
    /// Truncate the log file for `command` and write the run header.
    ///
    /// Returns `None` if the log directory or file is unusable.
    pub(super) fn new(command: &str) -> Option<Self> {
        let path = log_file_path(command)?;
        let header = format!(
            "# automac {} {command}, started {}\n",
            crate::commands::version::version(),
            run_stamp()
        );
        fs::write(&path, header).ok()?;
        let file = fs::OpenOptions::new().append(true).open(&path).ok()?;
        Some(Self {
            file: Mutex::new(file),
        })
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FileLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let fields = EventFields::of(event);
        let kind = Kind::classify(event.metadata(), fields.status.as_deref());
        if let Ok(mut f) = self.file.lock() {
            writeln!(f, "[{}] {}", clock(), kind.plain(&fields.message)).ok();
        }
    }
}

/// Console event format; styles only when `color` is set.
struct ConsoleFormatter {
    color: bool,
}

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for ConsoleFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let fields = EventFields::of(event);
        let kind = Kind::classify(event.metadata(), fields.status.as_deref());
        writeln!(writer, "{}", kind.console(&fields.message, self.color))
    }
}

/// Initialise the global [`tracing`] subscriber.
///
/// Warnings and errors go to stderr, everything else to stdout; colour is
/// used only when stdout is a terminal. The file layer records DEBUG and
/// above whatever `verbose` says. Call once, before any logging.
pub fn init_subscriber(verbose: bool, command: &str) {
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::{
        Layer as _, filter::LevelFilter, fmt, layer::SubscriberExt as _,
        util::SubscriberInitExt as _,
    };

    let console_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let make_writer = std::io::stderr
        .with_max_level(tracing::Level::WARN)
        .and(std::io::stdout.with_min_level(tracing::Level::INFO));
    let console_layer = fmt::layer()
        .event_format(ConsoleFormatter {
            color: std::io::stdout().is_terminal(),
        })
        .with_writer(make_writer)
        .with_filter(console_level);

    let file_layer = FileLayer::new(command).map(|l| l.with_filter(LevelFilter::DEBUG));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
}

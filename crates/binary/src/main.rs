use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use codespan_reporting::{
    files::{Files, SimpleFiles},
    term::{
        self,
        termcolor::{ColorChoice, StandardStream},
        Config,
    },
};
use serde::Deserialize;
use spice_netlist_core::{
    config::{ParserOptions, WriterOptions},
    device::DeviceRegistry,
    error::Diagnostic,
    source::SpiceSource,
};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "spice-netlist", about = "Parse and normalize a SPICE netlist")]
struct Opt {
    /// Verbose logging, repeat for more
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,
    /// Output the netlist in json format
    #[structopt(short, long)]
    json: bool,
    /// Pretty json output
    #[structopt(short, long)]
    pretty: bool,
    /// Output normalized SPICE text
    #[structopt(short, long)]
    format: bool,
    /// Wrap normalized lines longer than this
    #[structopt(short, long)]
    width: Option<usize>,
    /// Node name treated as ground
    #[structopt(long)]
    ground: Option<String>,
    /// The first line is not a title
    #[structopt(long)]
    no_title: bool,
    /// Drop comments from normalized output
    #[structopt(long)]
    no_comments: bool,
    /// JSON file with `parser` and `writer` options
    #[structopt(short, long, parse(from_os_str))]
    config: Option<PathBuf>,
    /// .cir file to parse
    #[structopt(parse(from_os_str))]
    file: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Settings {
    parser: ParserOptions,
    writer: WriterOptions,
}

impl Settings {
    fn load(opt: &Opt) -> Result<Self> {
        let mut settings = match &opt.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("cannot read config {:?}", path))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("invalid config {:?}", path))?
            }
            None => Settings::default(),
        };
        if let Some(ground) = &opt.ground {
            settings.parser.ground = ground.clone();
        }
        if opt.no_title {
            settings.parser.title_line = false;
        }
        if opt.width.is_some() {
            settings.writer.line_length_max = opt.width;
        }
        if opt.no_comments {
            settings.writer.comments = false;
        }
        Ok(settings)
    }
}

struct Reporter {
    files: SimpleFiles<String, String>,
    file_id: usize,
}

impl Reporter {
    fn new(name: String, content: String) -> Self {
        let mut files = SimpleFiles::new();
        let file_id = files.add(name, content);
        Self { files, file_id }
    }

    fn emit(&self, diagnostic: &Diagnostic) -> Result<()> {
        let (first, last) = diagnostic.lines;
        let start = self.files.line_range(self.file_id, first)?.start;
        let end = self.files.line_range(self.file_id, last)?.end;
        let report = diagnostic.to_report(self.file_id, start..end);
        let writer = StandardStream::stderr(ColorChoice::Auto);
        term::emit(&mut writer.lock(), &Config::default(), &self.files, &report)?;
        Ok(())
    }
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> Result<()> {
    let opt = Opt::from_args();
    init_logger(opt.verbose);
    let settings = Settings::load(&opt)?;

    let content = fs::read_to_string(&opt.file)
        .with_context(|| format!("cannot read {:?}", opt.file))?;
    let reporter = Reporter::new(opt.file.to_string_lossy().to_string(), content.clone());

    let source = SpiceSource::parse(&content, DeviceRegistry::shared(), &settings.parser)
        .with_context(|| format!("failed to parse {:?}", opt.file))?;
    for diagnostic in source.diagnostics() {
        reporter.emit(diagnostic)?;
    }
    log::info!(
        "{} statement(s), {} diagnostic(s)",
        source.netlist().statements.len(),
        source.diagnostics().len()
    );

    if opt.format {
        print!("{}", source.to_spice(&settings.writer));
    }
    if opt.json {
        let json = if opt.pretty {
            serde_json::to_string_pretty(source.netlist())?
        } else {
            serde_json::to_string(source.netlist())?
        };
        println!("{}", json);
    }
    Ok(())
}

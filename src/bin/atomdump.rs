use anyhow::{Context, bail};
use clap::{ArgAction, Parser};
use mp4atoms::{
    AtomReader, AtomSource, Counted, ForwardOnly, FourCC,
    api::{collect_metadata, collect_payloads, summarize},
};
use std::fs::File;
use std::io;

#[derive(Parser, Debug)]
#[command(version, about = "Walk MP4/QuickTime atoms and pull out iTunes tags")]
struct Args {
    /// MP4 file path, or '-' for stdin
    path: String,

    /// Print the title tag only
    #[arg(short = 't', long = "title", conflicts_with = "find")]
    title: bool,

    /// Print the first tag with this type code (e.g. ldes, ©ART)
    #[arg(long = "find")]
    find: Option<String>,

    /// Print every ilst text tag
    #[arg(long, action = ArgAction::SetTrue)]
    metadata: bool,

    /// Hex dump the payload of leaf atoms with this type code
    #[arg(long = "raw")]
    raw: Option<String>,

    /// Bytes per atom for --raw (0 means the whole payload)
    #[arg(long, default_value_t = 256)]
    bytes: u64,

    /// Limit tree depth
    #[arg(long, default_value_t = 64)]
    max_depth: usize,

    /// Emit JSON instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,

    /// Report how many bytes were read and skipped
    #[arg(long, action = ArgAction::SetTrue)]
    stats: bool,

    /// Verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn parse_code(s: &str) -> anyhow::Result<FourCC> {
    match FourCC::from_latin1(s) {
        Some(cc) => Ok(cc),
        None => bail!("'{s}' is not a four-character type code"),
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.path == "-" {
        let stdin = io::stdin();
        run(ForwardOnly::new(stdin.lock()), &args)
    } else {
        let f = File::open(&args.path).with_context(|| format!("opening {}", args.path))?;
        run(f, &args)
    }
}

fn run<S: AtomSource>(source: S, args: &Args) -> anyhow::Result<()> {
    let mut reader = AtomReader::new(Counted::new(source));

    let target = if args.title {
        Some(FourCC::TITLE)
    } else {
        args.find.as_deref().map(parse_code).transpose()?
    };

    if let Some(name) = target {
        let value = reader.find_meta_value(name)?;
        if args.json {
            println!("{}", serde_json::json!({ "name": name.as_latin1(), "value": value }));
        } else {
            println!("{}: {}", name.as_latin1(), value.as_deref().unwrap_or("(not found)"));
        }
    } else if args.metadata {
        let meta = collect_metadata(&mut reader)?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&meta)?);
        } else {
            for tag in &meta.tags {
                println!("{} ({}): {}", tag.name, tag.full_name, tag.text);
            }
        }
    } else if let Some(raw) = args.raw.as_deref() {
        let dumps = collect_payloads(&mut reader, parse_code(raw)?, args.bytes)?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&dumps)?);
        } else {
            for d in &dumps {
                println!("{raw} @ {:#x} ({} bytes)", d.offset, d.length);
                print!("{}", d.hex);
            }
        }
    } else {
        let atoms = summarize(&mut reader)?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&atoms)?);
        } else {
            for a in atoms.iter().filter(|a| a.depth <= args.max_depth) {
                let indent = "  ".repeat(a.depth);
                let text = a.text.as_deref().map(|t| format!(" = {t:?}")).unwrap_or_default();
                println!(
                    "{indent}{:>8} {:>10} {} ({}){text}",
                    format!("{:#x}", a.offset),
                    a.size,
                    a.typ,
                    a.flags
                );
            }
        }
    }

    if args.stats {
        let s = reader.get_ref().stats();
        eprintln!(
            "reads: {} ({} bytes), skips: {} ({} bytes)",
            s.reads, s.bytes_read, s.skips, s.bytes_skipped
        );
    }
    Ok(())
}

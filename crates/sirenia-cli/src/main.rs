use serde::{Deserialize, Serialize};
use sirenia::{AnimateMode, Elements, LayoutOptions, Quality};
use std::io::Read;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Usage(&'static str),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Layout(#[from] sirenia::Error),
    #[error("layout not run: empty graph or an edge joins a node and its ancestor")]
    Unsuccessful,
}

#[derive(Debug, Default)]
struct Args {
    input: Option<String>,
    out: Option<String>,
    pretty: bool,
    seed: Option<u64>,
    quality: Option<Quality>,
    incremental: bool,
    no_tile: bool,
}

/// `{"nodes": [...], "edges": [...], "options": {...}}`; options are optional.
#[derive(Deserialize)]
struct Input {
    #[serde(flatten)]
    elements: Elements,
    #[serde(default)]
    options: LayoutOptions,
}

#[derive(Serialize)]
struct Output<'a> {
    #[serde(flatten)]
    result: &'a sirenia::LayoutResult,
    iterations: usize,
}

fn usage() -> &'static str {
    "sirenia-cli\n\
\n\
USAGE:\n\
  sirenia-cli [--pretty] [--seed <n>] [--quality draft|default|proof] [--incremental] [--no-tile] [--out <path>] [<path>|-]\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - Input is a JSON object with `nodes`, `edges` and optional layout `options`.\n\
  - Flags override the matching fields in `options`.\n\
  - Set RUST_LOG (e.g. `sirenia=debug`) to see progress on stderr.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "--pretty" => args.pretty = true,
            "--incremental" => args.incremental = true,
            "--no-tile" => args.no_tile = true,
            "--seed" => {
                let Some(seed) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.seed = Some(seed.parse::<u64>().map_err(|_| CliError::Usage(usage()))?);
            }
            "--quality" => {
                let Some(q) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.quality = Some(match q.trim().to_ascii_lowercase().as_str() {
                    "draft" => Quality::Draft,
                    "default" => Quality::Default,
                    "proof" => Quality::Proof,
                    _ => return Err(CliError::Usage(usage())),
                });
            }
            "--out" => {
                let Some(out) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.out = Some(out.clone());
            }
            "-" => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some("-".to_string());
            }
            other if other.starts_with('-') => return Err(CliError::Usage(usage())),
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn write_json(value: &impl Serialize, pretty: bool, out: Option<&str>) -> Result<(), CliError> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    match out {
        None | Some("-") => println!("{text}"),
        Some(path) => std::fs::write(path, format!("{text}\n"))?,
    }
    Ok(())
}

fn run(args: Args) -> Result<(), CliError> {
    let text = read_input(args.input.as_deref())?;
    let Input {
        elements,
        mut options,
    } = serde_json::from_str(&text)?;

    if let Some(seed) = args.seed {
        options.random_seed = seed;
    }
    if let Some(quality) = args.quality {
        options.quality = quality;
    }
    if args.incremental {
        options.randomize = false;
    }
    if args.no_tile {
        options.tile = false;
    }
    // Nothing to animate on a terminal.
    if options.animate == AnimateMode::During {
        options.animate = AnimateMode::End;
    }

    let mut layout = sirenia::LayoutRun::new(&elements, options)?;
    layout.start()?;
    let result = layout.result();
    tracing::info!(
        nodes = result.positions.len(),
        success = result.success,
        "layout finished"
    );
    let output = Output {
        result: &result,
        iterations: sirenia::ForceDirected::fd(layout.layout()).total_iterations(),
    };
    write_json(&output, args.pretty, args.out.as_deref())?;

    if !result.success {
        return Err(CliError::Unsuccessful);
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };
    init_tracing();

    match run(args) {
        Ok(()) => {}
        Err(CliError::Unsuccessful) => {
            eprintln!("{}", CliError::Unsuccessful);
            std::process::exit(3);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CliError, parse_args};
    use sirenia::Quality;

    fn argv(args: &[&str]) -> Vec<String> {
        std::iter::once("sirenia-cli")
            .chain(args.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn flags_and_path() {
        let args = parse_args(&argv(&["--pretty", "--seed", "9", "--quality", "Proof", "g.json"])).unwrap();
        assert!(args.pretty);
        assert_eq!(args.seed, Some(9));
        assert_eq!(args.quality, Some(Quality::Proof));
        assert_eq!(args.input.as_deref(), Some("g.json"));
    }

    #[test]
    fn bad_arguments_are_usage_errors() {
        for bad in [&["--seed"][..], &["--seed", "x"], &["--frobnicate"], &["a.json", "b.json"]] {
            assert!(matches!(parse_args(&argv(bad)), Err(CliError::Usage(_))), "{bad:?}");
        }
    }

    #[test]
    fn errors_convert_and_render() {
        fn parse(json: &str) -> Result<sirenia::Elements, CliError> {
            Ok(serde_json::from_str(json)?)
        }
        let err = parse("{").unwrap_err();
        assert!(matches!(err, CliError::Json(_)));
        assert!(err.to_string().starts_with("JSON error: "));

        let layout: CliError = sirenia::Error::DuplicateNodeId { id: "a".into() }.into();
        assert_eq!(
            layout.to_string(),
            sirenia::Error::DuplicateNodeId { id: "a".into() }.to_string()
        );
        assert_eq!(CliError::Usage("usage: x").to_string(), "usage: x");
    }
}

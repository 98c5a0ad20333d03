use clap::{Parser, Subcommand};
use maxe::xslt::{XsltParamKind, split_assignment};
use maxe::{Maxe, MaxeError, XsltParams};
use std::fs;
use std::path::PathBuf;

fn parse_assignment(arg: &str) -> Result<(String, String), String> {
    split_assignment(arg)
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .map_err(|e| e.to_string())
}

#[derive(Parser, Debug)]
#[command(name = "maxe", version, about = "Extensible XML processing driver")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the serialization configuration a run would use, as JSON
    Config {
        /// XSLT stylesheet whose <xsl:output> directives take priority
        #[arg(long, short = 's')]
        stylesheet: Option<PathBuf>,

        /// XML document whose prolog fills the remaining fields
        #[arg(long, short = 'd')]
        document: Option<PathBuf>,

        /// Resource search path (repeatable, searched in order)
        #[arg(long = "path", short = 'r')]
        paths: Vec<PathBuf>,

        /// Stylesheet parameter as an XPath expression (NAME=XPATH, repeatable)
        #[arg(long = "param", short = 'p', value_parser = parse_assignment, requires = "stylesheet")]
        params: Vec<(String, String)>,

        /// Stylesheet parameter as a plain string (NAME=VALUE, repeatable)
        #[arg(long = "strparam", value_parser = parse_assignment, requires = "stylesheet")]
        strparams: Vec<(String, String)>,

        /// Write the JSON here instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
    /// Resolve a relative reference against the search paths
    Resolve {
        reference: String,

        /// Resource search path (repeatable, searched in order)
        #[arg(long = "path", short = 'r')]
        paths: Vec<PathBuf>,
    },
    /// List the registered extensions
    Extensions,
    /// List the formats read-file and read-text understand
    Readers,
}

fn main() -> Result<(), MaxeError> {
    env_logger::init();
    let cli = Cli::parse();
    let maxe = Maxe::new()?;

    match cli.command {
        Command::Config {
            stylesheet,
            document,
            paths,
            params,
            strparams,
            output,
        } => {
            let ctx = maxe.context(std::env::current_dir().into_iter().chain(paths));
            let mut bound = XsltParams::new();
            for (name, value) in &params {
                bound.add(name, XsltParamKind::XPath, value)?;
            }
            for (name, value) in &strparams {
                bound.add(name, XsltParamKind::String, value)?;
            }
            let sheet = stylesheet
                .as_deref()
                .map(|path| maxe.compile(&ctx, path, bound))
                .transpose()?;
            let config = maxe.derive_config(&ctx, sheet.as_ref(), document.as_deref())?;
            let plan = match &sheet {
                Some(sheet) => Maxe::plan_for(sheet, config),
                None => Maxe::plan(config),
            };
            let json = serde_json::to_string_pretty(&plan)?;
            match output {
                Some(path) => {
                    fs::write(&path, json)?;
                    log::info!("Wrote configuration to {}", path.display());
                }
                None => println!("{}", json),
            }
        }
        Command::Resolve { reference, paths } => {
            let ctx = maxe.context(paths);
            println!("{}", maxe.resolve(&ctx, &reference)?.display());
        }
        Command::Extensions => {
            for ext in maxe.registry().snapshot() {
                println!("{}\t{}", ext.name(), ext.kind());
            }
        }
        Command::Readers => {
            for format in maxe.readers().formats() {
                println!("{}\t{}", format, maxe.readers().get(&format)?.name());
            }
        }
    }
    Ok(())
}

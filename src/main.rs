//! galley - inspect and merge IDML layout packages

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use galley::{Package, StructureNode};

#[derive(Parser)]
#[command(name = "galley")]
#[command(version, about = "Inspect and merge IDML layout packages", long_about = None)]
#[command(after_help = "EXAMPLES:
    galley structure doc.idml                         Print the XML structure
    galley export doc.idml --from /Root/article[1]    Export one article as XML
    galley prefix article.idml a_ -o a.idml           Prefix every identifier
    galley insert doc.idml a.idml /Root/article[2] /Root/module -o out.idml")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Only report errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Print the logical structure of a package
    Structure {
        package: PathBuf,
        /// Emit JSON instead of an indented outline
        #[arg(long)]
        json: bool,
    },
    /// Export the structure with story text inlined
    Export {
        package: PathBuf,
        /// Path expression of the node to export from
        #[arg(long)]
        from: Option<String>,
    },
    /// Prefix every identifier and content file name
    Prefix {
        package: PathBuf,
        prefix: String,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Insert content of SOURCE selected by ONLY at the node selected by AT
    Insert {
        package: PathBuf,
        source: PathBuf,
        at: String,
        only: String,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Append a page of SOURCE and graft ONLY at AT
    AddPage {
        package: PathBuf,
        source: PathBuf,
        /// 1-based page number in SOURCE
        page: usize,
        at: String,
        only: String,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Build a package from an unpacked directory
    Pack { dir: PathBuf, output: PathBuf },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.quiet { "error" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), String> {
    match command {
        Command::Structure { package, json } => show_structure(&package, json),
        Command::Export { package, from } => {
            let mut pkg = open(&package)?;
            let xml = pkg.export_xml(from.as_deref()).map_err(|e| e.to_string())?;
            print!("{xml}");
            Ok(())
        }
        Command::Prefix {
            package,
            prefix,
            output,
        } => {
            let mut pkg = open(&package)?;
            pkg.prefix(&prefix).map_err(|e| e.to_string())?;
            pkg.save(&output).map_err(|e| e.to_string())
        }
        Command::Insert {
            package,
            source,
            at,
            only,
            output,
        } => {
            let mut pkg = open(&package)?;
            let mut src = open(&source)?;
            pkg.insert(&mut src, &at, &only)
                .map_err(|e| e.to_string())?;
            pkg.save(&output).map_err(|e| e.to_string())
        }
        Command::AddPage {
            package,
            source,
            page,
            at,
            only,
            output,
        } => {
            let mut pkg = open(&package)?;
            let mut src = open(&source)?;
            pkg.add_page(&mut src, page, &at, &only)
                .map_err(|e| e.to_string())?;
            pkg.save(&output).map_err(|e| e.to_string())
        }
        Command::Pack { dir, output } => match Package::create_from_dir(&dir, &output) {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(format!("{} already exists", output.display())),
            Err(e) => Err(e.to_string()),
        },
    }
}

fn open(path: &Path) -> Result<Package, String> {
    Package::open(path).map_err(|e| format!("{}: {e}", path.display()))
}

fn show_structure(path: &Path, json: bool) -> Result<(), String> {
    let mut pkg = open(path)?;
    let tree = pkg.structure().map_err(|e| e.to_string())?;

    if json {
        let out = serde_json::to_string_pretty(tree).map_err(|e| e.to_string())?;
        println!("{out}");
    } else {
        print_node(&tree.root, 0);
    }
    Ok(())
}

fn print_node(node: &StructureNode, depth: usize) {
    let indent = "  ".repeat(depth);
    match &node.content {
        Some(content) => println!("{indent}{} -> {content}", node.tag),
        None => println!("{indent}{}", node.tag),
    }
    for child in &node.children {
        print_node(child, depth + 1);
    }
}

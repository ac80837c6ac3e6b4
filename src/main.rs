use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pathtrie::scanner::PathIndex;
use pathtrie::server::CompletionServer;

#[derive(Parser)]
#[command(about = "Trie-backed path autocomplete")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Scan directories, then serve completion queries over TCP
    Serve {
        #[arg(long, default_value = "127.0.0.1:7071")]
        bind: String,
        /// Directory whose immediate entries are indexed (repeatable)
        #[arg(long = "dir")]
        dirs: Vec<PathBuf>,
    },
    /// Scan directories, run one completion query, and print the matches
    Query {
        /// Directory whose immediate entries are indexed (repeatable)
        #[arg(long = "dir", required = true)]
        dirs: Vec<PathBuf>,
        partial: String,
    },
}

fn build_index(dirs: &[PathBuf]) -> PathIndex {
    let mut index = PathIndex::new();
    for dir in dirs {
        // An unreadable directory is skipped, not fatal.
        match index.scan_dir(dir) {
            Ok(n) => eprintln!("Indexed {} entries from {}", n, dir.display()),
            Err(e) => eprintln!("Skipping {}: {:#}", dir.display(), e),
        }
    }
    index
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        CliCommand::Serve { bind, dirs } => {
            let index = build_index(&dirs);
            CompletionServer::new(index).run(&bind).await
        }
        CliCommand::Query { dirs, partial } => {
            let index = build_index(&dirs);
            let matches = index.complete(partial.as_bytes());

            match matches.len() {
                0 => println!("No match found for: \n{}", partial),
                1 => println!("Match found: \n{}", String::from_utf8_lossy(&matches[0])),
                _ => {
                    println!("Multiple matches found:");
                    for m in &matches {
                        println!("{}", String::from_utf8_lossy(m));
                    }
                }
            }
            Ok(())
        }
    }
}

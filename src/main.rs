use clap::{Parser, Subcommand};
use diptych::imaging::RustBackend;
use diptych::{output, pipeline, secrets};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "diptych")]
#[command(about = "Photo gallery builder: albums in, manifest and split images out")]
#[command(long_about = "\
Photo gallery builder: albums in, manifest and split images out

Source structure:

  site/
  ├── gallery.config.json          # Layout, branding, master code, category covers
  ├── dictionary.json              # Viewer UI strings (optional)
  ├── app.js, style.css, assets/   # Viewer files, copied to the output
  ├── pages/
  │   ├── shell.html               # Template for per-album / per-category pages
  │   └── index.html               # Other pages, copied as-is
  └── albums/
      ├── 2023-06-coast/
      │   ├── config.json          # name, category, coverImage, locked, unlockCode, includes
      │   ├── sunset.jpg
      │   └── sunset.md            # YAML front matter (title, tags, description) + markdown
      └── 2023-07-coast/           # Same name in config.json → merged into one album

Output (default <root>/public): data.json, thumbnails/, split/, albums/*.html,
category/*.html, serve.json and the copied viewer files.")]
#[command(version)]
struct Cli {
    /// Source root
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Output directory (default: <root>/public)
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Log debug detail (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline: scan → derive → manifest → pages
    Build,
    /// Scan and merge albums without writing anything
    Check,
    /// Print the unlock hash for a code
    Hash {
        /// Plaintext unlock or master code
        code: String,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "warn,diptych=debug"
    } else {
        "warn,diptych=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Build => {
            let output_dir = cli
                .output
                .clone()
                .unwrap_or_else(|| pipeline::default_output(&cli.root));
            println!(
                "==> Building {} → {}",
                cli.root.display(),
                output_dir.display()
            );

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    println!("{}", output::format_derive_event(&event));
                }
            });
            let result = pipeline::build(
                &cli.root,
                &output_dir,
                Arc::new(RustBackend::new()),
                Some(tx),
            );
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;

            let report = result?;
            output::print_build_summary(&report, &output_dir);
            println!("==> Build complete: {}", output_dir.display());
        }
        Command::Check => {
            println!("==> Checking {}", cli.root.display());
            let report = pipeline::check(&cli.root)?;
            if let Some(reason) = report.config.reason() {
                println!("Config: invalid, defaults used ({reason})");
            }
            output::print_scan_output(&report.scan, &cli.root.join(pipeline::ALBUMS_DIR));
            println!("==> Content is valid");
        }
        Command::Hash { code } => {
            println!("{}", secrets::hash_code(&code));
        }
    }

    Ok(())
}

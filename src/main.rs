//! docmark CLI: review, mark, filter and export documents.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use docmark::catalog::{ExportRequest, FilterRequest};
use docmark::client::{CatalogService, DocmarkClient};
use docmark::mark::Mark;
use docmark::paths::DocmarkPaths;
use docmark::settings::Settings;
use docmark::tui::ReviewTui;

#[derive(Parser)]
#[command(name = "docmark", version, about = "Review and classify text and PDF documents")]
struct Cli {
    /// Project root holding documents/, data/ and exports/ (default:
    /// $DOCMARK_HOME, then the current directory).
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// docmarkd URL; by default a running server is discovered via its PID
    /// file, falling back to direct file access.
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the project directories and a default settings file.
    Init,

    /// Open the interactive review screen (default).
    Review,

    /// List documents with their marks.
    List,

    /// Mark one document.
    Mark {
        /// Document file name.
        filename: String,
        /// A or B.
        mark: Mark,
    },

    /// Mark every document matching the criteria.
    Filter {
        /// Regex the file name must match.
        #[arg(long, default_value = "")]
        name: String,

        /// Regex the document text must match.
        #[arg(long, default_value = "")]
        content: String,

        /// Minimum length (characters for text, pages for PDF).
        #[arg(long)]
        min: Option<usize>,

        /// Maximum length (characters for text, pages for PDF).
        #[arg(long)]
        max: Option<usize>,

        /// Mark to apply.
        #[arg(long, default_value = "A")]
        mark: Mark,
    },

    /// Copy marked documents into exports/<mark>/ and write a report.
    Export {
        /// Marks to export, comma-separated.
        #[arg(long, value_delimiter = ',', required = true)]
        marks: Vec<Mark>,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Review);
    let paths = DocmarkPaths::resolve(cli.root.as_deref())?;

    init_logging(&paths, matches!(command, Commands::Review))?;

    match command {
        Commands::Init => {
            paths.ensure_dirs()?;
            std::fs::create_dir_all(&paths.exports_dir).into_diagnostic()?;
            let settings_file = paths.settings_file();
            if settings_file.exists() {
                println!("Settings already present: {}", settings_file.display());
            } else {
                Settings::default().save(&settings_file)?;
                println!("Wrote default settings: {}", settings_file.display());
            }
            println!("Project ready at {}", paths.root.display());
            println!("  documents: {}", paths.documents_dir.display());
            println!("  data:      {}", paths.data_dir.display());
            println!("  exports:   {}", paths.exports_dir.display());
        }

        Commands::Review => {
            let client = DocmarkClient::connect(&paths, cli.server.as_deref())?;
            let settings = client.settings()?;
            let mut tui = ReviewTui::with_client(client, &settings)?;
            tui.run()?;
        }

        Commands::List => {
            let client = DocmarkClient::connect(&paths, cli.server.as_deref())?;
            let listing = client.list_documents()?;
            if listing.files.is_empty() {
                println!("No documents in {}", paths.documents_dir.display());
            }
            for file in &listing.files {
                let badge = listing
                    .marks
                    .get(file)
                    .map(|m| format!("[{m}]"))
                    .unwrap_or_else(|| "[ ]".to_string());
                println!("  {badge} {file}");
            }
            for mark in Mark::ALL {
                let count = listing
                    .files
                    .iter()
                    .filter(|f| listing.marks.get(*f) == Some(&mark))
                    .count();
                println!("{mark}: {count}");
            }
        }

        Commands::Mark { filename, mark } => {
            let client = DocmarkClient::connect(&paths, cli.server.as_deref())?;
            client.set_mark(&filename, mark)?;
            println!("Marked \"{filename}\" {mark}");
        }

        Commands::Filter {
            name,
            content,
            min,
            max,
            mark,
        } => {
            let request = FilterRequest {
                file_name_regex: name,
                content_pattern: content,
                min_length: min,
                max_length: max,
                mark_color: mark,
            };
            // Reject bad patterns before touching the catalog.
            request.compile()?;
            let client = DocmarkClient::connect(&paths, cli.server.as_deref())?;
            let response = client.filter(&request)?;
            println!("Marked {} document(s) {mark}", response.updated_count);
        }

        Commands::Export { marks } => {
            let client = DocmarkClient::connect(&paths, cli.server.as_deref())?;
            let response = client.export(&ExportRequest::new(marks))?;
            for file in &response.exported {
                println!("  exported {file}");
            }
            for file in &response.removed {
                println!("  dropped mark of missing {file}");
            }
            println!(
                "Exported {} document(s) to {}",
                response.exported.len(),
                paths.exports_dir.display()
            );
        }
    }

    Ok(())
}

/// The review screen owns the terminal, so it logs to `data/docmark.log`;
/// every other command logs to stderr.
fn init_logging(paths: &DocmarkPaths, to_file: bool) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,pdf_extract=warn"));

    if to_file {
        paths.ensure_dirs()?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(paths.log_file())
            .into_diagnostic()?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

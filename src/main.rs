//! Main entry point for the archpick CLI application.
//!
//! This binary lists a remote archive through an archive proxy and downloads
//! a selection of its entries, repacked as a single zip.

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::info;
use std::path::Path;
use std::time::Duration;

use archpick::cli::{DrainMode, ExistingOutput};
use archpick::tree::{self, match_patterns};
use archpick::{
    AppState, ArchiveClient, ChunkStream, Cli, Destination, Drain, FileDestination, PipeDrain,
    PumpDrain, WriterDestination, select_drain,
};

/// What a download asks the proxy for.
enum Fetch<'a> {
    /// Repack the selected files into one zip
    Pack(&'a [String]),
    /// One entry by name, as-is
    Entry(&'a str),
    /// One entry by position, as-is
    Index(usize),
}

/// Application entry point.
///
/// Parses command-line arguments, lists the archive and then either prints
/// the entry tree or downloads the selected entries.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter()))
        .init();

    let client = ArchiveClient::new(&cli.server, Duration::from_secs(cli.timeout))?
        .with_format(cli.format.clone());

    if cli.check_server {
        client.health().await?;
        if !cli.is_quiet() {
            eprintln!("{}: OK", cli.server);
        }
        return Ok(());
    }

    let url = cli.url.as_deref().context("no archive URL given")?;
    let state = AppState::new(&cli.charset).url_changed(url);

    // Index mode: the entry is addressed by position, no listing needed
    if let Some(index) = cli.index {
        let output_path = cli.index_output_path(&state.url, index);
        return download(&client, &state, Fetch::Index(index), &output_path, &cli).await;
    }

    let result = client.list(&state.url, &state.charset).await;
    let listing = match result {
        Ok(listing) => listing,
        Err(err) => {
            let state = state.operation_failed(&err);
            bail!(state.error.unwrap_or_default());
        }
    };
    let state = state.list_succeeded(listing);

    // List mode: display the entry tree and exit
    if cli.list || cli.verbose {
        print_tree(&state, cli.verbose);
        return Ok(());
    }

    // Resolve the requested entries to checked tree keys, then to files
    let checked = match_patterns(&state.tree, &cli.entries, &cli.exclude);
    let state = state.check(checked);
    let files = state.pack_request()?;

    let fetch = if cli.raw {
        match files {
            [entry] => Fetch::Entry(entry.as_str()),
            _ => bail!("--raw needs exactly one file, {} selected", files.len()),
        }
    } else {
        Fetch::Pack(files)
    };
    let output_path = match fetch {
        Fetch::Entry(entry) => cli.output_path(Some(entry)),
        _ => cli.output_path(None),
    };

    download(&client, &state, fetch, &output_path, &cli).await
}

/// Print the entry tree of the listed archive.
///
/// The verbose format adds the archive type, the full key of every node and
/// a summary line.
fn print_tree(state: &AppState, verbose: bool) {
    if verbose {
        println!("Archive: {}", state.url);
        println!("Type:    {}", state.file_type.as_deref().unwrap_or("unknown"));
        println!("{}", "-".repeat(70));
    }

    print!("{}", tree::render(&state.tree, verbose));

    if verbose {
        let file_count: usize = state.tree.iter().map(|n| n.file_count()).sum();
        let dir_count = tree::walk(&state.tree).filter(|n| n.is_dir()).count();
        println!("{}", "-".repeat(70));
        println!("{} files, {} directories", file_count, dir_count);
    }
}

/// Download `fetch` to `output_path`.
///
/// Handles the output options:
/// - Pipe mode (`-p`): write to stdout instead of a file
/// - Overwrite control (`-n`, `-O`): skip, replace or refuse an existing file
async fn download(
    client: &ArchiveClient,
    state: &AppState,
    fetch: Fetch<'_>,
    output_path: &Path,
    cli: &Cli,
) -> Result<()> {
    let mut dest: Box<dyn Destination> = if cli.pipe {
        Box::new(WriterDestination::new(tokio::io::stdout()))
    } else {
        // Handle existing files based on overwrite options
        if output_path.exists() {
            match cli.existing_output() {
                ExistingOutput::Skip => {
                    if !cli.is_very_quiet() {
                        eprintln!("Skipping: {} (file exists)", output_path.display());
                    }
                    return Ok(());
                }
                ExistingOutput::Refuse => bail!(
                    "{} already exists (use -O to overwrite, -n to skip)",
                    output_path.display()
                ),
                ExistingOutput::Overwrite => {}
            }
        }
        Box::new(FileDestination::create(output_path, cli.overwrite).await?)
    };

    // Only ask the proxy once the destination is ready
    let body = match request(client, state, &fetch, cli).await {
        Ok(body) => body,
        Err(err) => {
            dest.abort().await;
            return Err(err.into());
        }
    };

    let drain: Box<dyn Drain> = match cli.drain {
        DrainMode::Auto => select_drain(dest.as_mut()),
        DrainMode::Pipe => Box::new(PipeDrain),
        DrainMode::Pump => Box::new(PumpDrain),
    };
    let written = drain.drain(body, dest.as_mut()).await?;
    info!("Download finished: {} bytes", written);

    if !cli.is_quiet() {
        eprintln!("\nSaved {} ({})", output_path.display(), format_size(written));
    }

    Ok(())
}

async fn request(
    client: &ArchiveClient,
    state: &AppState,
    fetch: &Fetch<'_>,
    cli: &Cli,
) -> archpick::Result<ChunkStream> {
    match *fetch {
        Fetch::Pack(files) => {
            if !cli.is_quiet() {
                for file in files {
                    eprintln!("  packing: {}", file);
                }
            }
            client.pack(&state.url, &state.charset, files).await
        }
        Fetch::Entry(entry) => {
            if !cli.is_quiet() {
                eprintln!("  streaming: {}", entry);
            }
            client.stream_entry(&state.url, &state.charset, entry).await
        }
        Fetch::Index(index) => {
            if !cli.is_quiet() {
                eprintln!("  streaming: entry #{}", index);
            }
            client.stream_index(&state.url, &state.charset, index).await
        }
    }
}

/// Format a byte size into a human-readable string.
///
/// Automatically selects the appropriate unit (bytes, KB, MB, GB)
/// based on the size magnitude.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(format_size(500), "500 bytes");
/// assert_eq!(format_size(1536), "1.50 KB");
/// assert_eq!(format_size(1048576), "1.00 MB");
/// ```
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}

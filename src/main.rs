// src/main.rs
// =============================================================================
// Entry point of the faq-harvester CLI.
//
// What happens here:
// 1. Load .env, set up logging, parse command-line arguments
// 2. Dispatch to the crawl or chat handler
// 3. Exit with a code that tells the caller what went wrong:
//    0 = success
//    1 = crawl/save failed, data declined, or the chat could not start
//    2 = invalid start URL
//    3 = missing Gemini API key
//    4 = FAQ data file could not be loaded
// =============================================================================

mod chat;
mod cli;
mod console;
mod crawl;
mod logging;
mod store;

use anyhow::Result;
use chat::{ChatSession, ContextBuilder, GeminiClient};
use clap::Parser;
use cli::{Cli, Commands, CrawlArgs, DEFAULT_START_URL};
use console::Console;
use crawl::CrawlError;
use std::path::Path;
use tokio::io::AsyncBufRead;
use tracing::{error, warn};

const EXIT_OK: i32 = 0;
const EXIT_FAILURE: i32 = 1;
const EXIT_INVALID_URL: i32 = 2;
const EXIT_MISSING_API_KEY: i32 = 3;
const EXIT_DATA_LOAD: i32 = 4;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            EXIT_FAILURE
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    logging::setup_logging(cli.verbose)?;

    let mut console = Console::stdin();

    match cli.command {
        Commands::Crawl {
            start_url,
            output,
            crawl,
        } => handle_crawl(&mut console, start_url, &output, &crawl).await,
        Commands::Chat {
            data,
            model,
            max_context_chars,
            api_key,
            crawl,
        } => {
            handle_chat(
                &mut console,
                &data,
                &model,
                max_context_chars,
                api_key,
                &crawl,
            )
            .await
        }
    }
}

// Handles the 'crawl' subcommand
async fn handle_crawl<R>(
    console: &mut Console<R>,
    start_url: Option<String>,
    output: &Path,
    args: &CrawlArgs,
) -> Result<i32>
where
    R: AsyncBufRead + Unpin,
{
    println!("FAQ crawler");
    println!("{}", "-".repeat(30));

    let code = crawl_to_file(console, start_url, output, args).await?;

    println!("{}", "-".repeat(30));
    if code == EXIT_OK {
        println!("Crawl finished.");
    } else {
        println!("Crawl failed or the data could not be saved.");
    }
    Ok(code)
}

// Resolves the start URL, crawls, and saves to `output`
//
// Returns one of the exit codes; only unexpected I/O on the console is an Err.
async fn crawl_to_file<R>(
    console: &mut Console<R>,
    start_url: Option<String>,
    output: &Path,
    args: &CrawlArgs,
) -> Result<i32>
where
    R: AsyncBufRead + Unpin,
{
    let start_url = match start_url {
        Some(url) => url,
        None => ask_start_url(console).await?,
    };

    if !crawl::is_valid_url(&start_url) {
        error!(url = %start_url, "invalid start URL");
        return Ok(EXIT_INVALID_URL);
    }

    println!("Start URL:   {}", start_url);
    println!("Output file: {}", output.display());
    println!("Page limit:  {}", args.max_pages);

    match crawl::crawl_and_save(args.to_config(), &start_url, output).await {
        Ok(true) => Ok(EXIT_OK),
        Ok(false) => Ok(EXIT_FAILURE),
        Err(CrawlError::InvalidStartUrl(url)) => {
            error!(%url, "invalid start URL");
            Ok(EXIT_INVALID_URL)
        }
        Err(e) => {
            error!(error = %e, "crawl could not start");
            Ok(EXIT_FAILURE)
        }
    }
}

// Prompts for a start URL; an empty answer picks the default
async fn ask_start_url<R>(console: &mut Console<R>) -> Result<String>
where
    R: AsyncBufRead + Unpin,
{
    let prompt = format!("Start URL (default: {}): ", DEFAULT_START_URL);
    let answer = console.ask(&prompt).await?.unwrap_or_default();
    let answer = answer.trim();

    if answer.is_empty() {
        println!("Using the default URL: {}", DEFAULT_START_URL);
        Ok(DEFAULT_START_URL.to_string())
    } else {
        Ok(answer.to_string())
    }
}

// Handles the 'chat' subcommand
async fn handle_chat<R>(
    console: &mut Console<R>,
    data: &Path,
    model: &str,
    max_context_chars: usize,
    api_key: Option<String>,
    crawl_args: &CrawlArgs,
) -> Result<i32>
where
    R: AsyncBufRead + Unpin,
{
    println!("FAQ Q&A (model: {})", model);
    println!("{}", "-".repeat(30));

    // Make sure there is data, offering a crawl first
    if !data.exists() {
        println!("FAQ data file ({}) not found.", data.display());
        if !console.confirm("Crawl the site now? (y/n): ").await? {
            println!("No data available, exiting.");
            return Ok(EXIT_FAILURE);
        }
        let code = crawl_to_file(console, None, data, crawl_args).await?;
        if code != EXIT_OK {
            println!("Could not collect FAQ data, exiting.");
            return Ok(EXIT_FAILURE);
        }
    } else {
        println!("Found existing FAQ data file ({}).", data.display());
        if console.confirm("Refresh it by crawling again? (y/n): ").await? {
            let code = crawl_to_file(console, None, data, crawl_args).await?;
            if code != EXIT_OK {
                warn!("refresh failed, continuing with the existing data");
            }
        } else {
            println!("Using the existing data.");
        }
    }

    let Some(records) = store::load(data) else {
        error!(path = %data.display(), "failed to load FAQ data");
        return Ok(EXIT_DATA_LOAD);
    };

    let Some(api_key) = api_key.filter(|k| !k.is_empty()) else {
        error!("GEMINI_API_KEY is not set");
        return Ok(EXIT_MISSING_API_KEY);
    };

    let client = match GeminiClient::new(api_key, model) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "failed to create the Gemini client");
            return Ok(EXIT_FAILURE);
        }
    };
    println!("Gemini model ({}) ready.", client.model());

    let Some(context) = ContextBuilder::new(max_context_chars).build(&records) else {
        error!("could not build a context from the FAQ data");
        return Ok(EXIT_FAILURE);
    };
    if context.limited {
        warn!(
            included = context.included,
            total = records.len(),
            "only part of the FAQ data fits in the context"
        );
    }

    let mut session = ChatSession::new(client);
    println!("\nLoading {} FAQ entries into the chat session...", context.included);
    if let Err(e) = session.prime(&context.text).await {
        error!(error = %e, "failed to start the chat session");
        return Ok(EXIT_FAILURE);
    }

    let usage = session.usage();
    println!(
        "(Initial context: prompt {} tokens, response {} tokens)",
        usage.initial_prompt, usage.initial_response
    );
    println!("\nReady. Ask a question, or type 'quit' / 'exit' to leave.");
    println!("{}", "-".repeat(30));

    chat::run_interactive(console, &mut session).await?;

    println!("\n{}", "=".repeat(30));
    println!("Session ended.");
    println!("{}", session.usage());
    println!("{}", "=".repeat(30));
    println!("Token counts are as reported by the API and may differ from billing.");

    Ok(EXIT_OK)
}

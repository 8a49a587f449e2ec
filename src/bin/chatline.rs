//! Interactive console chat against a hosted chat-completion deployment.
//!
//! # Usage
//!
//! ```bash
//! # Endpoint and key come from the environment or a .env file
//! OPENAI_ENDPOINT=https://example.openai.azure.com/ OPENAI_KEY=... chatline
//!
//! # Pick a deployment and a system prompt
//! chatline --deployment gpt-4 --system "You will talk like a pirate."
//!
//! # Ground answers in a search index
//! chatline --search-index swapi-vehicle-index --verbose
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/clear` - Clear conversation history
//! - `/deployment <name>` - Change the deployment
//! - `/system [prompt]` - Set or clear system prompt
//! - `/search on|off` - Turn retrieval on or off
//! - `/stats` - Show session statistics
//! - `/q` - Exit the application

use std::process::ExitCode;

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

use chatline::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatSession, PlainTextRenderer, Renderer, SearchConfig,
    Settings, help_text, parse_command,
};
use chatline::{AzureOpenAI, Retriever, SearchAugmenter, SearchClient, VectorSearch};

/// Main entry point for the chatline application.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let (args, _) = ChatArgs::from_command_line_relaxed("chatline [OPTIONS]");
    load_dotenv();
    init_tracing(args.verbose);

    let mut renderer = PlainTextRenderer::with_color(!args.no_color);
    match run(args, &mut renderer).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            renderer.print_error(&err.to_string());
            ExitCode::FAILURE
        }
    }
}

fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(_) => {}
        Err(err) if err.not_found() => {}
        Err(err) => eprintln!("warning: could not load .env: {err}"),
    }
}

fn init_tracing(verbose: bool) {
    let filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) if verbose => tracing_subscriber::EnvFilter::new("info"),
        Err(_) => tracing_subscriber::EnvFilter::new("warn"),
    };
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .compact();
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

async fn run(args: ChatArgs, renderer: &mut PlainTextRenderer) -> chatline::Result<()> {
    let settings = match args.settings.as_deref() {
        Some(path) => Settings::from_file(path)?,
        None => Settings::default(),
    };
    let config = ChatConfig::resolve(args, settings, |name| std::env::var(name).ok())?;

    let client = AzureOpenAI::with_options(
        &config.endpoint,
        config.api_key.clone(),
        config.api_version.clone(),
        config.timeout,
    )?;
    let retriever = match &config.search {
        Some(search) => Some(build_retriever(search, &client, &config)?),
        None => None,
    };

    let mut session = ChatSession::new(client, config);
    if let Some(retriever) = retriever {
        session = session.with_retriever(retriever);
    }
    let mut rl = DefaultEditor::new().map_err(|err| {
        chatline::Error::io(
            "failed to open the console",
            std::io::Error::other(err.to_string()),
        )
    })?;

    println!("Chatting with deployment {}.", session.deployment());
    if let Some(index) = session.stats().search_index {
        println!("Answers are grounded in search index {index}.");
    }
    println!("Enter a question, /help for commands, or /q to quit.\n");

    loop {
        match rl.readline("You: ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                if let Some(cmd) = parse_command(line) {
                    if !handle_command(cmd, &mut session, renderer) {
                        println!("Goodbye!");
                        break;
                    }
                    continue;
                }

                match session.send(line).await {
                    Ok(reply) => {
                        renderer.print_reply(&reply);
                        if let Some(usage) = session.last_usage() {
                            renderer.print_usage(&usage);
                        }
                    }
                    Err(err) => renderer.print_error(&err.to_string()),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {err}"));
                break;
            }
        }
    }

    Ok(())
}

fn build_retriever(
    search: &SearchConfig,
    client: &AzureOpenAI,
    config: &ChatConfig,
) -> chatline::Result<Box<dyn Retriever>> {
    let search_client = SearchClient::with_options(
        &search.endpoint,
        search.api_key.clone(),
        None,
        config.timeout,
    )?;
    let vector = search.embedding_deployment.as_ref().map(|deployment| {
        VectorSearch::new(client.clone(), deployment.clone())
            .with_field(search.vector_field.clone())
    });
    let augmenter = SearchAugmenter::new(search_client, search.index.clone())
        .with_content_field(search.content_field.clone())
        .with_top(search.top)
        .with_semantic_configuration(search.semantic_configuration.clone())
        .with_vector_search(vector);
    Ok(Box::new(augmenter))
}

/// Applies a slash command.  Returns false when the user asked to quit.
fn handle_command(
    cmd: ChatCommand,
    session: &mut ChatSession<AzureOpenAI>,
    renderer: &mut PlainTextRenderer,
) -> bool {
    match cmd {
        ChatCommand::Quit => return false,
        ChatCommand::Clear => {
            session.clear();
            renderer.print_info("Conversation cleared.");
        }
        ChatCommand::Help => {
            for line in help_text().lines() {
                println!("    {}", line);
            }
        }
        ChatCommand::Deployment(name) => {
            renderer.print_info(&format!("Deployment changed to: {name}"));
            session.set_deployment(name);
        }
        ChatCommand::System(prompt) => {
            match &prompt {
                Some(p) => renderer.print_info(&format!("System prompt set to: {p}")),
                None => renderer.print_info("System prompt cleared."),
            }
            session.set_system_prompt(prompt);
        }
        ChatCommand::MaxTokens(value) => {
            session.set_max_tokens(value);
            renderer.print_info(&format!("max_tokens set to {value}"));
        }
        ChatCommand::Temperature(value) => {
            session.set_temperature(Some(value));
            renderer.print_info(&format!("temperature set to {:.2}", value));
        }
        ChatCommand::ClearTemperature => {
            session.set_temperature(None);
            renderer.print_info("temperature reset to deployment default");
        }
        ChatCommand::TopP(value) => {
            session.set_top_p(Some(value));
            renderer.print_info(&format!("top_p set to {:.2}", value));
        }
        ChatCommand::ClearTopP => {
            session.set_top_p(None);
            renderer.print_info("top_p reset to deployment default");
        }
        ChatCommand::AddStopSequence(sequence) => {
            renderer.print_info(&format!("Added stop sequence: {sequence}"));
            session.add_stop_sequence(sequence);
        }
        ChatCommand::ClearStopSequences => {
            session.clear_stop_sequences();
            renderer.print_info("Stop sequences cleared.");
        }
        ChatCommand::ListStopSequences => {
            print_stop_sequences(session.stop_sequences());
        }
        ChatCommand::Search(enabled) => {
            if !session.set_retrieval_enabled(enabled) {
                renderer.print_error("no search index is configured");
            } else if enabled {
                renderer.print_info("Retrieval enabled.");
            } else {
                renderer.print_info("Retrieval disabled.");
            }
        }
        ChatCommand::Stats => print_stats(session),
        ChatCommand::ShowConfig => print_config(session),
        ChatCommand::Invalid(message) => renderer.print_error(&message),
    }
    true
}

fn print_stats(session: &ChatSession<AzureOpenAI>) {
    let stats = session.stats();
    println!("    Session Statistics:");
    println!("      Deployment: {}", stats.deployment);
    println!("      Turns: {}", stats.turn_count);
    println!(
        "      Total tokens: {} prompt / {} completion ({} requests)",
        stats.total_prompt_tokens, stats.total_completion_tokens, stats.total_requests
    );
    if let Some(usage) = stats.last_turn_usage {
        println!(
            "      Last turn tokens: {} prompt / {} completion",
            usage.prompt_tokens, usage.completion_tokens
        );
    }
    match stats.search_index {
        Some(ref index) => println!("      Search index: {index}"),
        None => println!("      Search index: (disabled)"),
    }
}

fn print_config(session: &ChatSession<AzureOpenAI>) {
    let stats = session.stats();
    let config = session.config();
    println!("    Current Configuration:");
    println!("      Endpoint: {}", config.endpoint);
    println!("      Deployment: {}", stats.deployment);
    println!("      Max tokens: {}", stats.max_tokens);
    println!("      Temperature: {}", describe_float(stats.temperature));
    println!("      Top-p: {}", describe_float(stats.top_p));
    if let Some(prompt) = stats.system_prompt.as_deref() {
        println!("      System prompt: {}", prompt);
    } else {
        println!("      System prompt: (none)");
    }
    print_stop_sequences(&stats.stop_sequences);
    match &config.search {
        Some(search) => println!(
            "      Search: {} index {} ({})",
            search.endpoint,
            search.index,
            if session.retrieval_enabled() {
                "on"
            } else {
                "off"
            }
        ),
        None => println!("      Search: (not configured)"),
    }
}

fn print_stop_sequences(stop_sequences: &[String]) {
    if stop_sequences.is_empty() {
        println!("      Stop sequences: (none)");
    } else {
        println!("      Stop sequences:");
        for seq in stop_sequences {
            println!("        - {}", seq);
        }
    }
}

fn describe_float(value: Option<f32>) -> String {
    value
        .map(|v| format!("{v:.2}"))
        .unwrap_or_else(|| "default".to_string())
}

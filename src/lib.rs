pub mod chat;
pub mod cli;
pub mod config;
pub mod llm;
pub mod models;
pub mod server;

use chat::terminal::run_terminal;
use chat::ChatController;
use cli::{ ChatArgs, Cli, Command, ModelsArgs, ServeArgs };
use config::persona::resolve_persona;
use llm::openai::OpenAiCompatClient;
use llm::ChatBackend;
use log::info;
use server::Server;
use std::error::Error;
use std::sync::Arc;
use tokio::io::BufReader;

pub async fn run(cli: Cli) -> Result<(), Box<dyn Error + Send + Sync>> {
    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Chat(args) => chat(args).await,
        Command::Models(args) => models(args).await,
    }
}

async fn serve(args: ServeArgs) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Listen Address: {}:{}", args.host, args.port);
    info!("Static Directory: {}", args.static_dir);
    info!("Ollama URL: {}", args.backend.ollama_url);
    info!("Ollama Model: {}", args.backend.ollama_model);
    info!("vLLM URL: {}", args.backend.vllm_url);
    info!("vLLM Default Model: {}", args.backend.vllm_model);
    info!("Request Timeout: {}ms", args.backend.timeout_ms);
    info!("TLS Enabled: {}", args.enable_tls);
    info!("-------------------------");

    Server::new(args).run().await
}

async fn chat(args: ChatArgs) -> Result<(), Box<dyn Error + Send + Sync>> {
    let persona = resolve_persona(args.persona_path.as_deref())?;
    let name = persona.name.clone();
    let backend: Arc<dyn ChatBackend> = llm::new_client(args.backend_config(), persona, args.sampling());

    let config = backend.config();
    info!("--- Chat Configuration ---");
    info!("Backend: {}", config.kind);
    info!("Base URL: {}", config.base_url);
    info!("Model: {}", config.model);
    info!("Persona: {}", name);
    info!("-------------------------");

    let mut controller = ChatController::new(backend);

    let stdin = BufReader::new(tokio::io::stdin());
    run_terminal(&mut controller, &name, stdin, tokio::io::stdout()).await?;
    Ok(())
}

async fn models(args: ModelsArgs) -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = args.backend_config();
    info!("Fetching models from {}", config.endpoint("models"));

    let client = OpenAiCompatClient::new(config, Default::default(), Default::default());
    for model in client.list_models().await? {
        match model.owned_by {
            Some(owner) => println!("{}\t{}", model.id, owner),
            None => println!("{}", model.id),
        }
    }
    Ok(())
}

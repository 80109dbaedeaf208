use std::io::Write;

use anyhow::Result;
use ex314_llm::{ChatOptions, ChatRequest, ClientFactory, Message, ProviderConfig, StreamingReplyAssembler};

#[tokio::main]
async fn main() -> Result<()> {
    println!("Streaming Reply Example");
    println!("=======================\n");

    // LLM_API_URL selects a relay endpoint, otherwise Together AI is used
    let config = match std::env::var("LLM_API_URL") {
        Ok(url) => ProviderConfig::relay(url, std::env::var("LLM_API_KEY").ok()),
        Err(_) => ProviderConfig::together(std::env::var("TOGETHER_API_KEY")?),
    };
    let model = std::env::var("LLM_MODEL")
        .unwrap_or_else(|_| "meta-llama/Llama-3.3-70B-Instruct-Turbo".to_string());

    let client = ClientFactory::create_chat_client(config)?;
    let request = ChatRequest::new(
        model,
        vec![
            Message::system("You are a concise assistant."),
            Message::human("Explain ownership in Rust in two sentences."),
        ],
    )
    .with_options(ChatOptions::new().max_tokens(512));

    let reply = client.chat_stream(request).await?;
    let mut assembler = StreamingReplyAssembler::new();

    // Ctrl-C stops the stream and keeps what arrived
    let token = assembler.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });

    let result = assembler
        .assemble(reply, |fragment, _| {
            print!("{}", fragment);
            let _ = std::io::stdout().flush();
        })
        .await;

    match result {
        Ok(full) => println!("\n\n[done: {} chars]", full.chars().count()),
        Err(e) => println!("\n\n[stopped: {}] partial: {:?}", e, e.partial()),
    }

    Ok(())
}

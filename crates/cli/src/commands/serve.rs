//! `helpdesk serve` — Start the HTTP gateway.

use helpdesk_config::AppConfig;

pub async fn run(mut config: AppConfig, port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("Helpdesk gateway");
    println!("  Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("  Model:     {}", config.model);
    println!("  Knowledge: {} backend", config.knowledge.backend);

    helpdesk_gateway::start(config).await?;

    Ok(())
}

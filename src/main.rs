use clap::Parser;
use tracing_subscriber::EnvFilter;

use pedido_scan::app;

/// Verificação de pedidos por código de barras.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Address the web app listens on.
    #[arg(long, default_value = "127.0.0.1:3000")]
    bind: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pedido_scan=info,tower_http=info")),
        )
        .init();

    app::run(&cli.bind).await
}

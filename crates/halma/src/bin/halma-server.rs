//! Command-line entry point: `halma-server --bind 0.0.0.0:7777 --transport tcp`.

use clap::{Parser, ValueEnum};
use halma::prelude::*;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "halma-server", version)]
#[command(about = "Two-player Halma match server")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "HALMA_BIND", default_value = "127.0.0.1:8080")]
    bind: String,

    /// Network transport.
    #[arg(long, value_enum, default_value_t = TransportArg::Websocket)]
    transport: TransportArg,

    /// Message encoding.
    #[arg(long, value_enum, default_value_t = CodecArg::Text)]
    codec: CodecArg,

    /// Capacity of each session's inbound command channel.
    #[arg(long, default_value_t = SessionConfig::default().command_buffer)]
    command_buffer: usize,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TransportArg {
    Websocket,
    Tcp,
}

impl From<TransportArg> for TransportKind {
    fn from(arg: TransportArg) -> Self {
        match arg {
            TransportArg::Websocket => TransportKind::WebSocket,
            TransportArg::Tcp => TransportKind::Tcp,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CodecArg {
    /// Colon-separated text lines.
    Text,
    /// One JSON object per message.
    #[cfg(feature = "json")]
    Json,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive("halma=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let builder = HalmaServer::builder()
        .bind(&args.bind)
        .transport(args.transport.into())
        .session_config(SessionConfig {
            command_buffer: args.command_buffer,
        });

    match args.codec {
        CodecArg::Text => builder.build(TextCodec).await?.run().await?,
        #[cfg(feature = "json")]
        CodecArg::Json => builder.build(JsonCodec).await?.run().await?,
    }
    Ok(())
}

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use echobench::server::{EchoServer, ServerConfig};
use echobench::{ClientConfigBuilder, Harness, RunConfig};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tracing::info;

/// Echo server and round-trip benchmark for HTTP and WebSocket
#[derive(Debug, Parser)]
#[command(name = "echobench", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve GET/PUT /api and the /ws echo endpoint
    Serve(ServeArgs),
    /// Measure round-trip rates against a running server
    Bench(BenchArgs),
}

#[derive(Debug, Args)]
struct ServeArgs {
    /// Server host address
    #[arg(long, default_value = "127.0.0.1")]
    host: IpAddr,
    /// Server port
    #[arg(long, default_value_t = 8888)]
    port: u16,
    /// Maximum number of concurrent connections
    #[arg(long, default_value_t = 1000)]
    max_connections: usize,
    /// Seconds an idle connection is kept open
    #[arg(long, default_value_t = 30)]
    read_timeout_secs: u64,
}

#[derive(Debug, Args)]
struct BenchArgs {
    /// Server host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    /// Server port
    #[arg(long, default_value_t = 8888)]
    port: u16,
    /// Number of messages to send per run
    #[arg(long, default_value_t = 1000)]
    num_msgs: u64,
    /// Body of every message
    #[arg(long, default_value = "hello, world!")]
    body: String,
    /// Do not run the HTTP benchmark
    #[arg(long)]
    no_http: bool,
    /// Seconds to wait for a connection to open
    #[arg(long, default_value_t = 10)]
    connect_timeout_secs: u64,
}

async fn serve(args: ServeArgs) -> Result<()> {
    let config = ServerConfig {
        bind_addr: SocketAddr::new(args.host, args.port),
        max_connections: args.max_connections,
        read_timeout: Duration::from_secs(args.read_timeout_secs),
        ..ServerConfig::default()
    };

    info!(address = %config.bind_addr, max_connections = config.max_connections, "Starting echo server");
    EchoServer::new(config)
        .run()
        .await
        .wrap_err("Failed to run echo server")
}

async fn bench(args: BenchArgs) -> Result<()> {
    let run = RunConfig {
        host: args.host,
        port: args.port,
        message_count: args.num_msgs,
        payload_body: args.body,
    };
    let client = ClientConfigBuilder::new()
        .connect_timeout(Duration::from_secs(args.connect_timeout_secs))
        .build();

    Harness::new(run, client)
        .skip_http(args.no_http)
        .run(|result| println!("{result}"))
        .await
        .wrap_err("Benchmark run failed")?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Initialize logging
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("echobench=info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match Cli::parse().command {
        Command::Serve(args) => serve(args).await,
        Command::Bench(args) => bench(args).await,
    }
}

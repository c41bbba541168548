use clap::Parser;

/// Entry point for the Docker Sysinfo collector.
///
/// Serves host and per-container usage as JSON on `GET /sysinfo`.
///
/// # Examples
///
/// ```bash
/// RUST_LOG=debug docker-sysinfo --target-process stress --listen 127.0.0.1:3000
/// ```
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = docker_sysinfo::Config::parse();
    docker_sysinfo::run(config).await
}

use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = jotter_server::Args::parse();
    jotter_server::run(args).await
}

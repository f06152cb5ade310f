#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = examly::run().await {
        eprintln!("examly fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = examly::run_exam_cli().await {
        eprintln!("take-exam fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

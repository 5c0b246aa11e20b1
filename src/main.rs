#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = quizmart::run().await {
        eprintln!("quizmart fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

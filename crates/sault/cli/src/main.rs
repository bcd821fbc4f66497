#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sault_cli::run().await?;
    Ok(())
}

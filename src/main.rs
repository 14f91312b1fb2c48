use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    debat_bot::run().await
}

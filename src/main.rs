#[tokio::main]
async fn main() -> anyhow::Result<()> {
    feel_guard::run().await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    zone_dashboard_lib::run().await
}

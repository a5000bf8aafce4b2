use paper_etl::app;
use paper_etl::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    app::run().await
}

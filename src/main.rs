#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = classroom_connect::run().await {
        eprintln!("classroom-connect fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

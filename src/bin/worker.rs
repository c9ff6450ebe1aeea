#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = classroom_connect::run_worker().await {
        eprintln!("classroom-connect worker fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

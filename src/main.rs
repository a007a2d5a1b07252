#[tokio::main]
async fn main() {
    if let Err(err) = claimrx_lib::run().await {
        tracing::error!(error = %err, "ClaimRx exited with an error");
        eprintln!("claimrx: {err}");
        std::process::exit(1);
    }
}

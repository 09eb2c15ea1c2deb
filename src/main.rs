#[tokio::main]
async fn main() {
    let code = plugserve::app::startup::startup().await;
    std::process::exit(code);
}

#[tokio::main]
async fn main() {
    ardrive::start(std::env::args()).await;
}

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let mut bind_addr: SocketAddr = "127.0.0.1:8000".parse()?;
    let mut opts = logstorm_testserver::TestServerOptions::default();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--bind" => {
                let addr = args.next().ok_or_else(|| {
                    anyhow::anyhow!("--bind requires an address, e.g. 127.0.0.1:8000")
                })?;
                bind_addr = addr.parse()?;
            }
            "--slow-ms" => {
                let ms = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--slow-ms requires a number of milliseconds"))?;
                opts.slow_delay = Duration::from_millis(ms.parse()?);
            }
            "-h" | "--help" => {
                eprintln!(
                    "logstorm-testserver\n\nUSAGE:\n  logstorm-testserver [--bind 127.0.0.1:8000] [--slow-ms 3000]\n\nOUTPUT:\n  Prints HTTP_URL=<url> to stdout once ready."
                );
                return Ok(());
            }
            other => {
                return Err(anyhow::anyhow!("unknown argument: {other}"));
            }
        }
    }

    let listener = TcpListener::bind(bind_addr).await?;
    let addr = listener.local_addr()?;

    let stats = logstorm_testserver::TestServerStats::default();
    let app = logstorm_testserver::router(stats, opts);

    println!("HTTP_URL=http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}

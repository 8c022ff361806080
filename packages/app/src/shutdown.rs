use tokio_util::sync::CancellationToken;

/// Install a shutdown handler that listens for Ctrl-C.
///
/// Returns a `CancellationToken` that is cancelled when the signal arrives.
/// The queue actor's tickers hang off this token.
pub fn install_shutdown_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Received Ctrl-C, shutting down"),
            Err(e) => {
                tracing::warn!("Failed to listen for Ctrl-C: {}", e);
                return;
            }
        }
        token_clone.cancel();
    });

    token
}

//! Ctrl+C signal handling.

/// Waits for a Ctrl+C signal.
///
/// Race this against the main work with `tokio::select!`; dropping the losing
/// branch runs its destructors, which releases any spawned backend.
///
/// # Errors
///
/// Returns an error if the signal handler could not be installed.
///
/// # Examples
///
/// ```no_run
/// use tokenrig_cli::wait_for_ctrlc;
///
/// #[tokio::main]
/// async fn main() -> std::io::Result<()> {
///     tokio::select! {
///         res = wait_for_ctrlc() => res?,
///         _ = async { /* main work */ } => {}
///     }
///     Ok(())
/// }
/// ```
pub async fn wait_for_ctrlc() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await?;
    tracing::info!("Received Ctrl+C, shutting down");
    Ok(())
}

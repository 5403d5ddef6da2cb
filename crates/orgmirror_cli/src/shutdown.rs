use console::Term;
use tokio_util::sync::CancellationToken;

/// A token cancelled on the first Ctrl+C.
///
/// The running sync stops at its next upstream call and returns without
/// advancing any further bookmarks. A second Ctrl+C exits immediately.
pub(crate) fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let cancel = token.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "unable to install Ctrl+C handler");
            return;
        }

        let is_tty = Term::stderr().is_term();
        if is_tty {
            eprintln!("\n\nShutdown requested, finishing current operation...");
            eprintln!("Press Ctrl+C again to force quit.");
        } else {
            tracing::warn!("Shutdown requested, finishing current operation");
        }

        cancel.cancel();

        // Wait for second Ctrl+C for force quit
        if tokio::signal::ctrl_c().await.is_ok() {
            if is_tty {
                eprintln!("Force quit!");
            }
            std::process::exit(130);
        }
    });

    token
}

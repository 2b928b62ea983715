//! Web server

use std::net::SocketAddr;

use axum::Router;

use crate::prelude::*;

pub async fn serve(app: &App, router: Router) -> ClResult<()> {
	let listener = tokio::net::TcpListener::bind(app.opts.listen.as_ref()).await.map_err(|e| {
		error!("FATAL: Cannot listen on {}: {}", app.opts.listen, e);
		Error::Io(e)
	})?;
	info!("Listening on HTTP {} ({:?} mode)", app.opts.listen, app.opts.mode);

	// Connect info feeds client identification in standalone mode
	axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
		.with_graceful_shutdown(shutdown_signal())
		.await?;

	Ok(())
}

async fn shutdown_signal() {
	match tokio::signal::ctrl_c().await {
		Ok(()) => info!("Shutdown signal received"),
		Err(e) => {
			error!("Cannot listen for shutdown signal: {}", e);
			std::future::pending::<()>().await;
		}
	}
}

// vim: ts=4

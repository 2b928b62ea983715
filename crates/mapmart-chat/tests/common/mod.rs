//! Test app builders for the chat crate

#![allow(dead_code)]

use std::sync::Arc;

use mapmart_core::{App, AppOpts, AppState, SessionCtx};
use mapmart_meta_adapter_sqlite::MetaAdapterSqlite;
use mapmart_types::meta_adapter::{AuthProvider, CreateUser, MetaAdapter};
use mapmart_types::types::UserId;
use mapmart_types::worker::WorkerPool;
use tempfile::TempDir;

pub const SECRET: &[u8] = b"test-secret-test-secret-test-secret";

pub async fn create_test_adapter() -> (Arc<MetaAdapterSqlite>, TempDir) {
	let temp_dir = TempDir::new().expect("Failed to create temp directory");
	let adapter = MetaAdapterSqlite::new(temp_dir.path()).await.expect("Failed to create adapter");
	(Arc::new(adapter), temp_dir)
}

pub fn create_app(adapter: Arc<dyn MetaAdapter>) -> App {
	AppState::new(AppOpts::default(), SECRET, adapter, Arc::new(WorkerPool::new(0, 1)))
		.expect("Failed to build app")
}

pub async fn create_user(adapter: &dyn MetaAdapter, email: &str, name: &str) -> SessionCtx {
	let user_id: UserId = adapter
		.create_user(CreateUser {
			email,
			name,
			password_hash: None,
			auth_provider: AuthProvider::Local,
			is_admin: false,
		})
		.await
		.expect("Should create user");
	SessionCtx { user_id, is_admin: false }
}

// vim: ts=4

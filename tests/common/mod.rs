//! Common test utilities for bridge tests
//!
//! Provides shared helpers for:
//! - Creating services over the bundled SQLite driver
//! - Seeding an in-memory database through plain statements
//! - Starting a driver server on an ephemeral port

#![allow(dead_code)]

use sqlbridge::{BridgeConfig, BridgeServices, DriverListener};
use sqlbridge_client::protocol::Handle;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;

pub const MEMORY_URL: &str = "sqlite::memory:";

pub fn create_services() -> BridgeServices {
    BridgeServices::with_sqlite(&BridgeConfig::default())
}

pub fn open_memory(services: &BridgeServices) -> Handle {
    services
        .connections
        .open_connection(MEMORY_URL, &HashMap::new())
        .expect("Failed to open in-memory connection")
}

pub fn open_with_max_rows(services: &BridgeServices, max_rows: i32) -> Handle {
    let mut properties = HashMap::new();
    properties.insert("max_rows".to_string(), max_rows.to_string());
    services
        .connections
        .open_connection(MEMORY_URL, &properties)
        .expect("Failed to open in-memory connection")
}

/// Run each statement through a throwaway plain statement
pub fn exec_all(services: &BridgeServices, connection_id: Handle, sql: &[&str]) {
    let stmt = services.statements.create_statement(connection_id).unwrap();
    for s in sql {
        services
            .statements
            .execute_statement(stmt, -1, Some(s))
            .unwrap_or_else(|e| panic!("{} failed: {}", s, e));
    }
    services.statements.close_statement(stmt).unwrap();
}

/// Services with a connection holding a seeded `users` table
pub fn create_seeded_services() -> (BridgeServices, Handle) {
    let services = create_services();
    let conn = open_memory(&services);
    exec_all(
        &services,
        conn,
        &[
            "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL, age INTEGER, active BOOLEAN, born DATE, wakes TIME)",
            "INSERT INTO users (id, name, age, active) VALUES (1, 'Alice', 30, 1)",
            "INSERT INTO users (id, name, age, active) VALUES (2, 'Bob', 25, 1)",
            "INSERT INTO users (id, name, age, active) VALUES (3, 'Charlie', 35, 0)",
        ],
    );
    (services, conn)
}

pub struct TestServer {
    pub addr: String,
    pub services: Arc<BridgeServices>,
    shutdown: watch::Sender<bool>,
}

impl TestServer {
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }
}

pub async fn start_server() -> TestServer {
    let services = Arc::new(create_services());
    let listener = DriverListener::bind("127.0.0.1:0", services.clone())
        .await
        .expect("Failed to bind listener");
    let addr = listener.local_addr().unwrap().to_string();

    let (shutdown, rx) = watch::channel(false);
    tokio::spawn(listener.serve(rx));

    TestServer {
        addr,
        services,
        shutdown,
    }
}

use crate::config::Config;
use hyper::{Method, Uri, Version};
use std::net::SocketAddr;

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    println!("======================================");
    println!("Intake API server started successfully");
    println!("Listening on: http://{addr}");
    println!("Log level: {}", config.logging.level);
    if let Some(workers) = config.server.workers {
        println!("Worker threads: {workers}");
    }
    println!("Using Tokio runtime for concurrency");
    println!("======================================\n");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    eprintln!("[ERROR] Failed to serve connection: {err:?}");
}

pub fn log_request(method: &Method, uri: &Uri, version: Version) {
    println!("[Request] {method} {uri} {version:?}");
}

pub fn log_dispatch(method: &str, path: &str, status: u16) {
    println!("[API] {method} {path} - {status}");
}

pub fn log_error(message: &str) {
    eprintln!("[ERROR] {message}");
}

pub fn log_warning(message: &str) {
    eprintln!("[WARN] {message}");
}

pub fn log_item_created(resource: &str, table: &str, id: &str) {
    println!("[Store] Created {resource} item in table {table}: id={id}");
}

pub fn log_items_scanned(count: usize, table: &str, limit: usize) {
    println!("[Store] Scanned {count} items from {table} (limit={limit})");
}

pub fn log_item_fetched(table: &str, id: &str, found: bool) {
    println!("[Store] Get item from {table} id={id} found={found}");
}

pub fn log_read_flag_updated(table: &str, id: &str, value: bool) {
    println!("[Store] Updated read flag on {table} id={id} to {value}");
}

pub fn log_item_updated(table: &str, id: &str, fields: &[String]) {
    println!("[Store] Partially updated {table} id={id} fields={fields:?}");
}

pub fn log_item_deleted(resource: &str, id: &str, table: &str) {
    println!("[Store] Deleted {resource} id={id} from table {table}");
}

pub fn log_delete_missing(table: &str, id: &str) {
    println!("[Store] Delete requested for {table} id={id} but item not found");
}

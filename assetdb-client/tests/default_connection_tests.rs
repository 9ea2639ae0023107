use assetdb_client::default_connection;
use std::sync::Arc;
use std::thread;

#[test]
fn default_connection_is_built_once_per_process() {
    let handles: Vec<_> = (0..4).map(|_| thread::spawn(default_connection)).collect();
    let connections: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap().unwrap())
        .collect();

    let first = &connections[0];
    assert!(connections.iter().all(|con| Arc::ptr_eq(con, first)));
    assert!(Arc::ptr_eq(first, &default_connection().unwrap()));
}

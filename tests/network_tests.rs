//! Network Tests
//!
//! KV server and pooled client over real sockets.

mod common;

use std::io::{BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use bytes::Bytes;
use wordbank::network::{KvClient, Keyspace, Server};
use wordbank::protocol::{read_command, read_response, write_command, write_response, Command, Frame};
use wordbank::{Config, WordbankError};

use common::TestServer;

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

fn client_for(server: &TestServer) -> KvClient {
    let config = Config::builder().read_timeout_ms(2000).pool_size(4).build();
    KvClient::connect(&server.addr_string(), &config).unwrap()
}

// =============================================================================
// Client / Server Round Trips
// =============================================================================

#[test]
fn test_ping() {
    let server = TestServer::start();
    client_for(&server).ping().unwrap();
}

#[test]
fn test_string_commands() {
    let server = TestServer::start();
    let client = client_for(&server);

    assert_eq!(client.get("missing").unwrap(), None);
    client.set("a", "1").unwrap();
    client.set("b", "2").unwrap();
    assert_eq!(client.get("a").unwrap(), Some(Bytes::from_static(b"1")));

    let values = client
        .mget(&["a".to_string(), "x".to_string(), "b".to_string()])
        .unwrap();
    assert_eq!(
        values,
        vec![Some(Bytes::from_static(b"1")), None, Some(Bytes::from_static(b"2"))]
    );
    assert!(client.mget(&[]).unwrap().is_empty());

    assert_eq!(client.del(&["a", "x"]).unwrap(), 1);
    assert_eq!(client.get("a").unwrap(), None);
}

#[test]
fn test_hash_commands() {
    let server = TestServer::start();
    let client = client_for(&server);

    assert!(client.hgetall("user_item:1").unwrap().is_empty());
    assert!(client.hset("user_item:1", "cat", "{}").unwrap());
    assert!(!client.hset("user_item:1", "cat", "{\"Word\":\"cat\"}").unwrap());
    assert!(client.hset("user_item:1", "dog", "{}").unwrap());

    assert_eq!(
        client.hget("user_item:1", "cat").unwrap(),
        Some(Bytes::from_static(b"{\"Word\":\"cat\"}"))
    );
    assert_eq!(client.hget("user_item:1", "owl").unwrap(), None);

    let mut fields: Vec<String> = client
        .hgetall("user_item:1")
        .unwrap()
        .into_iter()
        .map(|(field, _)| field)
        .collect();
    fields.sort();
    assert_eq!(fields, vec!["cat", "dog"]);

    assert!(client.hdel("user_item:1", "cat").unwrap());
    assert!(!client.hdel("user_item:1", "cat").unwrap());
}

#[test]
fn test_error_reply_becomes_backend_error() {
    let server = TestServer::start();
    let client = client_for(&server);

    client.set("plain", "v").unwrap();
    let err = client.hget("plain", "f").unwrap_err();
    match err {
        WordbankError::Backend { op, key, message } => {
            assert_eq!(op, "HGET");
            assert_eq!(key, "plain");
            assert!(message.starts_with("WRONGTYPE"));
        }
        other => panic!("expected backend error, got {:?}", other),
    }

    // The connection stays usable after an error reply
    client.ping().unwrap();
}

#[test]
fn test_connections_are_reused() {
    let server = TestServer::start();
    let client = client_for(&server);

    for i in 0..20 {
        client.set(&format!("k{}", i), "v").unwrap();
    }
    assert_eq!(client.idle_connections(), 1);
}

#[test]
fn test_concurrent_clients() {
    let server = TestServer::start();
    let client = Arc::new(client_for(&server));

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let client = Arc::clone(&client);
            thread::spawn(move || {
                for i in 0..50 {
                    let field = format!("{}-{}", t, i);
                    client.hset("shared", &field, "v").unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(client.hgetall("shared").unwrap().len(), 400);
    assert!(client.idle_connections() <= 4);
}

// =============================================================================
// Server Connection Handling
// =============================================================================

#[test]
fn test_invalid_command_keeps_connection_open() {
    let server = TestServer::start();
    let stream = TcpStream::connect(server.addr).unwrap();
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut writer = stream;

    writer.write_all(b"*1\r\n$5\r\nFLUSH\r\n").unwrap();
    assert!(matches!(read_response(&mut reader).unwrap(), Frame::Error(_)));

    write_command(&mut writer, &Command::Ping).unwrap();
    assert_eq!(
        read_response(&mut reader).unwrap(),
        Frame::Simple("PONG".to_string())
    );
}

#[test]
fn test_malformed_frame_closes_connection() {
    let server = TestServer::start();
    let stream = TcpStream::connect(server.addr).unwrap();
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut writer = stream;

    writer.write_all(b"?garbage\r\n").unwrap();
    assert!(matches!(read_response(&mut reader).unwrap(), Frame::Error(_)));
    assert!(read_response(&mut reader).is_err());
}

#[test]
fn test_connection_limit() {
    let server = TestServer::start_with(Config::builder().max_connections(1));

    // First client occupies the only slot
    let first = client_for(&server);
    first.ping().unwrap();

    let stream = TcpStream::connect(server.addr).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
    let mut reader = BufReader::new(stream);
    match read_response(&mut reader).unwrap() {
        Frame::Error(message) => assert!(message.contains("max number of clients")),
        other => panic!("expected rejection, got {:?}", other),
    }
}

#[test]
fn test_active_connections_and_shutdown() {
    let config = Config::builder().listen_addr("127.0.0.1:0").build();
    let server = Server::bind(config, Arc::new(Keyspace::new())).unwrap();
    let addr = server.local_addr().unwrap();

    thread::scope(|scope| {
        let running = scope.spawn(|| server.run());

        let client = KvClient::connect(&addr.to_string(), &Config::default()).unwrap();
        client.ping().unwrap();
        assert!(wait_until(|| server.active_connections() == 1));

        drop(client);
        assert!(wait_until(|| server.active_connections() == 0));

        server.shutdown();
        running.join().unwrap().unwrap();
    });
}

// =============================================================================
// Client Failure Handling
// =============================================================================

#[test]
fn test_closed_idle_connection_is_replaced() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let fake = thread::spawn(move || {
        // First connection is closed without a word
        let (first, _) = listener.accept().unwrap();
        drop(first);

        // Second connection answers one PING
        let (second, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(second.try_clone().unwrap());
        let mut writer = second;
        assert_eq!(read_command(&mut reader).unwrap(), Command::Ping);
        write_response(&mut writer, &Frame::Simple("PONG".to_string())).unwrap();
    });

    let config = Config::builder().read_timeout_ms(2000).build();
    let client = KvClient::connect(&addr.to_string(), &config).unwrap();
    thread::sleep(Duration::from_millis(50));

    client.ping().unwrap();
    fake.join().unwrap();
}

#[test]
fn test_lost_reply_is_not_resent() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    // Server reads the command, then hangs up before replying
    let fake = thread::spawn(move || {
        let (conn, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(conn);
        let command = read_command(&mut reader).unwrap();
        drop(reader);
        (listener, command)
    });

    let config = Config::builder().read_timeout_ms(2000).build();
    let client = KvClient::connect(&addr.to_string(), &config).unwrap();

    let err = client.set("counter", "1").unwrap_err();
    assert!(matches!(err, WordbankError::Network(_)), "got {:?}", err);

    let (listener, command) = fake.join().unwrap();
    assert_eq!(command.name(), "SET");

    // No second connection was opened to repeat the write
    listener.set_nonblocking(true).unwrap();
    match listener.accept() {
        Err(e) => assert_eq!(e.kind(), std::io::ErrorKind::WouldBlock),
        Ok(_) => panic!("command was sent again on a new connection"),
    }
}

#[test]
fn test_unresponsive_server_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let config = Config::builder().read_timeout_ms(100).build();
    let client = KvClient::connect(&addr.to_string(), &config).unwrap();

    let err = client.get("k").unwrap_err();
    assert!(matches!(err, WordbankError::Timeout(_)), "got {:?}", err);
    assert_eq!(client.idle_connections(), 0);
    drop(listener);
}

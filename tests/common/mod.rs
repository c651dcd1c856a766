//! Shared test helpers: backend fixtures and an in-process KV server.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tempfile::TempDir;
use wordbank::model::{Meaning, Translation};
use wordbank::network::{Keyspace, Server, ShutdownHandle};
use wordbank::storage::{EmbeddedStorage, MemoryStorage, RemoteStorage};
use wordbank::{Config, DictionaryItem, Storage};

// =============================================================================
// KV Server
// =============================================================================

/// Bundled KV server on an ephemeral port, stopped on drop
pub struct TestServer {
    pub addr: SocketAddr,
    pub keyspace: Arc<Keyspace>,
    shutdown: ShutdownHandle,
    thread: Option<JoinHandle<()>>,
}

impl TestServer {
    pub fn start() -> Self {
        Self::start_with(Config::builder())
    }

    pub fn start_with(builder: wordbank::config::ConfigBuilder) -> Self {
        let config = builder.listen_addr("127.0.0.1:0").build();
        let keyspace = Arc::new(Keyspace::new());
        let server = Server::bind(config, Arc::clone(&keyspace)).unwrap();
        let addr = server.local_addr().unwrap();
        let shutdown = server.shutdown_handle();

        let thread = thread::spawn(move || {
            server.run().unwrap();
        });

        Self {
            addr,
            keyspace,
            shutdown,
            thread: Some(thread),
        }
    }

    pub fn addr_string(&self) -> String {
        self.addr.to_string()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.shutdown();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

// =============================================================================
// Backend Fixtures
// =============================================================================

/// Keeps whatever a backend needs alive for the duration of a test
pub enum Guard {
    None,
    Dir(TempDir),
    Server(TestServer),
}

pub struct Fixture {
    pub storage: Arc<dyn Storage>,
    pub guard: Guard,
}

pub fn setup_memory() -> Fixture {
    Fixture {
        storage: Arc::new(MemoryStorage::new()),
        guard: Guard::None,
    }
}

pub fn setup_embedded() -> Fixture {
    let dir = TempDir::new().unwrap();
    let storage = EmbeddedStorage::open(dir.path().join("wordbank.redb")).unwrap();
    Fixture {
        storage: Arc::new(storage),
        guard: Guard::Dir(dir),
    }
}

pub fn setup_remote() -> Fixture {
    let server = TestServer::start();
    let config = Config::builder().read_timeout_ms(2000).build();
    let storage = RemoteStorage::connect(&server.addr_string(), &config).unwrap();
    Fixture {
        storage: Arc::new(storage),
        guard: Guard::Server(server),
    }
}

// =============================================================================
// Dictionary Records
// =============================================================================

/// A word with the given Russian translations and one meaning
pub fn word(word: &str, ru: &[&str]) -> DictionaryItem {
    let mut item = DictionaryItem::new(word);
    item.phonetics.text = format!("/{}/", word);
    item.meanings.push(Meaning {
        part_of_speech: "noun".to_string(),
        definition: format!("definition of {}", word),
        examples: vec![format!("a {} example", word)],
        ..Default::default()
    });
    for text in ru {
        item.translations.push(Translation {
            text: text.to_string(),
            language: "ru".to_string(),
            part_of_speech: "noun".to_string(),
            ..Default::default()
        });
    }
    item
}

/// A word with no translations and no meanings
pub fn bare_word(word: &str) -> DictionaryItem {
    DictionaryItem::new(word)
}

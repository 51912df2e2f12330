use std::{
    collections::HashMap,
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
};

use crate::types::TypeInfo;

static NEXT_UNIQUE_ID: AtomicU64 = AtomicU64::new(0);

/// Opaque identifier naming a service within a container.
///
/// Tokens are cheap to clone and compare; the container uses them as map keys
/// only. Three flavours exist:
/// - [`Token::named`] compares by name, so two named tokens with the same
///   string are the same token
/// - [`Token::unique`] is distinct from every other token ever created; the
///   label is only used for display
/// - [`Token::of`] keys a service by its Rust type
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Token(TokenKind);

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
enum TokenKind {
    Named(Arc<str>),
    Unique { id: u64, label: Arc<str> },
    Typed(TypeInfo),
}

impl Token {
    pub fn named(name: impl AsRef<str>) -> Token {
        Token(TokenKind::Named(Arc::from(name.as_ref())))
    }

    /// Creates a token that is equal only to its own clones
    pub fn unique(label: impl AsRef<str>) -> Token {
        Token(TokenKind::Unique {
            id: NEXT_UNIQUE_ID.fetch_add(1, Ordering::Relaxed),
            label: Arc::from(label.as_ref()),
        })
    }

    pub fn of<T: 'static + ?Sized>() -> Token {
        Token(TokenKind::Typed(TypeInfo::of::<T>()))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            TokenKind::Named(name) => f.write_str(name),
            TokenKind::Unique { id, label } => write!(f, "{label}#{id}"),
            TokenKind::Typed(info) => f.write_str(info.type_name),
        }
    }
}

impl From<&str> for Token {
    fn from(name: &str) -> Token {
        Token::named(name)
    }
}

impl From<String> for Token {
    fn from(name: String) -> Token {
        Token::named(name)
    }
}

/// Name to token memoization table.
///
/// Hands out one stable unique token per name, so independent parts of an
/// application can agree on a token by string without sharing a constant.
#[derive(Default)]
pub struct TokenRegistry {
    tokens: Mutex<HashMap<String, Token>>,
}

impl TokenRegistry {
    pub fn new() -> TokenRegistry {
        TokenRegistry::default()
    }

    /// Returns the token registered under `name`, creating it on first use
    pub fn token(&self, name: &str) -> Token {
        let mut tokens = self.tokens.lock().expect("token registry lock poisoned");
        tokens
            .entry(name.to_owned())
            .or_insert_with(|| Token::unique(name))
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<Token> {
        let tokens = self.tokens.lock().expect("token registry lock poisoned");
        tokens.get(name).cloned()
    }
}

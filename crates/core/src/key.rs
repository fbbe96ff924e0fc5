// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock keys and the factories that derive them from application keys
//!
//! A [`LockKey`] is always safe to use as a single segment of a coordination
//! service path. Factories are responsible for getting arbitrary application
//! keys into that shape without collisions.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Serialize;
use std::marker::PhantomData;
use thiserror::Error;

/// Errors from turning an application key into a lock key
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("empty lock key")]
    Empty,
    #[error("lock key {key:?} is not a safe path segment: {reason}")]
    UnsafeSegment { key: String, reason: &'static str },
    #[error("lock key could not be serialized: {0}")]
    Unserializable(#[from] serde_json::Error),
    #[error("lock key {key:?} could not be decoded: {reason}")]
    Undecodable { key: String, reason: String },
}

/// Normalized, path-safe identifier for a lock
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LockKey(String);

impl LockKey {
    /// Wrap an already-normalized value, rejecting anything that is not a
    /// single safe path segment.
    pub fn new(value: impl Into<String>) -> Result<Self, KeyError> {
        let value = value.into();
        validate_segment(&value)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for LockKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for LockKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn validate_segment(value: &str) -> Result<(), KeyError> {
    let unsafe_segment = |reason| KeyError::UnsafeSegment {
        key: value.to_string(),
        reason,
    };

    if value.is_empty() {
        return Err(KeyError::Empty);
    }
    if value == "." || value == ".." {
        return Err(unsafe_segment("relative path component"));
    }
    if value.contains(['/', '\\']) {
        return Err(unsafe_segment("contains a path separator"));
    }
    if value.chars().any(char::is_control) {
        return Err(unsafe_segment("contains a control character"));
    }
    Ok(())
}

/// Converts application keys of type `K` into lock keys
///
/// Implementations must be deterministic and injective: the same application
/// key always yields the same lock key, and distinct application keys never
/// share one.
pub trait KeyFactory<K: ?Sized>: Send + Sync {
    fn to_key(&self, key: &K) -> Result<LockKey, KeyError>;
}

/// Encode raw bytes as a path-safe segment (URL-safe base64, unpadded)
pub fn encode_segment(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// String keys, base64url-encoded so that separators and control characters
/// in the application key can never reach the coordination namespace.
#[derive(Clone, Copy, Debug, Default)]
pub struct StringKeyFactory;

impl StringKeyFactory {
    pub fn new() -> Self {
        Self
    }
}

impl KeyFactory<str> for StringKeyFactory {
    fn to_key(&self, key: &str) -> Result<LockKey, KeyError> {
        if key.is_empty() {
            return Err(KeyError::Empty);
        }
        LockKey::new(encode_segment(key.as_bytes()))
    }
}

impl KeyFactory<String> for StringKeyFactory {
    fn to_key(&self, key: &String) -> Result<LockKey, KeyError> {
        KeyFactory::<str>::to_key(self, key.as_str())
    }
}

/// Recover the application string behind a key made by [`StringKeyFactory`]
pub fn decode_string_key(key: &LockKey) -> Result<String, KeyError> {
    let undecodable = |reason: String| KeyError::Undecodable {
        key: key.as_str().to_string(),
        reason,
    };
    let bytes = URL_SAFE_NO_PAD
        .decode(key.as_str())
        .map_err(|e| undecodable(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| undecodable(e.to_string()))
}

/// Composite keys: serialized to JSON, then base64url-encoded.
///
/// Field order follows the `Serialize` impl, so two structurally equal keys
/// always produce the same lock key. Map-typed keys should use ordered maps.
pub struct SerdeKeyFactory<K: ?Sized> {
    _key: PhantomData<fn(&K)>,
}

impl<K: ?Sized> SerdeKeyFactory<K> {
    pub fn new() -> Self {
        Self { _key: PhantomData }
    }
}

impl<K: ?Sized> Default for SerdeKeyFactory<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ?Sized> Clone for SerdeKeyFactory<K> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<K: ?Sized> std::fmt::Debug for SerdeKeyFactory<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerdeKeyFactory").finish()
    }
}

impl<K: Serialize + ?Sized> KeyFactory<K> for SerdeKeyFactory<K> {
    fn to_key(&self, key: &K) -> Result<LockKey, KeyError> {
        let json = serde_json::to_vec(key)?;
        LockKey::new(encode_segment(&json))
    }
}

/// Key factory backed by an injected normalization function
#[derive(Clone)]
pub struct FnKeyFactory<F> {
    normalize: F,
}

impl<F> FnKeyFactory<F> {
    pub fn new(normalize: F) -> Self {
        Self { normalize }
    }
}

impl<K, F> KeyFactory<K> for FnKeyFactory<F>
where
    K: ?Sized,
    F: Fn(&K) -> Result<LockKey, KeyError> + Send + Sync,
{
    fn to_key(&self, key: &K) -> Result<LockKey, KeyError> {
        (self.normalize)(key)
    }
}

#[cfg(test)]
#[path = "key_tests.rs"]
mod tests;

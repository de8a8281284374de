//! Incremental decoding of concatenated JSON records.
//!
//! The Go tool prints one JSON object per module, back to back, without an
//! enclosing array. [`JsonStream`] yields those objects lazily from any
//! reader and stops for good at the first malformed record.

use crate::error::{ResolveError, Result};
use serde::de::DeserializeOwned;
use serde_json::StreamDeserializer;
use serde_json::de::IoRead;
use std::io::Read;
use std::iter::FusedIterator;

/// A lazy, fail-closed iterator over JSON records read from `R`.
pub struct JsonStream<R: Read, T> {
    inner: StreamDeserializer<'static, IoRead<R>, T>,
    operation: &'static str,
    failed: bool,
}

impl<R: Read, T: DeserializeOwned> JsonStream<R, T> {
    /// Starts decoding `reader`; `operation` labels any decode error.
    ///
    /// # Examples
    ///
    /// ```
    /// use modresolve::stream::JsonStream;
    /// use serde_json::Value;
    ///
    /// let input = br#"{"Path":"a"} {"Path":"b"}"#;
    /// let paths: Vec<String> = JsonStream::<_, Value>::new(&input[..], "example")
    ///     .map(|record| record.map(|value| value["Path"].to_string()))
    ///     .collect::<Result<_, _>>()?;
    /// assert_eq!(paths, ["\"a\"", "\"b\""]);
    /// # Ok::<(), modresolve::error::ResolveError>(())
    /// ```
    pub fn new(reader: R, operation: &'static str) -> Self {
        Self {
            inner: serde_json::Deserializer::from_reader(reader).into_iter(),
            operation,
            failed: false,
        }
    }
}

impl<R: Read, T: DeserializeOwned> Iterator for JsonStream<R, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.inner.next()? {
            Ok(record) => Some(Ok(record)),
            Err(source) => {
                self.failed = true;
                Some(Err(ResolveError::Decode {
                    operation: self.operation,
                    source,
                }))
            }
        }
    }
}

impl<R: Read, T: DeserializeOwned> FusedIterator for JsonStream<R, T> {}

//! Users specify a map and a reduce function, and the framework runs
//! those functions over a set of input documents, either in-process or
//! distributed across workers. Data moves between phases through files in a
//! shared directory, see [`store::IntermediateStore`].

use std::fmt;
use std::fmt::Formatter;

use serde::{Deserialize, Serialize};

pub mod codec;
pub mod job;
pub mod map;
pub mod merge;
pub mod partition;
pub mod reduce;
pub mod sequential;
pub mod store;
pub mod task;

pub use job::{Job, JobState};
pub use partition::{ihash, partition};
pub use store::IntermediateStore;
pub use task::{Phase, Task};

/////////////////////////////////////////////////////////////////////////////
// MapReduce application types
/////////////////////////////////////////////////////////////////////////////

/// The output of an application map function.
///
/// There are 2 layers of [`anyhow::Result`]s here. The outer layer
/// accounts for errors that arise while creating the iterator.
/// The inner layer accounts for errors that occur during iteration.
///
/// This accomodates both batch (all keys emitted at once) and lazy
/// (keys only emitted when the iterator is consumed) map operations.
pub type MapOutput = anyhow::Result<Box<dyn Iterator<Item = anyhow::Result<KeyValue>>>>;

/// A map function takes a document as a key-value pair, where the key is
/// the document identifier and the value is its full contents.
///
/// It returns an iterator that yields intermediate key-value pairs.
pub type MapFn = fn(document: KeyValue) -> MapOutput;

/// A reduce function takes in a key and an iterator over every value
/// emitted for that key. It returns a single output value.
pub type ReduceFn =
    fn(key: &str, values: Box<dyn Iterator<Item = &str> + '_>) -> anyhow::Result<String>;

/// A map reduce application.
#[derive(Copy, Clone)]
pub struct Workload {
    pub name: &'static str,
    pub map_fn: MapFn,
    pub reduce_fn: ReduceFn,
}

impl fmt::Debug for Workload {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workload").field("name", &self.name).finish()
    }
}

/////////////////////////////////////////////////////////////////////////////
// Key-value pairs
/////////////////////////////////////////////////////////////////////////////

/// A single key-value pair.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub struct KeyValue {
    /// The key.
    pub key: String,

    /// The value.
    pub value: String,
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.value)
    }
}

impl KeyValue {
    /// Construct a new key-value pair from the given key and value.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Get the key of this key-value pair.
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Get the value of this key-value pair.
    #[inline]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Consumes the key-value pair and returns the key.
    #[inline]
    pub fn into_key(self) -> String {
        self.key
    }

    /// Consumes the key-value pair and returns the value.
    #[inline]
    pub fn into_value(self) -> String {
        self.value
    }
}

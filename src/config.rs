/// Construction options shared by both store variants
///
/// # Examples
///
/// ```
/// use sovran_polystore::{PolyStore, StoreConfig};
///
/// let config = StoreConfig::default().with_segment_capacity(64);
/// let store = PolyStore::<dyn std::fmt::Debug>::with_config(config);
/// assert_eq!(store.config().segment_capacity, 64);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreConfig {
    /// Number of elements reserved when a segment is first created
    pub segment_capacity: usize,
}

impl StoreConfig {
    /// Sets the initial capacity of newly created segments
    pub fn with_segment_capacity(mut self, capacity: usize) -> Self {
        self.segment_capacity = capacity;
        self
    }
}

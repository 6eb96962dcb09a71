use std::any::type_name;
use std::fmt;
use std::hash::BuildHasherDefault;
use std::ops::ControlFlow;

use hashbrown::hash_map::Entry;
use hashbrown::HashMap;
use rustc_hash::FxHasher;

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::segment::Segment;
use crate::type_key::TypeKey;

type SegmentMap<B> = HashMap<TypeKey, Box<dyn Segment<B>>, BuildHasherDefault<FxHasher>>;

/// Maps each concrete type to the segment holding its values
///
/// Segments are created on first use and owned exclusively by the registry.
/// Iteration order across segments is unspecified.
pub struct SegmentRegistry<B: ?Sized + 'static> {
    segments: SegmentMap<B>,
    config: StoreConfig,
}

impl<B: ?Sized + 'static> SegmentRegistry<B> {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Creates an empty registry whose segments start with the configured capacity
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            segments: SegmentMap::default(),
            config,
        }
    }

    /// The configuration new segments are created with
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns the segment registered for `key`, creating an empty `S` if the
    /// key has none yet
    ///
    /// # Errors
    ///
    /// Returns `StoreError::SegmentMismatch` if the segment already registered
    /// for `key` is not an `S`, or if a new `S` would hold elements of a type
    /// other than `key`. The registry is unchanged in both cases.
    pub fn get_or_create<S: Segment<B>>(&mut self, key: TypeKey) -> Result<&mut S, StoreError> {
        let mismatch = StoreError::SegmentMismatch {
            key,
            segment: type_name::<S>(),
        };
        let segment = match self.segments.entry(key) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let capacity = self.config.segment_capacity;
                let fresh = S::with_capacity(key, capacity);
                if fresh.element_type() != key {
                    log::warn!(
                        "refusing to register a segment of {} under {key}",
                        fresh.element_type()
                    );
                    return Err(mismatch);
                }
                log::trace!("creating segment for {key} with capacity {capacity}");
                entry.insert(Box::new(fresh))
            }
        };
        segment
            .as_any_mut()
            .downcast_mut::<S>()
            .ok_or(mismatch)
    }

    /// Returns the segment for `key` if one exists and it is an `S`
    pub fn get<S: Segment<B>>(&self, key: &TypeKey) -> Option<&S> {
        self.segments
            .get(key)
            .and_then(|segment| segment.as_any().downcast_ref::<S>())
    }

    /// Returns the segment for `key` with write access if one exists and it is an `S`
    pub fn get_mut<S: Segment<B>>(&mut self, key: &TypeKey) -> Option<&mut S> {
        self.segments
            .get_mut(key)
            .and_then(|segment| segment.as_any_mut().downcast_mut::<S>())
    }

    /// Returns true if a segment exists for `key`
    pub fn contains(&self, key: &TypeKey) -> bool {
        self.segments.contains_key(key)
    }

    /// Number of registered segments
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Keys of all registered segments, in unspecified order
    pub fn keys(&self) -> Vec<TypeKey> {
        self.segments.keys().copied().collect()
    }

    /// Sum of the lengths of all segments
    pub fn total_length(&self) -> usize {
        self.segments.values().map(|segment| segment.len()).sum()
    }

    /// Drops every segment and every element they hold
    pub fn clear(&mut self) {
        self.segments.clear();
    }

    /// Calls `f` once per segment
    pub fn for_each_segment<F>(&self, mut f: F)
    where
        F: FnMut(&dyn Segment<B>),
    {
        for segment in self.segments.values() {
            f(&**segment);
        }
    }

    /// Calls `f` once per segment, with write access
    pub fn for_each_segment_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut dyn Segment<B>),
    {
        for segment in self.segments.values_mut() {
            f(&mut **segment);
        }
    }

    /// Calls `f` once per segment until it breaks
    pub fn try_for_each_segment<F>(&self, mut f: F) -> ControlFlow<()>
    where
        F: FnMut(&dyn Segment<B>) -> ControlFlow<()>,
    {
        self.segments
            .values()
            .try_for_each(|segment| f(&**segment))
    }
}

impl<B: ?Sized + 'static> Default for SegmentRegistry<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: ?Sized + 'static> fmt::Debug for SegmentRegistry<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.segments
                    .iter()
                    .map(|(key, segment)| (key.name(), segment.len())),
            )
            .finish()
    }
}

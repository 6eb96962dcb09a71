use std::fmt;
use std::ops::ControlFlow;

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::registry::SegmentRegistry;
use crate::segment::BoxedSegment;
use crate::type_key::{Concrete, TypeKey, UpcastFrom};

/// A heterogeneous store that holds every value in its own heap allocation,
/// grouping the owning handles by concrete type
///
/// This is the indirect counterpart of [`PolyStore`](crate::PolyStore): each
/// value costs one allocation and one pointer hop during iteration, but values
/// that are already boxed as `Box<B>` can be stored without knowing their
/// concrete type (see [`push_dyn`](Self::push_dyn)).
///
/// # Examples
///
/// ```
/// use sovran_polystore::{impl_upcast, BoxedPolyStore, StoreError};
///
/// trait Job {
///     fn cost(&self) -> u32;
/// }
///
/// struct Build;
/// struct Deploy { targets: u32 }
///
/// impl Job for Build {
///     fn cost(&self) -> u32 { 10 }
/// }
///
/// impl Job for Deploy {
///     fn cost(&self) -> u32 { self.targets }
/// }
///
/// impl_upcast!(dyn Job);
///
/// let mut jobs = BoxedPolyStore::<dyn Job>::new();
/// jobs.push(Box::new(Build))?;
/// jobs.push(Box::new(Deploy { targets: 3 }))?;
///
/// let mut total = 0;
/// jobs.for_each(|job| total += job.cost());
/// assert_eq!(total, 13);
/// # Ok::<(), StoreError>(())
/// ```
pub struct BoxedPolyStore<B: ?Sized + 'static> {
    registry: SegmentRegistry<B>,
    len: usize,
}

impl<B: ?Sized + 'static> BoxedPolyStore<B> {
    /// Creates a new, empty store
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Creates a new, empty store using `config` for every segment it creates
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            registry: SegmentRegistry::with_config(config),
            len: 0,
        }
    }

    /// The configuration this store was created with
    pub fn config(&self) -> &StoreConfig {
        self.registry.config()
    }

    /// Stores the boxed `value` in the segment for `T`
    ///
    /// # Errors
    ///
    /// Returns `StoreError::SegmentMismatch` if the segment registered for `T`
    /// has an unexpected type. The store is unchanged in that case.
    pub fn push<T>(&mut self, value: Box<T>) -> Result<&mut B, StoreError>
    where
        B: UpcastFrom<T>,
        T: 'static,
    {
        self.insert_handle(TypeKey::of::<T>(), B::upcast_box(value))
    }

    /// Stores an already type-erased value in the segment of its runtime
    /// concrete type
    ///
    /// # Examples
    ///
    /// ```
    /// use sovran_polystore::{impl_upcast, BoxedPolyStore, Concrete, StoreError};
    ///
    /// trait Plugin: Concrete {
    ///     fn id(&self) -> &'static str;
    /// }
    ///
    /// struct Audio;
    /// struct Video;
    ///
    /// impl Plugin for Audio {
    ///     fn id(&self) -> &'static str { "audio" }
    /// }
    ///
    /// impl Plugin for Video {
    ///     fn id(&self) -> &'static str { "video" }
    /// }
    ///
    /// impl_upcast!(dyn Plugin);
    ///
    /// let loaded: Vec<Box<dyn Plugin>> = vec![Box::new(Audio), Box::new(Video), Box::new(Audio)];
    ///
    /// let mut plugins = BoxedPolyStore::<dyn Plugin>::new();
    /// for plugin in loaded {
    ///     plugins.push_dyn(plugin)?;
    /// }
    ///
    /// assert_eq!(plugins.segment_len::<Audio>(), 2);
    /// assert_eq!(plugins.segment_len::<Video>(), 1);
    /// # Ok::<(), StoreError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `StoreError::SegmentMismatch` if the segment registered for the
    /// value's type has an unexpected type.
    pub fn push_dyn(&mut self, value: Box<B>) -> Result<&mut B, StoreError>
    where
        B: Concrete,
    {
        let key = Concrete::concrete_type(&*value);
        self.insert_handle(key, value)
    }

    fn insert_handle(&mut self, key: TypeKey, value: Box<B>) -> Result<&mut B, StoreError> {
        let segment = self.registry.get_or_create::<BoxedSegment<B>>(key)?;
        let stored = segment.push(value);
        self.len += 1;
        Ok(stored)
    }

    /// Calls `f` on every stored value through the shared interface
    ///
    /// Values of one type are visited in insertion order; the order between
    /// types is unspecified.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&B),
    {
        self.registry
            .for_each_segment(|segment| segment.visit(&mut f));
    }

    /// Calls `f` on every stored value with write access
    pub fn for_each_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut B),
    {
        self.registry
            .for_each_segment_mut(|segment| segment.visit_mut(&mut f));
    }

    /// Calls `f` on stored values until it returns an error
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `f`.
    pub fn try_for_each<E, F>(&self, mut f: F) -> Result<(), E>
    where
        F: FnMut(&B) -> Result<(), E>,
    {
        let mut failure = None;
        let flow = self.registry.try_for_each_segment(|segment| {
            segment.visit_while(&mut |item| match f(item) {
                Ok(()) => ControlFlow::Continue(()),
                Err(err) => {
                    failure = Some(err);
                    ControlFlow::Break(())
                }
            })
        });
        match (flow, failure) {
            (ControlFlow::Break(()), Some(err)) => Err(err),
            _ => Ok(()),
        }
    }

    /// Number of stored values across all segments
    pub fn len(&self) -> usize {
        debug_assert_eq!(self.len, self.registry.total_length());
        self.len
    }

    /// Returns true if the store holds no values
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drops every stored value and every segment
    pub fn clear(&mut self) {
        if self.len > 0 {
            log::debug!(
                "clearing {} boxed values across {} segments",
                self.len,
                self.registry.segment_count()
            );
        }
        self.registry.clear();
        self.len = 0;
    }

    /// Moves the contents into a new store, leaving this one empty
    pub fn take(&mut self) -> Self {
        log::debug!("moving {} boxed values out of store", self.len);
        let config = *self.registry.config();
        std::mem::replace(self, Self::with_config(config))
    }

    /// The handles stored for `T`, in insertion order
    ///
    /// Returns an empty slice if no `T` has been stored.
    pub fn segment<T: 'static>(&self) -> &[Box<B>] {
        self.registry
            .get::<BoxedSegment<B>>(&TypeKey::of::<T>())
            .map(|segment| segment.as_slice())
            .unwrap_or(&[])
    }

    /// The values stored for `T` in insertion order, with write access
    ///
    /// Yields nothing if no `T` has been stored. Values can be modified in
    /// place, but their handles cannot be swapped for a value of another
    /// type:
    ///
    /// ```compile_fail
    /// use sovran_polystore::BoxedPolyStore;
    /// use std::fmt::Debug;
    ///
    /// let mut store = BoxedPolyStore::<dyn Debug>::new();
    /// store.push(Box::new(1u8)).unwrap();
    ///
    /// let handle: Box<dyn Debug> = Box::new("not a u8");
    /// *store.segment_mut::<u8>().next().unwrap() = *handle;
    /// ```
    pub fn segment_mut<T: 'static>(&mut self) -> impl Iterator<Item = &mut B> + '_ {
        self.registry
            .get_mut::<BoxedSegment<B>>(&TypeKey::of::<T>())
            .into_iter()
            .flat_map(|segment| segment.iter_mut())
    }

    /// Number of values stored for `T`
    pub fn segment_len<T: 'static>(&self) -> usize {
        self.segment::<T>().len()
    }

    /// Returns true if a segment exists for `T`
    pub fn contains_type<T: 'static>(&self) -> bool {
        self.registry.contains(&TypeKey::of::<T>())
    }

    /// Number of segments, one per distinct stored type
    pub fn segment_count(&self) -> usize {
        self.registry.segment_count()
    }

    /// The types that currently have a segment, in unspecified order
    pub fn types(&self) -> Vec<TypeKey> {
        self.registry.keys()
    }

    /// Reserves room for at least `additional` more values of type `T`
    ///
    /// # Errors
    ///
    /// Returns `StoreError::SegmentMismatch` if the segment registered for `T`
    /// has an unexpected type.
    pub fn reserve<T: 'static>(&mut self, additional: usize) -> Result<(), StoreError> {
        self.registry
            .get_or_create::<BoxedSegment<B>>(TypeKey::of::<T>())?
            .reserve(additional);
        Ok(())
    }
}

impl<B: ?Sized + 'static> Default for BoxedPolyStore<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: ?Sized + 'static> fmt::Debug for BoxedPolyStore<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxedPolyStore")
            .field("len", &self.len)
            .field("segments", &self.registry)
            .finish()
    }
}

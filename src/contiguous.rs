use std::fmt;
use std::ops::ControlFlow;

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::registry::SegmentRegistry;
use crate::segment::InlineSegment;
use crate::type_key::{Concrete, TypeKey, UpcastFrom};

/// A heterogeneous store that keeps values of each concrete type inline, in
/// one contiguous `Vec` per type
///
/// Values are visited through the shared interface `B` (usually `dyn Trait`).
/// Iteration walks one densely packed segment at a time, so values of the same
/// type sit next to each other in memory and need no per-value allocation.
///
/// The store is not `Clone`; rebuild a new store element by element if a copy
/// is needed.
///
/// # Examples
///
/// ```
/// use sovran_polystore::{impl_upcast, PolyStore, StoreError};
///
/// trait Shape {
///     fn area(&self) -> f64;
/// }
///
/// struct Square(f64);
/// struct Circle(f64);
///
/// impl Shape for Square {
///     fn area(&self) -> f64 { self.0 * self.0 }
/// }
///
/// impl Shape for Circle {
///     fn area(&self) -> f64 { 3.0 * self.0 * self.0 }
/// }
///
/// impl_upcast!(dyn Shape);
///
/// let mut store = PolyStore::<dyn Shape>::new();
/// store.push(Square(2.0))?;
/// store.push(Circle(1.0))?;
/// store.push(Square(1.0))?;
///
/// let mut total = 0.0;
/// store.for_each(|shape| total += shape.area());
///
/// assert_eq!(store.len(), 3);
/// assert_eq!(total, 8.0);
/// assert_eq!(store.segment::<Square>().len(), 2);
/// # Ok::<(), StoreError>(())
/// ```
pub struct PolyStore<B: ?Sized + 'static> {
    registry: SegmentRegistry<B>,
    len: usize,
}

impl<B: ?Sized + 'static> PolyStore<B> {
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

    /// Stores `value` in the segment for `T` and returns a reference to the
    /// stored value
    ///
    /// The reference is valid until the store is next mutated.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::SegmentMismatch` if the segment registered for `T`
    /// has an unexpected type. The store is unchanged in that case.
    pub fn push<T>(&mut self, value: T) -> Result<&mut T, StoreError>
    where
        B: UpcastFrom<T>,
        T: 'static,
    {
        let segment = self
            .registry
            .get_or_create::<InlineSegment<B, T>>(TypeKey::of::<T>())?;
        let stored = segment.push(value);
        self.len += 1;
        Ok(stored)
    }

    /// Moves a type-erased value into the segment for `T`
    ///
    /// The value's runtime concrete type must be exactly `T`. Anything else is
    /// rejected before the store is touched, since storing the value as a
    /// different type would slice it.
    ///
    /// # Examples
    ///
    /// ```
    /// use sovran_polystore::{impl_upcast, Concrete, PolyStore, StoreError};
    ///
    /// trait Animal: Concrete {
    ///     fn name(&self) -> &str;
    /// }
    ///
    /// struct Dog;
    /// struct Cat;
    ///
    /// impl Animal for Dog {
    ///     fn name(&self) -> &str { "dog" }
    /// }
    ///
    /// impl Animal for Cat {
    ///     fn name(&self) -> &str { "cat" }
    /// }
    ///
    /// impl_upcast!(dyn Animal);
    ///
    /// let mut store = PolyStore::<dyn Animal>::new();
    ///
    /// let dog: Box<dyn Animal> = Box::new(Dog);
    /// store.push_boxed::<Dog>(dog)?;
    ///
    /// let cat: Box<dyn Animal> = Box::new(Cat);
    /// match store.push_boxed::<Dog>(cat) {
    ///     Err(StoreError::DerivedTypeMismatch { expected, actual }) => {
    ///         assert!(expected.is::<Dog>());
    ///         assert!(actual.is::<Cat>());
    ///     }
    ///     _ => panic!("a cat must not be stored as a dog"),
    /// }
    ///
    /// assert_eq!(store.len(), 1);
    /// # Ok::<(), StoreError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// - Returns `StoreError::DerivedTypeMismatch` if the value is not a `T`
    /// - Returns `StoreError::SegmentMismatch` if the segment registered for
    ///   `T` has an unexpected type
    pub fn push_boxed<T>(&mut self, value: Box<B>) -> Result<&mut T, StoreError>
    where
        B: Concrete + UpcastFrom<T>,
        T: 'static,
    {
        let expected = TypeKey::of::<T>();
        let actual = Concrete::concrete_type(&*value);
        let mismatch = StoreError::DerivedTypeMismatch { expected, actual };
        if actual != expected {
            log::warn!("rejected insertion of {actual} as {expected}");
            return Err(mismatch);
        }

        let value = Concrete::into_any(value)
            .downcast::<T>()
            .map_err(|_| mismatch)?;
        self.push(*value)
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
                "clearing {} values across {} segments",
                self.len,
                self.registry.segment_count()
            );
        }
        self.registry.clear();
        self.len = 0;
    }

    /// Moves the contents into a new store, leaving this one empty
    pub fn take(&mut self) -> Self {
        log::debug!("moving {} values out of store", self.len);
        let config = *self.registry.config();
        std::mem::replace(self, Self::with_config(config))
    }

    /// The values stored for `T`, in insertion order
    ///
    /// Returns an empty slice if no `T` has been stored.
    pub fn segment<T>(&self) -> &[T]
    where
        B: UpcastFrom<T>,
        T: 'static,
    {
        self.registry
            .get::<InlineSegment<B, T>>(&TypeKey::of::<T>())
            .map(|segment| segment.as_slice())
            .unwrap_or(&[])
    }

    /// The values stored for `T`, with write access
    ///
    /// Returns an empty slice if no `T` has been stored.
    pub fn segment_mut<T>(&mut self) -> &mut [T]
    where
        B: UpcastFrom<T>,
        T: 'static,
    {
        match self
            .registry
            .get_mut::<InlineSegment<B, T>>(&TypeKey::of::<T>())
        {
            Some(segment) => segment.as_mut_slice(),
            None => &mut [],
        }
    }

    /// Number of values stored for `T`
    pub fn segment_len<T>(&self) -> usize
    where
        B: UpcastFrom<T>,
        T: 'static,
    {
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
    pub fn reserve<T>(&mut self, additional: usize) -> Result<(), StoreError>
    where
        B: UpcastFrom<T>,
        T: 'static,
    {
        self.registry
            .get_or_create::<InlineSegment<B, T>>(TypeKey::of::<T>())?
            .reserve(additional);
        Ok(())
    }
}

impl<B: ?Sized + 'static> Default for PolyStore<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: ?Sized + 'static> fmt::Debug for PolyStore<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolyStore")
            .field("len", &self.len)
            .field("segments", &self.registry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    trait Base: Concrete {
        fn get(&self) -> i32;
        fn set(&mut self, value: i32);
    }

    #[derive(Debug, Default, PartialEq)]
    struct D1(i32);
    #[derive(Debug, Default, PartialEq)]
    struct D2(i32);

    impl Base for D1 {
        fn get(&self) -> i32 {
            self.0
        }

        fn set(&mut self, value: i32) {
            self.0 = value;
        }
    }

    impl Base for D2 {
        fn get(&self) -> i32 {
            self.0
        }

        fn set(&mut self, value: i32) {
            self.0 = value;
        }
    }

    crate::impl_upcast!(dyn Base);

    #[test]
    fn test_push_returns_stored_value() -> Result<(), StoreError> {
        let mut store = PolyStore::<dyn Base>::new();

        let stored = store.push(D1(1))?;
        stored.0 = 5;

        assert_eq!(store.segment::<D1>(), &[D1(5)]);
        Ok(())
    }

    #[test]
    fn test_segments_keep_insertion_order() -> Result<(), StoreError> {
        let mut store = PolyStore::<dyn Base>::new();
        for n in 0..5 {
            store.push(D1(n))?;
            store.push(D2(-n))?;
        }

        assert_eq!(store.segment_len::<D1>(), 5);
        assert_eq!(store.segment_len::<D2>(), 5);
        let d1: Vec<i32> = store.segment::<D1>().iter().map(|d| d.0).collect();
        assert_eq!(d1, vec![0, 1, 2, 3, 4]);
        assert_eq!(store.segment_count(), 2);
        Ok(())
    }

    #[test]
    fn test_push_boxed_accepts_exact_type() -> Result<(), StoreError> {
        let mut store = PolyStore::<dyn Base>::new();
        let value: Box<dyn Base> = Box::new(D2(9));

        let stored = store.push_boxed::<D2>(value)?;
        assert_eq!(stored, &mut D2(9));
        assert_eq!(store.len(), 1);
        Ok(())
    }

    #[test]
    fn test_push_boxed_rejects_other_type_without_mutation() -> Result<(), StoreError> {
        let mut store = PolyStore::<dyn Base>::new();
        store.push(D1(1))?;

        let value: Box<dyn Base> = Box::new(D2(2));
        let err = store.push_boxed::<D1>(value).unwrap_err();

        assert_eq!(
            err,
            StoreError::DerivedTypeMismatch {
                expected: TypeKey::of::<D1>(),
                actual: TypeKey::of::<D2>(),
            }
        );
        assert!(err.to_string().contains("D2"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.segment_count(), 1);
        assert!(!store.contains_type::<D2>());
        Ok(())
    }

    #[test]
    fn test_for_each_mut_updates_all_segments() -> Result<(), StoreError> {
        let mut store = PolyStore::<dyn Base>::new();
        store.push(D1(1))?;
        store.push(D2(2))?;

        store.for_each_mut(|item| {
            let doubled = item.get() * 2;
            item.set(doubled);
        });

        let mut seen = Vec::new();
        store.for_each(|item| seen.push(item.get()));
        seen.sort();
        assert_eq!(seen, vec![2, 4]);
        Ok(())
    }

    #[test]
    fn test_segment_mut_allows_in_place_updates() -> Result<(), StoreError> {
        let mut store = PolyStore::<dyn Base>::new();
        store.push(D1(1))?;

        store.segment_mut::<D1>()[0].0 = 7;
        assert_eq!(store.segment::<D1>(), &[D1(7)]);
        assert!(store.segment_mut::<D2>().is_empty());
        Ok(())
    }

    #[test]
    fn test_try_for_each_returns_first_error() -> Result<(), StoreError> {
        let mut store = PolyStore::<dyn Base>::new();
        for n in 0..4 {
            store.push(D1(n))?;
        }

        let mut visited = 0;
        let result = store.try_for_each(|item| {
            visited += 1;
            if item.get() == 1 {
                Err(item.get())
            } else {
                Ok(())
            }
        });

        assert_eq!(result, Err(1));
        assert_eq!(visited, 2);
        assert_eq!(store.try_for_each(|_| Ok::<(), ()>(())), Ok(()));
        Ok(())
    }

    #[test]
    fn test_reserve_creates_empty_segment() -> Result<(), StoreError> {
        let mut store = PolyStore::<dyn Base>::new();
        store.reserve::<D1>(16)?;

        assert!(store.contains_type::<D1>());
        assert!(store.is_empty());
        assert_eq!(store.types(), vec![TypeKey::of::<D1>()]);
        Ok(())
    }

    #[test]
    fn test_take_leaves_empty_store() -> Result<(), StoreError> {
        let config = StoreConfig::default().with_segment_capacity(8);
        let mut source = PolyStore::<dyn Base>::with_config(config);
        source.push(D1(1))?;
        source.push(D2(2))?;

        let moved = source.take();

        assert_eq!(moved.len(), 2);
        assert_eq!(source.len(), 0);
        assert_eq!(source.segment_count(), 0);
        assert_eq!(source.config(), &config);
        Ok(())
    }

    #[test]
    fn test_clear_and_drop_release_values() -> Result<(), StoreError> {
        struct Tracked(Rc<Cell<usize>>);

        impl Drop for Tracked {
            fn drop(&mut self) {
                self.0.set(self.0.get() + 1);
            }
        }

        impl Base for Tracked {
            fn get(&self) -> i32 {
                0
            }

            fn set(&mut self, _: i32) {}
        }

        let drops = Rc::new(Cell::new(0));
        let mut store = PolyStore::<dyn Base>::new();
        for _ in 0..3 {
            store.push(Tracked(Rc::clone(&drops)))?;
        }

        store.clear();
        assert_eq!(drops.get(), 3);

        store.push(Tracked(Rc::clone(&drops)))?;
        drop(store);
        assert_eq!(drops.get(), 4);
        Ok(())
    }

    #[test]
    fn test_debug_output() -> Result<(), StoreError> {
        let mut store = PolyStore::<dyn Base>::new();
        store.push(D1(1))?;

        let output = format!("{:?}", store);
        assert!(output.starts_with("PolyStore { len: 1"));
        assert!(output.contains("D1"));
        Ok(())
    }
}

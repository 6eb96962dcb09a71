use crate::boxed::BoxedPolyStore;
use crate::contiguous::PolyStore;
use crate::error::StoreError;
use crate::type_key::UpcastFrom;

/// The contract shared by [`PolyStore`] and [`BoxedPolyStore`]
///
/// Code written against this trait works with either storage strategy, which
/// is chosen once by picking the store type.
///
/// # Examples
///
/// ```
/// use sovran_polystore::{impl_upcast, BoxedPolyStore, PolyCollection, PolyStore, StoreError};
///
/// trait Score {
///     fn points(&self) -> u32;
/// }
///
/// struct Goal;
/// struct Assist;
///
/// impl Score for Goal {
///     fn points(&self) -> u32 { 2 }
/// }
///
/// impl Score for Assist {
///     fn points(&self) -> u32 { 1 }
/// }
///
/// impl_upcast!(dyn Score);
///
/// fn tally<C: PolyCollection<dyn Score> + Default>() -> Result<u32, StoreError> {
///     let mut store = C::default();
///     store.insert(Goal)?;
///     store.insert(Assist)?;
///     store.insert(Goal)?;
///
///     let mut total = 0;
///     store.for_each(|score| total += score.points());
///     Ok(total)
/// }
///
/// assert_eq!(tally::<PolyStore<dyn Score>>()?, 5);
/// assert_eq!(tally::<BoxedPolyStore<dyn Score>>()?, 5);
/// # Ok::<(), StoreError>(())
/// ```
pub trait PolyCollection<B: ?Sized + 'static> {
    /// Stores `value`, returning it viewed through the shared interface
    ///
    /// # Errors
    ///
    /// Returns any error the underlying store's insertion reports.
    fn insert<T>(&mut self, value: T) -> Result<&mut B, StoreError>
    where
        B: UpcastFrom<T>,
        T: 'static;

    /// Calls `f` on every stored value
    fn for_each<F: FnMut(&B)>(&self, f: F);

    /// Calls `f` on every stored value with write access
    fn for_each_mut<F: FnMut(&mut B)>(&mut self, f: F);

    /// Number of stored values
    fn len(&self) -> usize;

    /// Returns true if nothing is stored
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every stored value
    fn clear(&mut self);

    /// Number of values stored for `T`
    fn segment_len<T>(&self) -> usize
    where
        B: UpcastFrom<T>,
        T: 'static;

    /// Moves the contents out, leaving the collection empty
    fn take(&mut self) -> Self
    where
        Self: Sized;
}

impl<B: ?Sized + 'static> PolyCollection<B> for PolyStore<B> {
    fn insert<T>(&mut self, value: T) -> Result<&mut B, StoreError>
    where
        B: UpcastFrom<T>,
        T: 'static,
    {
        let stored = self.push(value)?;
        Ok(B::upcast_mut(stored))
    }

    fn for_each<F: FnMut(&B)>(&self, f: F) {
        PolyStore::for_each(self, f);
    }

    fn for_each_mut<F: FnMut(&mut B)>(&mut self, f: F) {
        PolyStore::for_each_mut(self, f);
    }

    fn len(&self) -> usize {
        PolyStore::len(self)
    }

    fn clear(&mut self) {
        PolyStore::clear(self);
    }

    fn segment_len<T>(&self) -> usize
    where
        B: UpcastFrom<T>,
        T: 'static,
    {
        PolyStore::segment_len::<T>(self)
    }

    fn take(&mut self) -> Self {
        PolyStore::take(self)
    }
}

impl<B: ?Sized + 'static> PolyCollection<B> for BoxedPolyStore<B> {
    fn insert<T>(&mut self, value: T) -> Result<&mut B, StoreError>
    where
        B: UpcastFrom<T>,
        T: 'static,
    {
        self.push(Box::new(value))
    }

    fn for_each<F: FnMut(&B)>(&self, f: F) {
        BoxedPolyStore::for_each(self, f);
    }

    fn for_each_mut<F: FnMut(&mut B)>(&mut self, f: F) {
        BoxedPolyStore::for_each_mut(self, f);
    }

    fn len(&self) -> usize {
        BoxedPolyStore::len(self)
    }

    fn clear(&mut self) {
        BoxedPolyStore::clear(self);
    }

    fn segment_len<T>(&self) -> usize
    where
        B: UpcastFrom<T>,
        T: 'static,
    {
        BoxedPolyStore::segment_len::<T>(self)
    }

    fn take(&mut self) -> Self {
        BoxedPolyStore::take(self)
    }
}

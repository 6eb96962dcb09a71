use std::any::Any;
use std::marker::PhantomData;
use std::ops::ControlFlow;

use crate::type_key::{TypeKey, UpcastFrom};

/// Homogeneous storage for the values of one concrete type
///
/// The registry only ever sees segments through this trait, which lets
/// segments of different element types live in one map. Elements are handed
/// to visitors as the shared interface `B`, never as their concrete type.
pub trait Segment<B: ?Sized + 'static>: Any {
    /// Creates an empty segment for `element`, reserving `capacity` slots
    ///
    /// Segments whose element type is fixed by their own type parameter
    /// ignore `element`; the registry rejects them if the two disagree.
    fn with_capacity(element: TypeKey, capacity: usize) -> Self
    where
        Self: Sized;

    /// The concrete type of every element in this segment
    fn element_type(&self) -> TypeKey;

    /// Number of stored elements
    fn len(&self) -> usize;

    /// Returns true if the segment holds no elements
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Calls `f` on every element in insertion order
    fn visit(&self, f: &mut dyn FnMut(&B));

    /// Calls `f` on every element in insertion order, with write access
    fn visit_mut(&mut self, f: &mut dyn FnMut(&mut B));

    /// Calls `f` on elements in insertion order until it breaks
    fn visit_while(&self, f: &mut dyn FnMut(&B) -> ControlFlow<()>) -> ControlFlow<()>;

    /// Returns the segment as `&dyn Any` for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Returns the segment as `&mut dyn Any` for downcasting
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Segment storing its values inline in one contiguous `Vec<T>`
pub struct InlineSegment<B: ?Sized, T> {
    items: Vec<T>,
    _interface: PhantomData<fn(&B)>,
}

impl<B: ?Sized, T> InlineSegment<B, T> {
    /// Creates an empty segment
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            _interface: PhantomData,
        }
    }

    /// Appends a value, returning a reference to the stored copy
    pub fn push(&mut self, value: T) -> &mut T {
        let index = self.items.len();
        self.items.push(value);
        &mut self.items[index]
    }

    /// Reserves room for at least `additional` more values
    pub fn reserve(&mut self, additional: usize) {
        self.items.reserve(additional);
    }

    /// The stored values in insertion order
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// The stored values in insertion order, with write access
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.items
    }
}

impl<B: ?Sized, T> Default for InlineSegment<B, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B, T> Segment<B> for InlineSegment<B, T>
where
    B: ?Sized + UpcastFrom<T> + 'static,
    T: 'static,
{
    fn with_capacity(_element: TypeKey, capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            _interface: PhantomData,
        }
    }

    fn element_type(&self) -> TypeKey {
        TypeKey::of::<T>()
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn visit(&self, f: &mut dyn FnMut(&B)) {
        for item in &self.items {
            f(B::upcast(item));
        }
    }

    fn visit_mut(&mut self, f: &mut dyn FnMut(&mut B)) {
        for item in &mut self.items {
            f(B::upcast_mut(item));
        }
    }

    fn visit_while(&self, f: &mut dyn FnMut(&B) -> ControlFlow<()>) -> ControlFlow<()> {
        self.items.iter().try_for_each(|item| f(B::upcast(item)))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Segment storing one heap allocation per value, held as `Box<B>`
pub struct BoxedSegment<B: ?Sized> {
    element: TypeKey,
    items: Vec<Box<B>>,
}

impl<B: ?Sized> BoxedSegment<B> {
    /// Appends an owning handle, returning the stored value as `B`
    pub fn push(&mut self, value: Box<B>) -> &mut B {
        let index = self.items.len();
        self.items.push(value);
        &mut *self.items[index]
    }

    /// Reserves room for at least `additional` more handles
    pub fn reserve(&mut self, additional: usize) {
        self.items.reserve(additional);
    }

    /// The stored handles in insertion order
    pub fn as_slice(&self) -> &[Box<B>] {
        &self.items
    }

    /// The stored values in insertion order, with write access
    ///
    /// Only the values are reachable; the handles themselves cannot be
    /// replaced, so every element keeps the segment's concrete type.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut B> + '_ {
        self.items.iter_mut().map(|item| &mut **item)
    }
}

impl<B: ?Sized + 'static> Segment<B> for BoxedSegment<B> {
    fn with_capacity(element: TypeKey, capacity: usize) -> Self {
        Self {
            element,
            items: Vec::with_capacity(capacity),
        }
    }

    fn element_type(&self) -> TypeKey {
        self.element
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn visit(&self, f: &mut dyn FnMut(&B)) {
        for item in &self.items {
            f(&**item);
        }
    }

    fn visit_mut(&mut self, f: &mut dyn FnMut(&mut B)) {
        for item in &mut self.items {
            f(&mut **item);
        }
    }

    fn visit_while(&self, f: &mut dyn FnMut(&B) -> ControlFlow<()>) -> ControlFlow<()> {
        self.items.iter().try_for_each(|item| f(&**item))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Counter {
        fn count(&self) -> u32;
        fn bump(&mut self);
    }

    #[derive(Debug, PartialEq)]
    struct Tally(u32);

    impl Counter for Tally {
        fn count(&self) -> u32 {
            self.0
        }

        fn bump(&mut self) {
            self.0 += 1;
        }
    }

    crate::impl_upcast!(dyn Counter);

    fn collect<S: Segment<dyn Counter>>(segment: &S) -> Vec<u32> {
        let mut seen = Vec::new();
        segment.visit(&mut |item| seen.push(item.count()));
        seen
    }

    #[test]
    fn test_inline_push_and_visit_in_order() {
        let mut segment =
            <InlineSegment<dyn Counter, Tally> as Segment<dyn Counter>>::with_capacity(
                TypeKey::of::<Tally>(),
                4,
            );
        assert!(segment.is_empty());

        for n in [5, 1, 3] {
            segment.push(Tally(n));
        }

        assert_eq!(segment.len(), 3);
        assert_eq!(collect(&segment), vec![5, 1, 3]);
        assert_eq!(segment.as_slice(), &[Tally(5), Tally(1), Tally(3)]);
        assert_eq!(segment.element_type(), TypeKey::of::<Tally>());
    }

    #[test]
    fn test_inline_push_returns_stored_value() {
        let mut segment = InlineSegment::<dyn Counter, Tally>::new();
        let stored = segment.push(Tally(1));
        stored.bump();

        assert_eq!(segment.as_slice(), &[Tally(2)]);
    }

    #[test]
    fn test_inline_visit_mut_updates_elements() {
        let mut segment = InlineSegment::<dyn Counter, Tally>::default();
        segment.push(Tally(0));
        segment.push(Tally(10));

        segment.visit_mut(&mut |item| item.bump());

        assert_eq!(collect(&segment), vec![1, 11]);
    }

    #[test]
    fn test_visit_while_stops_on_break() {
        let mut segment = InlineSegment::<dyn Counter, Tally>::new();
        for n in 0..10 {
            segment.push(Tally(n));
        }

        let mut seen = Vec::new();
        let flow = segment.visit_while(&mut |item| {
            seen.push(item.count());
            if item.count() == 3 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });

        assert_eq!(flow, ControlFlow::Break(()));
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_boxed_segment_matches_inline_contract() {
        let mut segment = <BoxedSegment<dyn Counter> as Segment<dyn Counter>>::with_capacity(
            TypeKey::of::<Tally>(),
            0,
        );

        segment.push(Box::new(Tally(7)));
        segment.push(Box::new(Tally(8))).bump();

        assert_eq!(segment.len(), 2);
        assert_eq!(segment.element_type(), TypeKey::of::<Tally>());
        assert_eq!(collect(&segment), vec![7, 9]);

        segment.visit_mut(&mut |item| item.bump());
        assert_eq!(collect(&segment), vec![8, 10]);
        assert_eq!(segment.as_slice().len(), 2);
    }

    #[test]
    fn test_boxed_iter_mut_reaches_values_only() {
        let mut segment = <BoxedSegment<dyn Counter> as Segment<dyn Counter>>::with_capacity(
            TypeKey::of::<Tally>(),
            0,
        );
        segment.push(Box::new(Tally(1)));
        segment.push(Box::new(Tally(2)));

        for item in segment.iter_mut() {
            item.bump();
        }

        assert_eq!(collect(&segment), vec![2, 3]);
        assert_eq!(segment.iter_mut().count(), 2);
    }

    #[test]
    fn test_segments_downcast_through_any() {
        let segment: Box<dyn Segment<dyn Counter>> =
            Box::new(InlineSegment::<dyn Counter, Tally>::new());

        assert!(segment
            .as_any()
            .downcast_ref::<InlineSegment<dyn Counter, Tally>>()
            .is_some());
        assert!(segment
            .as_any()
            .downcast_ref::<BoxedSegment<dyn Counter>>()
            .is_none());
    }
}

//! Behaviour shared by both store variants, checked once per variant.

#[cfg(test)]
mod tests {
    use crate::{BoxedPolyStore, Concrete, PolyCollection, PolyStore, StoreError};

    // Interface every fixture is stored behind
    trait Base: Concrete {
        fn get(&self) -> i32;
        fn add(&mut self, amount: i32);
    }

    // Each fixture reports its own base value plus whatever was added to it
    #[derive(Debug, Default)]
    struct D1(i32);
    #[derive(Debug, Default)]
    struct D2(i32);
    #[derive(Debug, Default)]
    struct D3(i32);

    impl Base for D1 {
        fn get(&self) -> i32 {
            1 + self.0
        }

        fn add(&mut self, amount: i32) {
            self.0 += amount;
        }
    }

    impl Base for D2 {
        fn get(&self) -> i32 {
            2 + self.0
        }

        fn add(&mut self, amount: i32) {
            self.0 += amount;
        }
    }

    impl Base for D3 {
        fn get(&self) -> i32 {
            3 + self.0
        }

        fn add(&mut self, amount: i32) {
            self.0 += amount;
        }
    }

    crate::impl_upcast!(dyn Base);

    type Contiguous = PolyStore<dyn Base>;
    type Boxed = BoxedPolyStore<dyn Base>;

    fn collect<C: PolyCollection<dyn Base>>(store: &C) -> Vec<i32> {
        let mut seen = Vec::new();
        store.for_each(|item| seen.push(item.get()));
        seen.sort();
        seen
    }

    fn check_new_is_empty<C: PolyCollection<dyn Base> + Default>() {
        let store = C::default();
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
        assert!(collect(&store).is_empty());
    }

    fn check_len<C: PolyCollection<dyn Base> + Default>() -> Result<(), StoreError> {
        let mut store = C::default();
        store.insert(D1::default())?;
        assert_eq!(store.len(), 1);
        store.insert(D1::default())?;
        store.insert(D2::default())?;
        assert_eq!(store.len(), 3);
        Ok(())
    }

    fn check_for_each<C: PolyCollection<dyn Base> + Default>() -> Result<(), StoreError> {
        let mut store = C::default();
        store.insert(D1::default())?;
        store.insert(D2::default())?;
        store.insert(D3::default())?;

        assert_eq!(collect(&store), vec![1, 2, 3]);
        Ok(())
    }

    fn check_for_each_mut<C: PolyCollection<dyn Base> + Default>() -> Result<(), StoreError> {
        let mut store = C::default();
        store.insert(D1::default())?;
        store.insert(D3::default())?;

        store.for_each_mut(|item| item.add(10));

        assert_eq!(collect(&store), vec![11, 13]);
        Ok(())
    }

    fn check_insert_returns_stored_value<C: PolyCollection<dyn Base> + Default>(
    ) -> Result<(), StoreError> {
        let mut store = C::default();
        store.insert(D2::default())?.add(5);

        assert_eq!(collect(&store), vec![7]);
        Ok(())
    }

    fn check_segment_isolation<C: PolyCollection<dyn Base> + Default>() -> Result<(), StoreError> {
        let mut store = C::default();
        for _ in 0..4 {
            store.insert(D1::default())?;
        }
        for _ in 0..7 {
            store.insert(D2::default())?;
        }

        assert_eq!(store.segment_len::<D1>(), 4);
        assert_eq!(store.segment_len::<D2>(), 7);
        assert_eq!(store.segment_len::<D3>(), 0);
        Ok(())
    }

    fn check_clear<C: PolyCollection<dyn Base> + Default>() -> Result<(), StoreError> {
        let mut store = C::default();
        store.clear();
        assert_eq!(store.len(), 0);

        store.insert(D1::default())?;
        store.insert(D2::default())?;
        store.clear();
        assert_eq!(store.len(), 0);
        assert!(collect(&store).is_empty());

        store.clear();
        assert_eq!(store.len(), 0);

        store.insert(D3::default())?;
        assert_eq!(collect(&store), vec![3]);
        Ok(())
    }

    fn check_move<C: PolyCollection<dyn Base> + Default>() -> Result<(), StoreError> {
        let mut source = C::default();
        source.insert(D1::default())?;
        source.insert(D2::default())?;

        let moved = source;
        assert_eq!(moved.len(), 2);

        let mut source = moved;
        let target = source.take();
        assert_eq!(target.len(), 2);
        assert_eq!(source.len(), 0);
        assert!(collect(&source).is_empty());
        assert_eq!(collect(&target), vec![1, 2]);
        Ok(())
    }

    #[test]
    fn test_contiguous_new_is_empty() {
        check_new_is_empty::<Contiguous>();
    }

    #[test]
    fn test_boxed_new_is_empty() {
        check_new_is_empty::<Boxed>();
    }

    #[test]
    fn test_contiguous_len() -> Result<(), StoreError> {
        check_len::<Contiguous>()
    }

    #[test]
    fn test_boxed_len() -> Result<(), StoreError> {
        check_len::<Boxed>()
    }

    #[test]
    fn test_contiguous_for_each() -> Result<(), StoreError> {
        check_for_each::<Contiguous>()
    }

    #[test]
    fn test_boxed_for_each() -> Result<(), StoreError> {
        check_for_each::<Boxed>()
    }

    #[test]
    fn test_contiguous_for_each_mut() -> Result<(), StoreError> {
        check_for_each_mut::<Contiguous>()
    }

    #[test]
    fn test_boxed_for_each_mut() -> Result<(), StoreError> {
        check_for_each_mut::<Boxed>()
    }

    #[test]
    fn test_contiguous_insert_returns_stored_value() -> Result<(), StoreError> {
        check_insert_returns_stored_value::<Contiguous>()
    }

    #[test]
    fn test_boxed_insert_returns_stored_value() -> Result<(), StoreError> {
        check_insert_returns_stored_value::<Boxed>()
    }

    #[test]
    fn test_contiguous_segment_isolation() -> Result<(), StoreError> {
        check_segment_isolation::<Contiguous>()
    }

    #[test]
    fn test_boxed_segment_isolation() -> Result<(), StoreError> {
        check_segment_isolation::<Boxed>()
    }

    #[test]
    fn test_contiguous_clear() -> Result<(), StoreError> {
        check_clear::<Contiguous>()
    }

    #[test]
    fn test_boxed_clear() -> Result<(), StoreError> {
        check_clear::<Boxed>()
    }

    #[test]
    fn test_contiguous_move() -> Result<(), StoreError> {
        check_move::<Contiguous>()
    }

    #[test]
    fn test_boxed_move() -> Result<(), StoreError> {
        check_move::<Boxed>()
    }
}

//! # sovran-polystore
//!
//! A heterogeneous container that groups values by concrete type.
//!
//! `sovran-polystore` stores values of many different types behind one shared
//! trait and lets you visit all of them through that trait, just like a
//! `Vec<Box<dyn Trait>>`. Instead of one boxed handle per value, values of the
//! same concrete type are kept together in their own segment, so iteration
//! walks memory in long runs of identical types.
//!
//! ## Key Features
//!
//! - **Contiguous storage**: [`PolyStore`] keeps each type's values inline in a `Vec<T>`
//! - **Indirect storage**: [`BoxedPolyStore`] keeps `Box<dyn Trait>` handles, grouped by type
//! - **Type-safe**: a value can only be stored if it implements the shared trait
//! - **Slicing guard**: type-erased values are checked against the type they are stored as
//! - **Typed access**: each type's segment can be read back as a plain slice
//!
//! ## Usage Examples
//!
//! ### Basic Usage
//!
//! ```rust
//! use sovran_polystore::{impl_upcast, PolyStore, StoreError};
//!
//! trait Shape {
//!     fn name(&self) -> &'static str;
//!     fn area(&self) -> f64;
//! }
//!
//! struct Rect { w: f64, h: f64 }
//! struct Circle { r: f64 }
//!
//! impl Shape for Rect {
//!     fn name(&self) -> &'static str { "rect" }
//!     fn area(&self) -> f64 { self.w * self.h }
//! }
//!
//! impl Shape for Circle {
//!     fn name(&self) -> &'static str { "circle" }
//!     fn area(&self) -> f64 { std::f64::consts::PI * self.r * self.r }
//! }
//!
//! // Let every `Shape` implementor be viewed as `dyn Shape`
//! impl_upcast!(dyn Shape);
//!
//! fn main() -> Result<(), StoreError> {
//!     let mut shapes = PolyStore::<dyn Shape>::new();
//!
//!     shapes.push(Rect { w: 2.0, h: 3.0 })?;
//!     shapes.push(Circle { r: 1.0 })?;
//!     shapes.push(Rect { w: 1.0, h: 1.0 })?;
//!
//!     // Visit everything through the shared trait
//!     shapes.for_each(|shape| println!("{} has area {:.2}", shape.name(), shape.area()));
//!
//!     // Or read one type's values back directly
//!     let rects = shapes.segment::<Rect>();
//!     assert_eq!(rects.len(), 2);
//!     assert_eq!(rects[0].w, 2.0);
//!
//!     assert_eq!(shapes.len(), 3);
//!     Ok(())
//! }
//! ```
//!
//! ### Modifying Values In-Place
//!
//! ```rust
//! use sovran_polystore::{impl_upcast, PolyStore, StoreError};
//!
//! trait Counter {
//!     fn value(&self) -> u32;
//!     fn increment(&mut self);
//! }
//!
//! struct Hits(u32);
//! struct Misses(u32);
//!
//! impl Counter for Hits {
//!     fn value(&self) -> u32 { self.0 }
//!     fn increment(&mut self) { self.0 += 1 }
//! }
//!
//! impl Counter for Misses {
//!     fn value(&self) -> u32 { self.0 }
//!     fn increment(&mut self) { self.0 += 1 }
//! }
//!
//! impl_upcast!(dyn Counter);
//!
//! fn main() -> Result<(), StoreError> {
//!     let mut counters = PolyStore::<dyn Counter>::new();
//!     counters.push(Hits(0))?;
//!     counters.push(Misses(5))?;
//!
//!     counters.for_each_mut(|counter| counter.increment());
//!
//!     let mut total = 0;
//!     counters.for_each(|counter| total += counter.value());
//!     assert_eq!(total, 7);
//!
//!     // The reference returned by push can be used until the next mutation
//!     let hits = counters.push(Hits(10))?;
//!     hits.increment();
//!     assert_eq!(counters.segment::<Hits>()[1].0, 11);
//!     Ok(())
//! }
//! ```
//!
//! ### Storing Type-Erased Values
//!
//! ```rust
//! use sovran_polystore::{impl_upcast, BoxedPolyStore, Concrete, PolyStore, StoreError};
//!
//! // `Concrete` lets the store see the runtime type behind `dyn Event`
//! trait Event: Concrete {
//!     fn describe(&self) -> String;
//! }
//!
//! struct Click { x: i32, y: i32 }
//! struct Key { code: u32 }
//!
//! impl Event for Click {
//!     fn describe(&self) -> String { format!("click at {},{}", self.x, self.y) }
//! }
//!
//! impl Event for Key {
//!     fn describe(&self) -> String { format!("key {}", self.code) }
//! }
//!
//! impl_upcast!(dyn Event);
//!
//! fn main() -> Result<(), StoreError> {
//!     let incoming: Vec<Box<dyn Event>> = vec![
//!         Box::new(Click { x: 1, y: 2 }),
//!         Box::new(Key { code: 13 }),
//!     ];
//!
//!     // The boxed store routes each handle by its runtime type
//!     let mut boxed = BoxedPolyStore::<dyn Event>::new();
//!     for event in incoming {
//!         boxed.push_dyn(event)?;
//!     }
//!     assert_eq!(boxed.segment_len::<Key>(), 1);
//!
//!     // The contiguous store needs the concrete type and checks it
//!     let mut inline = PolyStore::<dyn Event>::new();
//!     let click: Box<dyn Event> = Box::new(Click { x: 0, y: 0 });
//!     match inline.push_boxed::<Key>(click) {
//!         Err(StoreError::DerivedTypeMismatch { expected, actual }) => {
//!             println!("refused to store {} as {}", actual, expected);
//!         }
//!         _ => unreachable!(),
//!     }
//!     assert!(inline.is_empty());
//!     Ok(())
//! }
//! ```
//!
//! ### Error Handling
//!
//! ```rust
//! use sovran_polystore::{PolyStore, StoreError};
//! use std::fmt::Debug;
//!
//! // `dyn Debug` works out of the box
//! let mut store = PolyStore::<dyn Debug>::new();
//!
//! match store.push(42u32) {
//!     Ok(value) => println!("stored {}", value),
//!     Err(StoreError::DerivedTypeMismatch { expected, actual }) => {
//!         println!("{} is not a {}", actual, expected)
//!     }
//!     Err(StoreError::SegmentMismatch { key, .. }) => println!("corrupt segment for {}", key),
//! }
//!
//! // Stop visiting at the first failure
//! let result = store.try_for_each(|value| {
//!     if format!("{:?}", value) == "42" {
//!         Err("found the answer")
//!     } else {
//!         Ok(())
//!     }
//! });
//! assert_eq!(result, Err("found the answer"));
//! ```

mod boxed;
mod collection;
mod config;
mod contiguous;
mod error;
mod registry;
mod segment;
mod type_key;
mod variant_tests;

pub use boxed::BoxedPolyStore;
pub use collection::PolyCollection;
pub use config::StoreConfig;
pub use contiguous::PolyStore;
pub use error::StoreError;
pub use registry::SegmentRegistry;
pub use segment::{BoxedSegment, InlineSegment, Segment};
pub use type_key::{Concrete, TypeKey, UpcastFrom};

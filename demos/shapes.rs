use sovran_polystore::{
    impl_upcast, BoxedPolyStore, PolyCollection, PolyStore, StoreConfig, StoreError,
};
use std::f64::consts::PI;

trait Shape {
    fn area(&self) -> f64;
    fn scale(&mut self, factor: f64);
}

struct Circle {
    radius: f64,
}

struct Rect {
    width: f64,
    height: f64,
}

struct Triangle {
    base: f64,
    height: f64,
}

impl Shape for Circle {
    fn area(&self) -> f64 {
        PI * self.radius * self.radius
    }

    fn scale(&mut self, factor: f64) {
        self.radius *= factor;
    }
}

impl Shape for Rect {
    fn area(&self) -> f64 {
        self.width * self.height
    }

    fn scale(&mut self, factor: f64) {
        self.width *= factor;
        self.height *= factor;
    }
}

impl Shape for Triangle {
    fn area(&self) -> f64 {
        0.5 * self.base * self.height
    }

    fn scale(&mut self, factor: f64) {
        self.base *= factor;
        self.height *= factor;
    }
}

impl_upcast!(dyn Shape);

/// Fills either store variant with the same drawing
fn draw<C: PolyCollection<dyn Shape>>(canvas: &mut C) -> Result<(), StoreError> {
    for i in 1..=100 {
        let size = i as f64 / 10.0;
        match i % 3 {
            0 => canvas.insert(Circle { radius: size })?,
            1 => canvas.insert(Rect {
                width: size,
                height: 2.0,
            })?,
            _ => canvas.insert(Triangle {
                base: size,
                height: 1.0,
            })?,
        };
    }
    Ok(())
}

fn total_area<C: PolyCollection<dyn Shape>>(canvas: &C) -> f64 {
    let mut total = 0.0;
    canvas.for_each(|shape| total += shape.area());
    total
}

fn main() -> Result<(), StoreError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("trace")).init();

    let config = StoreConfig::default().with_segment_capacity(64);
    let mut contiguous = PolyStore::<dyn Shape>::with_config(config);
    let mut boxed = BoxedPolyStore::<dyn Shape>::with_config(config);

    draw(&mut contiguous)?;
    draw(&mut boxed)?;

    println!("{:?}", contiguous);
    println!(
        "contiguous: {} shapes, area {:.3}",
        contiguous.len(),
        total_area(&contiguous)
    );
    println!(
        "boxed:      {} shapes, area {:.3}",
        boxed.len(),
        total_area(&boxed)
    );

    // Scaling by 2 quadruples every area
    contiguous.for_each_mut(|shape| shape.scale(2.0));
    println!("scaled:     area {:.3}", total_area(&contiguous));

    // Typed access to one segment
    let widest = contiguous
        .segment::<Rect>()
        .iter()
        .map(|rect| rect.width)
        .fold(0.0, f64::max);
    println!("widest rect: {:.1}", widest);

    let moved = contiguous.take();
    println!(
        "after take: source {} shapes, target {} shapes",
        contiguous.len(),
        moved.len()
    );

    Ok(())
}

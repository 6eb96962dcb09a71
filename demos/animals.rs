use sovran_polystore::{impl_upcast, BoxedPolyStore, Concrete, PolyStore, StoreError};

// Example trait: Animal
trait Animal: Concrete {
    fn name(&self) -> &str;
    fn make_sound(&self) -> &str;
}

#[derive(Clone)]
struct Dog {
    name: String,
}

impl Animal for Dog {
    fn name(&self) -> &str {
        &self.name
    }

    fn make_sound(&self) -> &str {
        "Woof!"
    }
}

#[derive(Clone)]
struct Cat {
    name: String,
    lives: u8,
}

impl Animal for Cat {
    fn name(&self) -> &str {
        &self.name
    }

    fn make_sound(&self) -> &str {
        "Meow!"
    }
}

impl_upcast!(dyn Animal);

fn main() -> Result<(), StoreError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    // Create a store
    let mut shelter = PolyStore::<dyn Animal>::new();

    // Store different animal types
    shelter.push(Dog {
        name: "Rover".to_string(),
    })?;
    shelter.push(Cat {
        name: "Whiskers".to_string(),
        lives: 9,
    })?;
    shelter.push(Dog {
        name: "Fido".to_string(),
    })?;

    // Every animal, through the shared trait
    shelter.for_each(|animal| println!("{} says: {}", animal.name(), animal.make_sound()));

    // Only the cats, with their concrete fields
    for cat in shelter.segment::<Cat>() {
        println!("{} has {} lives left", cat.name, cat.lives);
    }
    println!("Types in store: {:?}", shelter.types());

    // Animals arriving as trait objects
    let arrivals: Vec<Box<dyn Animal>> = vec![
        Box::new(Cat {
            name: "Tom".to_string(),
            lives: 7,
        }),
        Box::new(Dog {
            name: "Rex".to_string(),
        }),
    ];

    let mut kennel = BoxedPolyStore::<dyn Animal>::new();
    for animal in arrivals {
        // Each one is filed under its runtime type
        kennel.push_dyn(animal)?;
    }
    println!(
        "Kennel holds {} dogs and {} cats",
        kennel.segment_len::<Dog>(),
        kennel.segment_len::<Cat>()
    );

    // Moving a trait object into the contiguous store requires naming its type
    let stray: Box<dyn Animal> = Box::new(Cat {
        name: "Shadow".to_string(),
        lives: 3,
    });
    match shelter.push_boxed::<Dog>(stray) {
        Ok(dog) => println!("This shouldn't happen: {} stored as a dog", dog.name),
        Err(StoreError::DerivedTypeMismatch { expected, actual }) => {
            println!("Correctly refused to store a {} as a {}", actual, expected)
        }
        Err(e) => println!("Unexpected error: {}", e),
    }

    println!("Shelter holds {} animals", shelter.len());
    shelter.clear();
    kennel.clear();

    Ok(())
}

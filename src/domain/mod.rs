pub mod dog;
pub mod overrides;
pub mod text;

pub use dog::{dog_id, Compatibility, DogRecord, DogStatus, Energy, Shedding};
pub use overrides::UserOverrides;

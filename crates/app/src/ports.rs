//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod audio;
pub mod key_value;
pub mod platform;
pub mod publisher;
pub mod timer_store;

pub use audio::AudioPlayer;
pub use key_value::KeyValueStore;
pub use platform::{EntityStateReader, EntityStateWriter, ServiceCall, ServiceCaller};
pub use publisher::MessagePublisher;
pub use timer_store::TimerStore;

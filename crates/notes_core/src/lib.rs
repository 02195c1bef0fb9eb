pub mod domain;
pub mod ports;
pub mod slug;
pub mod store;

pub use domain::{Note, NoteChanges, User, UserCredentials};
pub use ports::{AccountRepository, NoteRepository, PortError, PortResult, Slugifier};
pub use slug::TranslitSlugifier;
pub use store::NoteStore;
